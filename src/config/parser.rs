use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Environment variables folded into the loaded configuration
pub const ENV_ATTACH_ENDPOINT: &str = "JEWEL_SCOUT_ATTACH_ENDPOINT";
pub const ENV_PROXY_SERVER: &str = "JEWEL_SCOUT_PROXY_SERVER";
pub const ENV_PROXY_USERNAME: &str = "JEWEL_SCOUT_PROXY_USERNAME";
pub const ENV_PROXY_PASSWORD: &str = "JEWEL_SCOUT_PROXY_PASSWORD";

/// Loads and parses a configuration file from the given path
///
/// Proxy endpoints and credentials may be supplied through the environment
/// instead of the file; see [`apply_overrides`]. The environment is read once,
/// here, and never again.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use jewel_scout::config::load_config;
///
/// let config = load_config(Path::new("scout.toml")).unwrap();
/// println!("Max attempts: {}", config.navigation.max_attempts);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut config: Config = toml::from_str(&content)?;

    apply_overrides(&mut config, |key| std::env::var(key).ok());

    validate(&config)?;

    Ok(config)
}

/// Replaces proxy settings with values returned by `lookup`
///
/// Empty values are ignored so an exported-but-blank variable does not wipe
/// a value from the file.
pub fn apply_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(endpoint) = get(ENV_ATTACH_ENDPOINT) {
        config.proxy.attach.endpoint = endpoint;
    }
    if let Some(server) = get(ENV_PROXY_SERVER) {
        config.proxy.launch.server = server;
    }
    if let Some(username) = get(ENV_PROXY_USERNAME) {
        config.proxy.launch.username = username;
    }
    if let Some(password) = get(ENV_PROXY_PASSWORD) {
        config.proxy.launch.password = password;
    }
}

/// Computes a SHA-256 hash of the configuration file content
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}
