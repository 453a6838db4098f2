use crate::config::types::{
    Config, ImageConfig, NavigationConfig, ProxyConfig, SiteEntry, UserAgentConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_user_agent_config(&config.user_agent)?;
    validate_proxy_config(&config.proxy)?;
    validate_navigation_config(&config.navigation)?;
    validate_image_config(&config.images)?;

    if config.robots.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "robots timeout-secs must be > 0".to_string(),
        ));
    }

    if config.output.records_path.is_empty() {
        return Err(ConfigError::Validation(
            "records_path cannot be empty".to_string(),
        ));
    }

    for site in &config.sites {
        validate_site(site)?;
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    Ok(())
}

/// Validates proxy endpoints
///
/// Either proxy may be left blank; the strategy then fails that candidate fast.
/// At least one must be set or nothing could ever load.
fn validate_proxy_config(config: &ProxyConfig) -> Result<(), ConfigError> {
    let attach = config.attach.endpoint.trim();
    let launch = config.launch.server.trim();

    if attach.is_empty() && launch.is_empty() {
        return Err(ConfigError::Validation(
            "at least one of proxy.attach.endpoint or proxy.launch.server must be set".to_string(),
        ));
    }

    if !attach.is_empty() {
        let url = Url::parse(attach).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid attach endpoint '{}': {}", attach, e))
        })?;
        if !matches!(url.scheme(), "ws" | "wss" | "http" | "https") {
            return Err(ConfigError::Validation(format!(
                "attach endpoint '{}' must use ws, wss, http or https",
                attach
            )));
        }
    }

    if !launch.is_empty() {
        Url::parse(launch).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid launch proxy server '{}': {}", launch, e))
        })?;

        if config.launch.username.is_empty() != config.launch.password.is_empty() {
            return Err(ConfigError::Validation(
                "proxy.launch username and password must be set together".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates navigation retry settings
fn validate_navigation_config(config: &NavigationConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    if config.navigation_timeout_secs == 0 || config.marker_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "navigation and marker timeouts must be > 0".to_string(),
        ));
    }

    if config.jitter_min_ms >= config.jitter_max_ms {
        return Err(ConfigError::Validation(format!(
            "jitter_min_ms ({}) must be less than jitter_max_ms ({})",
            config.jitter_min_ms, config.jitter_max_ms
        )));
    }

    Ok(())
}

fn validate_image_config(config: &ImageConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "images directory cannot be empty".to_string(),
        ));
    }

    if config.retries < 1 {
        return Err(ConfigError::Validation(format!(
            "image retries must be >= 1, got {}",
            config.retries
        )));
    }

    if config.attempt_timeout_secs == 0 || config.join_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "image timeouts must be > 0".to_string(),
        ));
    }

    Ok(())
}

/// Validates one site entry
fn validate_site(site: &SiteEntry) -> Result<(), ConfigError> {
    if site.name.is_empty() {
        return Err(ConfigError::Validation(
            "site name cannot be empty".to_string(),
        ));
    }

    let url = Url::parse(&site.url).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid site URL '{}': {}", site.url, e))
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "Site URL '{}' must use http or https",
            site.url
        )));
    }

    for (label, selector) in [
        ("ready-selector", &site.ready_selector),
        ("item-selector", &site.item_selector),
        ("name-selector", &site.name_selector),
    ] {
        if selector.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "Site '{}' has an empty {}",
                site.name, label
            )));
        }
    }

    Ok(())
}
