//! Configuration module for Jewel-Scout
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Proxy endpoints and credentials live in the returned [`Config`] value and are
//! passed explicitly to the components that need them.
//!
//! # Example
//!
//! ```no_run
//! use jewel_scout::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("scout.toml")).unwrap();
//! println!("Navigation attempts: {}", config.navigation.max_attempts);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    AttachProxyConfig, Config, ImageConfig, LaunchProxyConfig, NavigationConfig, OutputConfig,
    ProxyConfig, RobotsConfig, SiteEntry, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{
    apply_overrides, compute_config_hash, load_config, load_config_with_hash,
    ENV_ATTACH_ENDPOINT, ENV_PROXY_PASSWORD, ENV_PROXY_SERVER, ENV_PROXY_USERNAME,
};
