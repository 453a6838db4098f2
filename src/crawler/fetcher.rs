//! HTTP client construction
//!
//! Plain HTTP is only used for robots.txt and product images; pages are loaded
//! through a browser.

use crate::config::UserAgentConfig;
use reqwest::Client;
use std::time::Duration;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
///
/// # Example
///
/// ```no_run
/// use jewel_scout::config::UserAgentConfig;
/// use jewel_scout::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "JewelScout".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}
