use crate::browser::WaitUntil;
use serde::Deserialize;

/// Main configuration structure for Jewel-Scout
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub navigation: NavigationConfig,
    #[serde(default)]
    pub robots: RobotsConfig,
    #[serde(default)]
    pub images: ImageConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default, rename = "site")]
    pub sites: Vec<SiteEntry>,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,
}

impl UserAgentConfig {
    /// Formats the header value: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{})",
            self.crawler_name, self.crawler_version, self.contact_url
        )
    }
}

/// The two upstream proxies
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProxyConfig {
    #[serde(default)]
    pub attach: AttachProxyConfig,
    #[serde(default)]
    pub launch: LaunchProxyConfig,
}

/// Pre-running remote browser reached over its debugging endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttachProxyConfig {
    /// CDP websocket (or http discovery) endpoint
    #[serde(default)]
    pub endpoint: String,
}

/// Locally launched browser routed through a credentialed HTTP(S) proxy
#[derive(Debug, Clone, Deserialize)]
pub struct LaunchProxyConfig {
    #[serde(default)]
    pub server: String,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    #[serde(default = "default_true")]
    pub headless: bool,

    /// Browser binary; detected automatically when absent
    #[serde(default)]
    pub executable: Option<String>,
}

impl Default for LaunchProxyConfig {
    fn default() -> Self {
        Self {
            server: String::new(),
            username: String::new(),
            password: String::new(),
            headless: true,
            executable: None,
        }
    }
}

/// Resilient navigation tuning
#[derive(Debug, Clone, Deserialize)]
pub struct NavigationConfig {
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Absolute timeout of one page load
    #[serde(
        rename = "navigation-timeout-secs",
        default = "default_navigation_timeout"
    )]
    pub navigation_timeout_secs: u64,

    /// How long to wait for the ready marker after the page loaded
    #[serde(rename = "marker-timeout-secs", default = "default_marker_timeout")]
    pub marker_timeout_secs: u64,

    #[serde(rename = "jitter-min-ms", default = "default_jitter_min")]
    pub jitter_min_ms: u64,

    #[serde(rename = "jitter-max-ms", default = "default_jitter_max")]
    pub jitter_max_ms: u64,

    /// Overrides the completion criterion picked from the proxy kind
    #[serde(rename = "wait-until", default)]
    pub wait_until: Option<WaitUntil>,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            navigation_timeout_secs: default_navigation_timeout(),
            marker_timeout_secs: default_marker_timeout(),
            jitter_min_ms: default_jitter_min(),
            jitter_max_ms: default_jitter_max(),
            wait_until: None,
        }
    }
}

/// robots.txt fetch configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RobotsConfig {
    #[serde(rename = "timeout-secs", default = "default_robots_timeout")]
    pub timeout_secs: u64,
}

impl Default for RobotsConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_robots_timeout(),
        }
    }
}

/// Product image download configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ImageConfig {
    #[serde(default = "default_image_dir")]
    pub directory: String,

    #[serde(rename = "attempt-timeout-secs", default = "default_attempt_timeout")]
    pub attempt_timeout_secs: u64,

    #[serde(default = "default_retries")]
    pub retries: u32,

    #[serde(rename = "join-timeout-secs", default = "default_join_timeout")]
    pub join_timeout_secs: u64,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            directory: default_image_dir(),
            attempt_timeout_secs: default_attempt_timeout(),
            retries: default_retries(),
            join_timeout_secs: default_join_timeout(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// JSON lines file that receives one record per product
    #[serde(rename = "records-path", default = "default_records_path")]
    pub records_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            records_path: default_records_path(),
        }
    }
}

/// One storefront listing page with its selector map
#[derive(Debug, Clone, Deserialize)]
pub struct SiteEntry {
    pub name: String,

    pub url: String,

    /// Element whose presence proves the product grid rendered
    #[serde(rename = "ready-selector")]
    pub ready_selector: String,

    #[serde(rename = "item-selector")]
    pub item_selector: String,

    #[serde(rename = "name-selector")]
    pub name_selector: String,

    #[serde(rename = "price-selector", default)]
    pub price_selector: Option<String>,

    #[serde(rename = "image-selector", default)]
    pub image_selector: Option<String>,

    #[serde(rename = "link-selector", default)]
    pub link_selector: Option<String>,

    #[serde(rename = "wait-until", default)]
    pub wait_until: Option<WaitUntil>,
}

fn default_true() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    3
}

fn default_navigation_timeout() -> u64 {
    180
}

fn default_marker_timeout() -> u64 {
    30
}

fn default_jitter_min() -> u64 {
    1000
}

fn default_jitter_max() -> u64 {
    3000
}

fn default_robots_timeout() -> u64 {
    10
}

fn default_image_dir() -> String {
    "./images".to_string()
}

fn default_attempt_timeout() -> u64 {
    10
}

fn default_retries() -> u32 {
    3
}

fn default_join_timeout() -> u64 {
    60
}

fn default_records_path() -> String {
    "./records.jsonl".to_string()
}
