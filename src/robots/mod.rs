//! Robots.txt handling module
//!
//! This module fetches a site's robots.txt, extracts its disallow patterns and
//! decides whether a URL falls under any of them. It is fail-open: a missing,
//! slow or broken robots.txt means nothing is disallowed.

mod cache;
mod parser;

pub use cache::{CachedRobots, RobotsCache};
pub use parser::{is_disallowed, parse_disallow_patterns};

use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Outcome of checking one URL against its origin's robots.txt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RobotsVerdict {
    pub disallowed: bool,
    pub patterns: Arc<Vec<String>>,
}

/// Fetches the disallow patterns for an origin
///
/// Issues a single GET of `{origin}/robots.txt` bounded by `timeout`. Any
/// non-200 status, timeout or network error yields an empty list. There are
/// no retries.
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `origin` - Scheme and host, e.g. `https://shop.example.com`
/// * `timeout` - Upper bound for the whole request
pub async fn get_disallowed_patterns(client: &Client, origin: &str, timeout: Duration) -> Vec<String> {
    let robots_url = format!("{}/robots.txt", origin.trim_end_matches('/'));

    let response = match client.get(&robots_url).timeout(timeout).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!("robots.txt fetch failed for {}: {}", origin, e);
            return Vec::new();
        }
    };

    if response.status() != StatusCode::OK {
        tracing::debug!(
            "robots.txt for {} returned {}, treating as unrestricted",
            origin,
            response.status()
        );
        return Vec::new();
    }

    match response.text().await {
        Ok(body) => {
            let patterns = parse_disallow_patterns(&body);
            tracing::debug!("robots.txt for {}: {} disallow patterns", origin, patterns.len());
            patterns
        }
        Err(e) => {
            tracing::debug!("robots.txt body unreadable for {}: {}", origin, e);
            Vec::new()
        }
    }
}

/// Robots-policy evaluator bound to one scrape session
///
/// Holds the HTTP client and a per-origin cache, so each origin's robots.txt
/// is requested at most once for the lifetime of the value.
#[derive(Debug)]
pub struct RobotsPolicy {
    client: Client,
    timeout: Duration,
    cache: RobotsCache,
}

impl RobotsPolicy {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self {
            client,
            timeout,
            cache: RobotsCache::new(),
        }
    }

    /// Computes the verdict for `url`
    pub async fn verdict(&self, url: &Url) -> RobotsVerdict {
        let origin = url.origin().ascii_serialization();
        let cached = self
            .cache
            .get_or_fetch(&origin, || {
                get_disallowed_patterns(&self.client, &origin, self.timeout)
            })
            .await;

        RobotsVerdict {
            disallowed: is_disallowed(url.as_str(), &cached.patterns),
            patterns: cached.patterns,
        }
    }

    /// Number of distinct origins fetched by this session
    pub async fn origins_fetched(&self) -> usize {
        self.cache.len().await
    }
}
