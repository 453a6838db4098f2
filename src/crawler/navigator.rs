//! Resilient navigation
//!
//! One page load is: navigate with a long absolute timeout, then wait for the
//! caller's ready marker. Navigation completing is not proof that listings
//! rendered, so both steps must pass. Transient failures are retried after a
//! random pause; a broken session is not retried.

use crate::browser::{PageHandle, WaitUntil};
use crate::config::NavigationConfig;
use crate::NavigationError;
use rand::Rng;
use std::time::Duration;

/// Random pause drawn uniformly from `[min, max]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Jitter {
    min: Duration,
    max: Duration,
}

impl Jitter {
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn sample(&self) -> Duration {
        let min = self.min.as_millis() as u64;
        let max = self.max.as_millis() as u64;
        if min == max {
            return self.min;
        }
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }
}

/// Retry budget and timeouts for page loads
#[derive(Debug, Clone)]
pub struct NavigationPolicy {
    pub max_attempts: u32,
    pub navigation_timeout: Duration,
    pub marker_timeout: Duration,
    pub jitter: Jitter,
    /// Replaces the proxy-dependent default completion criterion
    pub wait_override: Option<WaitUntil>,
}

impl Default for NavigationPolicy {
    fn default() -> Self {
        Self::from(&NavigationConfig::default())
    }
}

impl From<&NavigationConfig> for NavigationPolicy {
    fn from(config: &NavigationConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            navigation_timeout: Duration::from_secs(config.navigation_timeout_secs),
            marker_timeout: Duration::from_secs(config.marker_timeout_secs),
            jitter: Jitter::new(
                Duration::from_millis(config.jitter_min_ms),
                Duration::from_millis(config.jitter_max_ms),
            ),
            wait_override: config.wait_until,
        }
    }
}

impl NavigationPolicy {
    /// Completion criterion for one page load
    ///
    /// Precedence: the caller's per-target choice, then the configured
    /// override, then the proxy default. Attached remote browsers only wait
    /// for DOM content; launched browsers wait for the network to settle.
    pub fn wait_condition(&self, is_attach_proxy: bool, requested: Option<WaitUntil>) -> WaitUntil {
        requested.or(self.wait_override).unwrap_or(if is_attach_proxy {
            WaitUntil::DomContentLoaded
        } else {
            WaitUntil::NetworkIdle
        })
    }
}

/// Loads `url` and waits for `ready_selector`, retrying transient failures
///
/// # Arguments
///
/// * `page` - The page to drive
/// * `url` - The page to load
/// * `ready_selector` - Marker whose presence means listings are rendered
/// * `wait_until` - Completion criterion for the navigation itself
/// * `policy` - Attempt budget, timeouts and jitter
///
/// # Returns
///
/// * `Ok(())` - The marker is attached to the DOM
/// * `Err(NavigationError)` - The last failure once attempts are exhausted, or
///   the first non-transient failure
pub async fn goto_and_wait(
    page: &dyn PageHandle,
    url: &str,
    ready_selector: &str,
    wait_until: WaitUntil,
    policy: &NavigationPolicy,
) -> Result<(), NavigationError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match attempt_once(page, url, ready_selector, wait_until, policy).await {
            Ok(()) => {
                tracing::debug!("Loaded {} on attempt {}/{}", url, attempt, max_attempts);
                return Ok(());
            }
            Err(e) if e.is_transient() && attempt < max_attempts => {
                let delay = policy.jitter.sample();
                tracing::warn!(
                    "Attempt {}/{} for {} failed: {}; retrying in {}ms",
                    attempt,
                    max_attempts,
                    url,
                    e,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                tracing::warn!(
                    "Giving up on {} after attempt {}/{}: {}",
                    url,
                    attempt,
                    max_attempts,
                    e
                );
                return Err(e);
            }
        }
    }
}

async fn attempt_once(
    page: &dyn PageHandle,
    url: &str,
    ready_selector: &str,
    wait_until: WaitUntil,
    policy: &NavigationPolicy,
) -> Result<(), NavigationError> {
    tokio::time::timeout(policy.navigation_timeout, page.navigate(url, wait_until))
        .await
        .map_err(|_| NavigationError::Timeout {
            url: url.to_string(),
        })??;

    tokio::time::timeout(policy.marker_timeout, page.wait_for_selector(ready_selector))
        .await
        .map_err(|_| NavigationError::MarkerTimeout {
            selector: ready_selector.to_string(),
        })?
}
