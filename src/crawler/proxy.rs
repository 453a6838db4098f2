//! Proxy selection strategy
//!
//! Every page is tried through exactly two upstream proxies. The order depends
//! on the target's robots.txt: allowed URLs go to the attach proxy first,
//! disallowed URLs go to the credentialed launch proxy first. The first
//! candidate that loads the page and shows the ready marker wins.

use crate::browser::{BrowserConnector, BrowserSession, ChromiumConnector, PageHandle, WaitUntil};
use crate::config::{Config, ProxyConfig};
use crate::crawler::build_http_client;
use crate::crawler::navigator::{goto_and_wait, NavigationPolicy};
use crate::robots::{RobotsPolicy, RobotsVerdict};
use crate::{AcquireError, BrowserError, CandidateError, ScoutError};
use std::fmt;
use std::time::Duration;
use url::Url;

/// Which upstream a candidate uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProxyKind {
    Attach,
    Launch,
}

impl fmt::Display for ProxyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attach => write!(f, "attach"),
            Self::Launch => write!(f, "launch"),
        }
    }
}

/// One way of obtaining a browser
#[derive(Clone, PartialEq, Eq)]
pub enum ProxyCandidate {
    /// Connect to an externally managed browser; no credentials
    Attach { endpoint: String },
    /// Start a local browser routed through an authenticated proxy
    Launch {
        server: String,
        username: String,
        password: String,
    },
}

impl ProxyCandidate {
    pub fn kind(&self) -> ProxyKind {
        match self {
            Self::Attach { .. } => ProxyKind::Attach,
            Self::Launch { .. } => ProxyKind::Launch,
        }
    }
}

impl fmt::Debug for ProxyCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attach { endpoint } => f.debug_struct("Attach").field("endpoint", endpoint).finish(),
            Self::Launch {
                server, username, ..
            } => f
                .debug_struct("Launch")
                .field("server", server)
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

/// Orders the two candidates by robots verdict
///
/// Not disallowed: attach then launch. Disallowed: launch then attach.
pub fn order_candidates(disallowed: bool, proxies: &ProxyConfig) -> [ProxyCandidate; 2] {
    let attach = ProxyCandidate::Attach {
        endpoint: proxies.attach.endpoint.clone(),
    };
    let launch = ProxyCandidate::Launch {
        server: proxies.launch.server.clone(),
        username: proxies.launch.username.clone(),
        password: proxies.launch.password.clone(),
    };

    if disallowed {
        [launch, attach]
    } else {
        [attach, launch]
    }
}

/// A URL plus the marker proving its listings rendered
#[derive(Debug, Clone)]
pub struct CrawlTarget {
    pub url: String,
    pub ready_selector: String,
    /// Per-target completion criterion; `None` uses the policy default
    pub wait_until: Option<WaitUntil>,
}

impl CrawlTarget {
    pub fn new(url: impl Into<String>, ready_selector: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ready_selector: ready_selector.into(),
            wait_until: None,
        }
    }

    pub fn with_wait_until(mut self, wait_until: Option<WaitUntil>) -> Self {
        self.wait_until = wait_until;
        self
    }
}

/// A loaded page and the browser that owns it
///
/// Must be released with [`ScrapeSession::close`], including on error paths.
pub struct ScrapeSession {
    browser: Box<dyn BrowserSession>,
    page: Box<dyn PageHandle>,
    proxy: ProxyKind,
    url: String,
}

impl ScrapeSession {
    pub fn page(&self) -> &dyn PageHandle {
        self.page.as_ref()
    }

    /// The proxy that won
    pub fn proxy(&self) -> ProxyKind {
        self.proxy
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Closes the page, then the browser
    ///
    /// The browser is closed even if closing the page fails; the first error
    /// is returned.
    pub async fn close(self) -> Result<(), BrowserError> {
        let page_result = self.page.close().await;
        let browser_result = self.browser.close().await;
        page_result.and(browser_result)
    }
}

impl fmt::Debug for ScrapeSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrapeSession")
            .field("proxy", &self.proxy)
            .field("url", &self.url)
            .finish()
    }
}

/// Result of trying one candidate
#[derive(Debug)]
pub enum CandidateOutcome {
    Acquired(ScrapeSession),
    Failed(CandidateError),
}

/// Robots-aware two-proxy page acquisition
pub struct ProxyStrategy<C: BrowserConnector = ChromiumConnector> {
    connector: C,
    robots: RobotsPolicy,
    proxies: ProxyConfig,
    navigation: NavigationPolicy,
}

impl ProxyStrategy<ChromiumConnector> {
    /// Builds the production strategy from a loaded configuration
    pub fn from_config(config: &Config) -> Result<Self, ScoutError> {
        let client = build_http_client(&config.user_agent)?;
        let robots = RobotsPolicy::new(client, Duration::from_secs(config.robots.timeout_secs));
        let navigation = NavigationPolicy::from(&config.navigation);

        // Protocol requests must outlive the longest navigation
        let connector = ChromiumConnector::new(
            &config.proxy.launch,
            None,
            navigation.navigation_timeout + Duration::from_secs(10),
        );

        Ok(Self::new(connector, robots, config.proxy.clone(), navigation))
    }
}

impl<C: BrowserConnector> ProxyStrategy<C> {
    pub fn new(
        connector: C,
        robots: RobotsPolicy,
        proxies: ProxyConfig,
        navigation: NavigationPolicy,
    ) -> Self {
        Self {
            connector,
            robots,
            proxies,
            navigation,
        }
    }

    pub fn robots(&self) -> &RobotsPolicy {
        &self.robots
    }

    /// Loads `url` and waits for `ready_selector`
    ///
    /// See [`ProxyStrategy::acquire_target`].
    pub async fn acquire_page(
        &self,
        url: &str,
        ready_selector: &str,
    ) -> Result<ScrapeSession, AcquireError> {
        self.acquire_target(&CrawlTarget::new(url, ready_selector))
            .await
    }

    /// Loads a target through the ordered proxy pair
    ///
    /// # Algorithm
    ///
    /// 1. Compute the robots verdict for the URL's origin
    /// 2. Order the candidates by that verdict
    /// 3. Try each candidate; return the first session that reaches the marker
    /// 4. If both fail, return `ProxyExhausted` with the last failure
    pub async fn acquire_target(&self, target: &CrawlTarget) -> Result<ScrapeSession, AcquireError> {
        let parsed = Url::parse(&target.url).map_err(|source| AcquireError::InvalidTarget {
            url: target.url.clone(),
            source,
        })?;

        let verdict: RobotsVerdict = self.robots.verdict(&parsed).await;
        let candidates = order_candidates(verdict.disallowed, &self.proxies);
        tracing::info!(
            "Acquiring {} (robots disallowed: {}, order: {} then {})",
            target.url,
            verdict.disallowed,
            candidates[0].kind(),
            candidates[1].kind()
        );

        let mut last_error = None;
        for candidate in &candidates {
            match self.try_candidate(candidate, target).await {
                CandidateOutcome::Acquired(session) => {
                    tracing::info!("Acquired {} via {} proxy", target.url, session.proxy());
                    return Ok(session);
                }
                CandidateOutcome::Failed(e) => {
                    tracing::warn!("Candidate failed for {}: {}", target.url, e);
                    last_error = Some(e);
                }
            }
        }

        // Both candidates ran, so a failure was recorded
        let last = last_error.unwrap_or(CandidateError::Browser {
            proxy: candidates[1].kind(),
            source: BrowserError::Closed,
        });
        Err(AcquireError::ProxyExhausted {
            url: target.url.clone(),
            last,
        })
    }

    /// Opens a browser for one candidate and drives the navigation
    ///
    /// Anything opened here is closed again before a failure is returned.
    pub async fn try_candidate(
        &self,
        candidate: &ProxyCandidate,
        target: &CrawlTarget,
    ) -> CandidateOutcome {
        let proxy = candidate.kind();

        let mut browser = match self.connector.connect(candidate).await {
            Ok(browser) => browser,
            Err(source) => return CandidateOutcome::Failed(CandidateError::Browser { proxy, source }),
        };

        let page = match browser.new_page().await {
            Ok(page) => page,
            Err(source) => {
                release(None, browser).await;
                return CandidateOutcome::Failed(CandidateError::Browser { proxy, source });
            }
        };

        let wait_until = self
            .navigation
            .wait_condition(proxy == ProxyKind::Attach, target.wait_until);

        match goto_and_wait(
            page.as_ref(),
            &target.url,
            &target.ready_selector,
            wait_until,
            &self.navigation,
        )
        .await
        {
            Ok(()) => CandidateOutcome::Acquired(ScrapeSession {
                browser,
                page,
                proxy,
                url: target.url.clone(),
            }),
            Err(source) => {
                release(Some(page), browser).await;
                CandidateOutcome::Failed(CandidateError::Navigation { proxy, source })
            }
        }
    }
}

/// Best-effort release of a failed candidate's resources
async fn release(page: Option<Box<dyn PageHandle>>, browser: Box<dyn BrowserSession>) {
    if let Some(page) = page {
        if let Err(e) = page.close().await {
            tracing::debug!("Closing page of failed candidate: {}", e);
        }
    }
    if let Err(e) = browser.close().await {
        tracing::debug!("Closing browser of failed candidate: {}", e);
    }
}
