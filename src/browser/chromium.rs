//! Chromium implementation of the browser capability traits
//!
//! Attach candidates connect to an already-running browser over the DevTools
//! protocol. Launch candidates start a local chromium routed through the
//! configured upstream proxy, with automation fingerprints masked.

use crate::browser::{BrowserConnector, BrowserSession, PageHandle, WaitUntil};
use crate::config::LaunchProxyConfig;
use crate::crawler::ProxyCandidate;
use crate::{BrowserError, NavigationError};
use async_trait::async_trait;
use chromiumoxide::auth::Credentials;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::{
    AddScriptToEvaluateOnNewDocumentParams, NavigateParams,
};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::{Handler, Page};
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Injected before any page script runs on launched browsers
pub const STEALTH_SCRIPT: &str = r#"
    Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
    Object.defineProperty(navigator, 'languages', { get: () => ['en-US', 'en'] });
    Object.defineProperty(navigator, 'plugins', { get: () => [1, 2, 3, 4, 5] });
    window.chrome = window.chrome || { runtime: {} };
"#;

const LAUNCH_ARGS: &[&str] = &[
    "--disable-blink-features=AutomationControlled",
    "--disable-infobars",
    "--disable-dev-shm-usage",
    "--no-sandbox",
    "--no-first-run",
    "--window-size=1920,1080",
];

const POLL_INTERVAL: Duration = Duration::from_millis(250);
const IDLE_QUIET_PERIOD: Duration = Duration::from_millis(500);

/// Opens chromium browsers for proxy candidates
#[derive(Debug, Clone)]
pub struct ChromiumConnector {
    headless: bool,
    executable: Option<String>,
    user_agent: Option<String>,
    request_timeout: Duration,
}

impl ChromiumConnector {
    /// Creates a connector
    ///
    /// # Arguments
    ///
    /// * `launch` - Launch settings (headless mode, browser binary)
    /// * `user_agent` - Overrides the browser's user agent on launched browsers
    /// * `request_timeout` - Protocol request timeout; should cover a full navigation
    pub fn new(
        launch: &LaunchProxyConfig,
        user_agent: Option<String>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            headless: launch.headless,
            executable: launch.executable.clone(),
            user_agent,
            request_timeout,
        }
    }

    async fn attach(&self, endpoint: &str) -> Result<ChromiumSession, BrowserError> {
        tracing::debug!("Attaching to remote browser at {}", endpoint);
        let (browser, handler) =
            Browser::connect(endpoint)
                .await
                .map_err(|e| BrowserError::Connect {
                    endpoint: endpoint.to_string(),
                    message: e.to_string(),
                })?;

        Ok(ChromiumSession::new(browser, handler, None, false))
    }

    async fn launch(
        &self,
        server: &str,
        username: &str,
        password: &str,
    ) -> Result<ChromiumSession, BrowserError> {
        let mut builder = BrowserConfig::builder()
            .args(LAUNCH_ARGS.iter().copied())
            .arg(format!("--proxy-server={}", server))
            .request_timeout(self.request_timeout);

        if let Some(user_agent) = &self.user_agent {
            builder = builder.arg(format!("--user-agent={}", user_agent));
        }
        if !self.headless {
            builder = builder.with_head();
        }
        if let Some(executable) = &self.executable {
            builder = builder.chrome_executable(executable);
        }

        let config = builder.build().map_err(BrowserError::Launch)?;

        tracing::debug!("Launching browser through proxy {}", server);
        let (browser, handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        let credentials = (!username.is_empty()).then(|| Credentials {
            username: username.to_string(),
            password: password.to_string(),
        });

        Ok(ChromiumSession::new(browser, handler, credentials, true))
    }
}

#[async_trait]
impl BrowserConnector for ChromiumConnector {
    async fn connect(
        &self,
        candidate: &ProxyCandidate,
    ) -> Result<Box<dyn BrowserSession>, BrowserError> {
        let session = match candidate {
            ProxyCandidate::Attach { endpoint } => {
                if endpoint.is_empty() {
                    return Err(BrowserError::Connect {
                        endpoint: String::new(),
                        message: "no attach endpoint configured".to_string(),
                    });
                }
                self.attach(endpoint).await?
            }
            ProxyCandidate::Launch {
                server,
                username,
                password,
            } => {
                if server.is_empty() {
                    return Err(BrowserError::Launch(
                        "no launch proxy server configured".to_string(),
                    ));
                }
                self.launch(server, username, password).await?
            }
        };

        Ok(Box::new(session))
    }
}

/// A connected chromium browser
struct ChromiumSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    credentials: Option<Credentials>,
    contexts: Vec<BrowserContextId>,
    launched: bool,
}

impl ChromiumSession {
    fn new(
        browser: Browser,
        mut handler: Handler,
        credentials: Option<Credentials>,
        launched: bool,
    ) -> Self {
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("Browser handler event error: {}", e);
                }
            }
        });

        Self {
            browser,
            handler_task,
            credentials,
            contexts: Vec::new(),
            launched,
        }
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn new_page(&mut self) -> Result<Box<dyn PageHandle>, BrowserError> {
        let context = self
            .browser
            .execute(CreateBrowserContextParams::default())
            .await
            .map_err(|e| BrowserError::Protocol(e.to_string()))?
            .result
            .browser_context_id;
        self.contexts.push(context.clone());

        let target = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(context)
            .build()
            .map_err(BrowserError::Protocol)?;

        let page = self
            .browser
            .new_page(target)
            .await
            .map_err(|e| BrowserError::Page(e.to_string()))?;

        if self.launched {
            page.execute(AddScriptToEvaluateOnNewDocumentParams::new(STEALTH_SCRIPT))
                .await
                .map_err(|e| BrowserError::Protocol(e.to_string()))?;
        }

        if let Some(credentials) = &self.credentials {
            page.authenticate(credentials.clone())
                .await
                .map_err(|e| BrowserError::Protocol(e.to_string()))?;
        }

        Ok(Box::new(ChromiumPage { page }))
    }

    async fn close(self: Box<Self>) -> Result<(), BrowserError> {
        let ChromiumSession {
            mut browser,
            handler_task,
            contexts,
            launched,
            ..
        } = *self;

        let result = if launched {
            let closed = browser
                .close()
                .await
                .map(|_| ())
                .map_err(|e| BrowserError::Protocol(e.to_string()));
            if let Err(e) = browser.wait().await {
                tracing::debug!("Waiting for browser process failed: {}", e);
            }
            closed
        } else {
            // The remote browser outlives us; only drop what we created in it
            let mut result = Ok(());
            for context in contexts {
                if let Err(e) = browser
                    .execute(DisposeBrowserContextParams::new(context))
                    .await
                {
                    result = Err(BrowserError::Protocol(e.to_string()));
                }
            }
            result
        };

        handler_task.abort();
        result
    }
}

/// A chromium tab
struct ChromiumPage {
    page: Page,
}

impl ChromiumPage {
    async fn evaluate<T: serde::de::DeserializeOwned>(&self, script: &str) -> Result<T, String> {
        self.page
            .evaluate(script)
            .await
            .map_err(|e| e.to_string())?
            .into_value::<T>()
            .map_err(|e| e.to_string())
    }

    /// Issues the navigation without waiting for `load`, then polls readyState
    async fn navigate_dom_content_loaded(&self, url: &str) -> Result<(), NavigationError> {
        let response = self
            .page
            .execute(NavigateParams::new(url))
            .await
            .map_err(|e| navigation_failed(url, e))?;

        if let Some(error_text) = &response.result.error_text {
            return Err(NavigationError::Navigation {
                url: url.to_string(),
                message: error_text.clone(),
            });
        }

        loop {
            let ready: bool = self
                .evaluate(
                    "document.readyState !== 'loading' && document.URL !== 'about:blank'",
                )
                .await
                .unwrap_or(false);
            if ready {
                return Ok(());
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Waits until the resource-timing count stops growing
    async fn wait_for_network_idle(&self) {
        let mut last: Option<u64> = None;
        loop {
            let count: u64 = self
                .evaluate("performance.getEntriesByType('resource').length")
                .await
                .unwrap_or(0);
            if last == Some(count) {
                return;
            }
            last = Some(count);
            tokio::time::sleep(IDLE_QUIET_PERIOD).await;
        }
    }
}

fn navigation_failed(url: &str, error: impl ToString) -> NavigationError {
    NavigationError::Navigation {
        url: url.to_string(),
        message: error.to_string(),
    }
}

#[async_trait]
impl PageHandle for ChromiumPage {
    async fn navigate(&self, url: &str, wait_until: WaitUntil) -> Result<(), NavigationError> {
        match wait_until {
            WaitUntil::DomContentLoaded => self.navigate_dom_content_loaded(url).await,
            WaitUntil::Load => {
                self.page
                    .goto(url)
                    .await
                    .map_err(|e| navigation_failed(url, e))?;
                Ok(())
            }
            WaitUntil::NetworkIdle => {
                self.page
                    .goto(url)
                    .await
                    .map_err(|e| navigation_failed(url, e))?;
                self.wait_for_network_idle().await;
                Ok(())
            }
        }
    }

    async fn wait_for_selector(&self, selector: &str) -> Result<(), NavigationError> {
        loop {
            if self.page.find_element(selector).await.is_ok() {
                return Ok(());
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn content(&self) -> Result<String, BrowserError> {
        self.page
            .content()
            .await
            .map_err(|e| BrowserError::Page(e.to_string()))
    }

    async fn query_texts(&self, selector: &str) -> Result<Vec<String>, BrowserError> {
        let elements = self
            .page
            .find_elements(selector)
            .await
            .map_err(|e| BrowserError::Page(e.to_string()))?;

        let mut texts = Vec::with_capacity(elements.len());
        for element in elements {
            let text = element
                .inner_text()
                .await
                .map_err(|e| BrowserError::Page(e.to_string()))?;
            texts.push(text.unwrap_or_default().trim().to_string());
        }
        Ok(texts)
    }

    async fn close(self: Box<Self>) -> Result<(), BrowserError> {
        self.page
            .close()
            .await
            .map_err(|e| BrowserError::Page(e.to_string()))
    }
}
