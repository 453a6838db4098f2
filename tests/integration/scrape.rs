//! Listing scrape through robots-aware proxy selection
//!
//! A wiremock server plays the storefront's robots.txt; browser test doubles
//! play the two proxies and serve a rendered listing grid.

use async_trait::async_trait;
use chrono::Utc;
use jewel_scout::browser::{BrowserConnector, BrowserSession, PageHandle, WaitUntil};
use jewel_scout::config::{load_config, Config};
use jewel_scout::crawler::{
    build_http_client, CrawlTarget, NavigationPolicy, ProxyCandidate, ProxyKind, ProxyStrategy,
};
use jewel_scout::listing::{
    extract_listings, process_row, row_from_listing, ListingSelectors, ProductRecord,
    NOT_AVAILABLE,
};
use jewel_scout::robots::RobotsPolicy;
use jewel_scout::{AcquireError, BrowserError, NavigationError};
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::NamedTempFile;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GRID: &str = r#"
<html><body>
  <div class="grid">
    <div class="product">
      <a href="/p/halo"><span class="title">14K White Gold 1/2 ct tw Halo Ring</span></a>
      <span class="price">$1,499</span>
      <img src="/img/halo.jpg">
    </div>
    <div class="product">
      <a href="/p/huggies"><span class="title">Sterling Silver Huggie Earrings</span></a>
      <span class="price">$59</span>
    </div>
  </div>
</body></html>
"#;

#[derive(Clone, Copy, PartialEq)]
enum Proxy {
    Serves,
    Refuses,
}

#[derive(Default)]
struct Log {
    connects: Mutex<Vec<ProxyKind>>,
    waits: Mutex<Vec<WaitUntil>>,
    closed: Mutex<Vec<&'static str>>,
}

struct ListingConnector {
    attach: Proxy,
    launch: Proxy,
    log: Arc<Log>,
}

struct ListingBrowser {
    log: Arc<Log>,
}

struct ListingPage {
    log: Arc<Log>,
}

#[async_trait]
impl BrowserConnector for ListingConnector {
    async fn connect(
        &self,
        candidate: &ProxyCandidate,
    ) -> Result<Box<dyn BrowserSession>, BrowserError> {
        let kind = candidate.kind();
        self.log.connects.lock().unwrap().push(kind);

        let behaviour = match kind {
            ProxyKind::Attach => self.attach,
            ProxyKind::Launch => self.launch,
        };
        if behaviour == Proxy::Refuses {
            return Err(BrowserError::Connect {
                endpoint: kind.to_string(),
                message: "connection refused".to_string(),
            });
        }

        Ok(Box::new(ListingBrowser {
            log: Arc::clone(&self.log),
        }))
    }
}

#[async_trait]
impl BrowserSession for ListingBrowser {
    async fn new_page(&mut self) -> Result<Box<dyn PageHandle>, BrowserError> {
        Ok(Box::new(ListingPage {
            log: Arc::clone(&self.log),
        }))
    }

    async fn close(self: Box<Self>) -> Result<(), BrowserError> {
        self.log.closed.lock().unwrap().push("browser");
        Ok(())
    }
}

#[async_trait]
impl PageHandle for ListingPage {
    async fn navigate(&self, _url: &str, wait_until: WaitUntil) -> Result<(), NavigationError> {
        self.log.waits.lock().unwrap().push(wait_until);
        Ok(())
    }

    async fn wait_for_selector(&self, _selector: &str) -> Result<(), NavigationError> {
        Ok(())
    }

    async fn content(&self) -> Result<String, BrowserError> {
        Ok(GRID.to_string())
    }

    async fn query_texts(&self, _selector: &str) -> Result<Vec<String>, BrowserError> {
        Ok(Vec::new())
    }

    async fn close(self: Box<Self>) -> Result<(), BrowserError> {
        self.log.closed.lock().unwrap().push("page");
        Ok(())
    }
}

/// Starts a storefront whose robots.txt disallows `/private`
async fn storefront() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private\n"),
        )
        .expect(1)
        .mount(&server)
        .await;
    server
}

fn write_config(server: &MockServer) -> (NamedTempFile, Config) {
    let toml = format!(
        r#"
[user-agent]
crawler-name = "JewelScout"
crawler-version = "1.0"
contact-url = "https://example.com/about"

[proxy.attach]
endpoint = "ws://127.0.0.1:9222"

[proxy.launch]
server = "http://proxy.example.net:8080"
username = "user"
password = "secret"

[navigation]
max-attempts = 1
jitter-min-ms = 1
jitter-max-ms = 2

[[site]]
name = "demo-rings"
url = "{base}/collections/rings"
ready-selector = ".grid"
item-selector = ".product"
name-selector = ".title"
price-selector = ".price"
image-selector = "img"
link-selector = "a"

[[site]]
name = "demo-private"
url = "{base}/private/sale"
ready-selector = ".grid"
item-selector = ".product"
name-selector = ".title"
"#,
        base = server.uri()
    );

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(toml.as_bytes()).unwrap();
    file.flush().unwrap();

    let config = load_config(file.path()).unwrap();
    (file, config)
}

fn strategy(
    config: &Config,
    attach: Proxy,
    launch: Proxy,
) -> (ProxyStrategy<ListingConnector>, Arc<Log>) {
    let log = Arc::new(Log::default());
    let connector = ListingConnector {
        attach,
        launch,
        log: Arc::clone(&log),
    };
    let client = build_http_client(&config.user_agent).unwrap();
    let robots = RobotsPolicy::new(client, Duration::from_secs(config.robots.timeout_secs));
    let strategy = ProxyStrategy::new(
        connector,
        robots,
        config.proxy.clone(),
        NavigationPolicy::from(&config.navigation),
    );
    (strategy, log)
}

#[tokio::test]
async fn test_allowed_listing_is_scraped_via_attach() {
    let server = storefront().await;
    let (_file, config) = write_config(&server);
    let (strategy, log) = strategy(&config, Proxy::Serves, Proxy::Serves);
    let site = &config.sites[0];

    let target = CrawlTarget::new(&site.url, &site.ready_selector).with_wait_until(site.wait_until);
    let session = strategy.acquire_target(&target).await.unwrap();
    assert_eq!(session.proxy(), ProxyKind::Attach);

    let html = session.page().content().await.unwrap();
    session.close().await.unwrap();
    assert_eq!(*log.closed.lock().unwrap(), vec!["page", "browser"]);
    assert_eq!(*log.waits.lock().unwrap(), vec![WaitUntil::DomContentLoaded]);

    let selectors = ListingSelectors::from_site(site).unwrap();
    let base = Url::parse(&site.url).unwrap();
    let scraped_at = Utc::now();
    let records: Vec<ProductRecord> = extract_listings(&html, &selectors, &base, 0)
        .iter()
        .map(|raw| process_row(row_from_listing(&site.name, raw, scraped_at)))
        .map(|row| ProductRecord::from_row(&row, scraped_at))
        .collect();

    assert_eq!(records.len(), 2);

    assert_eq!(records[0].site, "demo-rings");
    assert_eq!(records[0].metal, "14k white gold");
    assert_eq!(records[0].diamond_weight, "1/2ct tw");
    assert_eq!(records[0].price.as_deref(), Some("$1,499"));
    assert_eq!(
        records[0].image_url,
        Some(format!("{}/img/halo.jpg", server.uri()))
    );
    assert_eq!(
        records[0].product_url,
        Some(format!("{}/p/halo", server.uri()))
    );

    assert_eq!(records[1].metal, "sterling silver");
    assert_eq!(records[1].diamond_weight, NOT_AVAILABLE);
    assert_eq!(records[1].image_url, None);
}

#[tokio::test]
async fn test_disallowed_listing_prefers_launch() {
    let server = storefront().await;
    let (_file, config) = write_config(&server);
    let (strategy, log) = strategy(&config, Proxy::Serves, Proxy::Serves);
    let site = &config.sites[1];

    let session = strategy
        .acquire_page(&site.url, &site.ready_selector)
        .await
        .unwrap();
    assert_eq!(session.proxy(), ProxyKind::Launch);
    session.close().await.unwrap();

    assert_eq!(*log.connects.lock().unwrap(), vec![ProxyKind::Launch]);
    assert_eq!(*log.waits.lock().unwrap(), vec![WaitUntil::NetworkIdle]);
}

#[tokio::test]
async fn test_robots_is_fetched_once_per_origin() {
    let server = storefront().await;
    let (_file, config) = write_config(&server);
    let (strategy, _log) = strategy(&config, Proxy::Serves, Proxy::Serves);

    for site in &config.sites {
        let session = strategy
            .acquire_page(&site.url, &site.ready_selector)
            .await
            .unwrap();
        session.close().await.unwrap();
    }

    assert_eq!(strategy.robots().origins_fetched().await, 1);
    // `expect(1)` on the robots mock is verified when the server drops
}

#[tokio::test]
async fn test_refused_proxy_falls_back() {
    let server = storefront().await;
    let (_file, config) = write_config(&server);
    let (strategy, log) = strategy(&config, Proxy::Refuses, Proxy::Serves);
    let site = &config.sites[0];

    let session = strategy
        .acquire_page(&site.url, &site.ready_selector)
        .await
        .unwrap();
    assert_eq!(session.proxy(), ProxyKind::Launch);
    session.close().await.unwrap();

    assert_eq!(
        *log.connects.lock().unwrap(),
        vec![ProxyKind::Attach, ProxyKind::Launch]
    );
}

#[tokio::test]
async fn test_both_proxies_refused() {
    let server = storefront().await;
    let (_file, config) = write_config(&server);
    let (strategy, log) = strategy(&config, Proxy::Refuses, Proxy::Refuses);
    let site = &config.sites[1];

    let err = strategy
        .acquire_page(&site.url, &site.ready_selector)
        .await
        .unwrap_err();

    match &err {
        AcquireError::ProxyExhausted { url, .. } => assert_eq!(url, &site.url),
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().starts_with("All proxies failed for"));
    assert_eq!(
        *log.connects.lock().unwrap(),
        vec![ProxyKind::Launch, ProxyKind::Attach]
    );
    assert!(log.closed.lock().unwrap().is_empty());
}
