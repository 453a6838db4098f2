//! Page acquisition
//!
//! This module contains the core loading logic, including:
//! - HTTP client construction for robots.txt and images
//! - Resilient navigation with bounded, jittered retries
//! - Robots-aware selection between the attach and launch proxies

mod fetcher;
mod navigator;
mod proxy;

pub use fetcher::build_http_client;
pub use navigator::{goto_and_wait, Jitter, NavigationPolicy};
pub use proxy::{
    order_candidates, CandidateOutcome, CrawlTarget, ProxyCandidate, ProxyKind, ProxyStrategy,
    ScrapeSession,
};
