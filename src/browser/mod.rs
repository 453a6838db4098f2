//! Browser capability layer
//!
//! The navigation and proxy logic only ever talk to these traits, so they can
//! be driven by chromium in production and by scripted doubles in tests:
//! - [`BrowserConnector`] opens a browser for a proxy candidate
//! - [`BrowserSession`] owns one browser and hands out pages
//! - [`PageHandle`] navigates, waits for markers and reads the DOM

mod chromium;

pub use chromium::{ChromiumConnector, STEALTH_SCRIPT};

use crate::crawler::ProxyCandidate;
use crate::{BrowserError, NavigationError};
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;

/// Completion criterion for a page load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WaitUntil {
    /// The HTML is parsed; scripts and images may still be loading
    DomContentLoaded,
    /// The `load` event fired
    Load,
    /// No new network requests for a short quiet period after `load`
    NetworkIdle,
}

impl fmt::Display for WaitUntil {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DomContentLoaded => write!(f, "dom-content-loaded"),
            Self::Load => write!(f, "load"),
            Self::NetworkIdle => write!(f, "network-idle"),
        }
    }
}

/// One open tab
///
/// Timeouts are applied by the caller; implementations may block until the
/// operation completes or fails.
#[async_trait]
pub trait PageHandle: Send + Sync {
    /// Loads `url` and returns once `wait_until` is satisfied
    async fn navigate(&self, url: &str, wait_until: WaitUntil) -> Result<(), NavigationError>;

    /// Returns once an element matching `selector` is attached to the DOM
    async fn wait_for_selector(&self, selector: &str) -> Result<(), NavigationError>;

    /// Current serialized DOM
    async fn content(&self) -> Result<String, BrowserError>;

    /// Inner text of every element matching `selector`, in DOM order
    async fn query_texts(&self, selector: &str) -> Result<Vec<String>, BrowserError>;

    async fn close(self: Box<Self>) -> Result<(), BrowserError>;
}

/// An open browser (launched or attached)
#[async_trait]
pub trait BrowserSession: Send {
    /// Opens a page in a fresh browsing context
    async fn new_page(&mut self) -> Result<Box<dyn PageHandle>, BrowserError>;

    /// Releases the browser; launched processes are terminated
    async fn close(self: Box<Self>) -> Result<(), BrowserError>;
}

/// Opens browsers for proxy candidates
#[async_trait]
pub trait BrowserConnector: Send + Sync {
    async fn connect(
        &self,
        candidate: &ProxyCandidate,
    ) -> Result<Box<dyn BrowserSession>, BrowserError>;
}
