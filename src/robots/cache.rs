//! Per-session robots.txt cache
//!
//! Disallow patterns are fetched once per origin for the lifetime of the
//! cache. Nothing is persisted between sessions.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

/// Disallow patterns for one origin
#[derive(Debug, Clone)]
pub struct CachedRobots {
    /// Patterns from every `Disallow:` line; empty when the fetch failed
    pub patterns: Arc<Vec<String>>,

    /// When the robots.txt was fetched
    pub fetched_at: DateTime<Utc>,
}

impl CachedRobots {
    pub fn new(patterns: Vec<String>) -> Self {
        Self {
            patterns: Arc::new(patterns),
            fetched_at: Utc::now(),
        }
    }

    /// Returns how long ago the patterns were fetched
    pub fn age(&self) -> Duration {
        Utc::now() - self.fetched_at
    }
}

/// Origin-keyed cache shared by concurrent acquisitions
///
/// The map lock only guards cell lookup; each origin's fetch runs inside its
/// own cell, so a slow origin never holds up another.
#[derive(Debug, Default)]
pub struct RobotsCache {
    entries: Mutex<HashMap<String, Arc<OnceCell<CachedRobots>>>>,
}

impl RobotsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached patterns for `origin`, fetching them with `fetch` on a miss
    ///
    /// Callers racing on the same origin share a single request.
    pub async fn get_or_fetch<F, Fut>(&self, origin: &str, fetch: F) -> CachedRobots
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Vec<String>>,
    {
        let cell = {
            let mut entries = self.entries.lock().await;
            Arc::clone(entries.entry(origin.to_string()).or_default())
        };

        if let Some(cached) = cell.get() {
            tracing::trace!(
                "robots.txt cache hit for {} (age {}s)",
                origin,
                cached.age().num_seconds()
            );
            return cached.clone();
        }

        cell.get_or_init(|| async { CachedRobots::new(fetch().await) })
            .await
            .clone()
    }

    /// Number of origins fetched so far
    pub async fn len(&self) -> usize {
        self.entries
            .lock()
            .await
            .values()
            .filter(|cell| cell.initialized())
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
