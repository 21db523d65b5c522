//! Rendered page cache with stale-while-revalidate semantics
//!
//! Each route keeps the HTML it was last rendered to, when that happened and
//! how long it stays fresh. A stale page is still served while one background
//! task regenerates it; the in-flight set guarantees at most one refresh per
//! route at a time.
//!
//! Entries live in a bounded moka cache, so requests for arbitrary routes
//! cannot grow memory without limit. Freshness is tracked per entry rather
//! than through moka's TTL, since stale entries must stay servable.

use moka::future::Cache;
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Default number of routes kept in memory
pub const DEFAULT_CACHE_CAPACITY: u64 = 1000;

/// Outcome a cached route renders as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStatus {
    Ok,
    NotFound,
    /// Generation failed on the content API side
    Unavailable,
}

/// A rendered route
#[derive(Debug, Clone)]
pub struct CachedPage {
    pub html: String,
    pub status: PageStatus,
    pub generated_at: Instant,
    /// `None` never goes stale
    pub revalidate: Option<Duration>,
}

impl CachedPage {
    pub fn new(html: String, status: PageStatus, revalidate: Option<Duration>) -> Self {
        Self {
            html,
            status,
            generated_at: Instant::now(),
            revalidate,
        }
    }

    pub fn is_fresh_at(&self, now: Instant) -> bool {
        match self.revalidate {
            Some(window) => now.saturating_duration_since(self.generated_at) < window,
            None => true,
        }
    }
}

/// Result of a cache lookup
#[derive(Debug, Clone)]
pub enum Lookup {
    Fresh(CachedPage),
    /// Past its window; serve it and refresh in the background
    Stale(CachedPage),
    Missing,
}

pub struct PageCache {
    pages: Cache<String, CachedPage>,
    refreshing: Mutex<HashSet<String>>,
}

impl Default for PageCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }
}

impl PageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(max_capacity: u64) -> Self {
        Self {
            pages: Cache::builder().max_capacity(max_capacity).build(),
            refreshing: Mutex::new(HashSet::new()),
        }
    }

    pub async fn lookup(&self, route: &str) -> Lookup {
        self.lookup_at(route, Instant::now()).await
    }

    pub async fn lookup_at(&self, route: &str, now: Instant) -> Lookup {
        match self.pages.get(route).await {
            Some(page) if page.is_fresh_at(now) => {
                tracing::debug!(route, "cache hit");
                Lookup::Fresh(page)
            }
            Some(page) => {
                tracing::debug!(route, "cache stale");
                Lookup::Stale(page)
            }
            None => {
                tracing::debug!(route, "cache miss");
                Lookup::Missing
            }
        }
    }

    /// Whether `route` holds a page, fresh or not
    pub fn contains(&self, route: &str) -> bool {
        self.pages.contains_key(route)
    }

    pub async fn insert(&self, route: &str, page: CachedPage) {
        self.pages.insert(route.to_string(), page).await;
    }

    /// Claim the refresh of `route`; `false` if one is already running
    pub async fn begin_refresh(&self, route: &str) -> bool {
        self.refreshing.lock().await.insert(route.to_string())
    }

    pub async fn end_refresh(&self, route: &str) {
        self.refreshing.lock().await.remove(route);
    }

    /// Number of cached routes once pending evictions are applied
    pub async fn entry_count(&self) -> u64 {
        self.pages.run_pending_tasks().await;
        self.pages.entry_count()
    }
}
