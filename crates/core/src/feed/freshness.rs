//! Freshness oracle for cached feed lists.
//!
//! Two TTLs apply to a cached list. The hard TTL bounds how long the store
//! keeps it at all; the much shorter soft window bounds how long it may
//! answer a first-page request. Continuation pages (`offset > 0`) ignore the
//! soft window entirely so a scroll session stays pinned to the list that
//! produced its first page.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Default soft window for batch-oriented feed versions.
pub const DEFAULT_FRESHNESS_WINDOW: Duration = Duration::from_secs(3 * 60);

/// Default soft window for the near-real-time feed version.
pub const DEFAULT_REALTIME_FRESHNESS_WINDOW: Duration = Duration::from_secs(60);

/// Feed version served with the tighter window.
pub const DEFAULT_REALTIME_FEED_VERSION: u32 = 5;

/// Absolute lifetime of cached entries and mutation markers.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Timestamps the oracle compares, read together from the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FreshnessMarks {
    /// When the cached list was fetched from upstream.
    pub generated_at: Option<DateTime<Utc>>,
    /// When the feed's configuration last changed.
    pub updated_at: Option<DateTime<Utc>>,
}

/// Soft and hard TTL settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessPolicy {
    pub window: Duration,
    pub realtime_window: Duration,
    pub realtime_version: u32,
    pub hard_ttl: Duration,
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self {
            window: DEFAULT_FRESHNESS_WINDOW,
            realtime_window: DEFAULT_REALTIME_FRESHNESS_WINDOW,
            realtime_version: DEFAULT_REALTIME_FEED_VERSION,
            hard_ttl: DEFAULT_CACHE_TTL,
        }
    }
}

impl FreshnessPolicy {
    /// Soft window applied to `feed_version`.
    pub fn window_for(&self, feed_version: u32) -> Duration {
        if feed_version == self.realtime_version { self.realtime_window } else { self.window }
    }

    /// Decide whether the cached list may serve a page at `offset`.
    pub fn is_fresh(&self, now: DateTime<Utc>, offset: usize, marks: &FreshnessMarks, feed_version: u32) -> bool {
        is_fresh(now, offset, marks, self.window_for(feed_version))
    }
}

/// Pure freshness decision.
///
/// Rules, in order:
/// 1. `offset > 0` is always fresh.
/// 2. A list that was never generated is stale.
/// 3. A list older than the feed's mutation marker is stale.
/// 4. A list older than `window` is stale.
pub fn is_fresh(now: DateTime<Utc>, offset: usize, marks: &FreshnessMarks, window: Duration) -> bool {
    if offset > 0 {
        return true;
    }

    let Some(generated_at) = marks.generated_at else {
        return false;
    };

    if let Some(updated_at) = marks.updated_at
        && updated_at > generated_at
    {
        return false;
    }

    match chrono::Duration::from_std(window) {
        Ok(window) => now.signed_duration_since(generated_at) <= window,
        Err(_) => true,
    }
}
