//! crates/documind_core/src/quota.rs
//!
//! The sliding-window allowance: at most `limit` units inside any rolling
//! `window`. Each unit frees up exactly `window` after it was consumed, so the
//! allowance replenishes continuously instead of at a fixed reset.

use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;

use crate::domain::{QuotaDecision, UsageSnapshot};

pub const DEFAULT_DAILY_LIMIT: u32 = 3;
pub const DEFAULT_WINDOW_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaPolicy {
    pub limit: u32,
    pub window: Duration,
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self {
            limit: DEFAULT_DAILY_LIMIT,
            window: Duration::hours(DEFAULT_WINDOW_HOURS),
        }
    }
}

impl QuotaPolicy {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self { limit, window }
    }

    /// Everything at or before this instant has left the window.
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.window
    }

    /// Builds the snapshot for `used` units whose oldest entry is `oldest`.
    pub fn snapshot(
        &self,
        used: u32,
        oldest: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> UsageSnapshot {
        UsageSnapshot {
            limit: self.limit,
            remaining: self.limit.saturating_sub(used),
            reset_at: oldest.map_or(now, |t| t + self.window),
        }
    }
}

/// Timestamps of the units consumed inside the window, oldest first.
#[derive(Debug, Clone, Default)]
pub struct SlidingWindowLog {
    hits: VecDeque<DateTime<Utc>>,
}

impl SlidingWindowLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes one unit at `now` if the window has room.
    pub fn consume(&mut self, policy: &QuotaPolicy, now: DateTime<Utc>) -> QuotaDecision {
        self.prune(policy.window_start(now));
        let allowed = (self.hits.len() as u32) < policy.limit;
        if allowed {
            self.hits.push_back(now);
        }
        QuotaDecision {
            allowed,
            usage: policy.snapshot(self.hits.len() as u32, self.hits.front().copied(), now),
        }
    }

    /// Read-only view; expired entries are skipped, not dropped.
    pub fn snapshot(&self, policy: &QuotaPolicy, now: DateTime<Utc>) -> UsageSnapshot {
        let start = policy.window_start(now);
        let mut live = self.hits.iter().filter(|t| **t > start);
        let oldest = live.next().copied();
        let used = oldest.map_or(0, |_| 1 + live.count() as u32);
        policy.snapshot(used, oldest, now)
    }

    fn prune(&mut self, window_start: DateTime<Utc>) {
        while self.hits.front().is_some_and(|t| *t <= window_start) {
            self.hits.pop_front();
        }
    }
}
