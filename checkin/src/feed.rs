//! Bounded feed of recent check-in outcomes.
//!
//! Newest first. Counters are updated on every append and cover every
//! outcome ever appended, not only the retained window.

use crate::types::CheckInRecord;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Number of records kept by default
pub const DEFAULT_FEED_CAPACITY: usize = 50;

/// Running totals over every appended record
///
/// `total == successful + failed` after every append.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedStats {
    /// Attempts recorded
    pub total: u64,
    /// Admitted attempts
    pub successful: u64,
    /// Refused attempts
    pub failed: u64,
}

/// Ordered, bounded log of check-in outcomes
#[derive(Debug, Clone)]
pub struct CheckInFeed {
    entries: VecDeque<CheckInRecord>,
    stats: FeedStats,
    capacity: usize,
}

impl Default for CheckInFeed {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_CAPACITY)
    }
}

impl CheckInFeed {
    /// Empty feed retaining at most `capacity` records (minimum 1)
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            stats: FeedStats::default(),
            capacity,
        }
    }

    /// Insert at the head, evicting from the tail past capacity
    pub fn append(&mut self, record: CheckInRecord) {
        self.stats.total += 1;
        if record.success {
            self.stats.successful += 1;
        } else {
            self.stats.failed += 1;
        }

        self.entries.push_front(record);
        self.entries.truncate(self.capacity);
    }

    /// Records, newest first
    pub fn entries(&self) -> impl Iterator<Item = &CheckInRecord> {
        self.entries.iter()
    }

    /// Most recent record
    #[must_use]
    pub fn latest(&self) -> Option<&CheckInRecord> {
        self.entries.front()
    }

    /// Retained record count
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is retained
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Retention bound
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Running totals
    #[must_use]
    pub const fn stats(&self) -> FeedStats {
        self.stats
    }

    /// Owned copy for readers outside the store lock
    #[must_use]
    pub fn snapshot(&self) -> FeedSnapshot {
        FeedSnapshot {
            entries: self.entries.iter().cloned().collect(),
            stats: self.stats,
        }
    }
}

/// Point-in-time copy of the feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSnapshot {
    /// Records, newest first
    pub entries: Vec<CheckInRecord>,
    /// Running totals
    pub stats: FeedStats,
}
