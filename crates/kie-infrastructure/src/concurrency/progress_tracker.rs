//! TTL-keyed progress storage.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use kie_domain::value_objects::KnowledgeItemId;

struct Entry {
    value: u8,
    last_touched: Instant,
}

/// Maps an item id to its last-reported progress, with lazy TTL-based expiry.
///
/// There is no background sweep: staleness is only checked when a caller reads a
/// value, per the "lazy computation" design this mirrors.
pub struct ProgressTracker {
    ttl: Duration,
    entries: DashMap<KnowledgeItemId, Entry>,
}

impl ProgressTracker {
    /// Build a tracker with the given staleness window.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
        }
    }

    /// Record `value` (clamped to `[0, 100]`) as of now.
    pub fn set(&self, id: &KnowledgeItemId, value: u8) {
        self.entries.insert(
            id.clone(),
            Entry {
                value: value.min(100),
                last_touched: Instant::now(),
            },
        );
    }

    /// Read the current value, or `None` if absent or stale.
    #[must_use]
    pub fn get(&self, id: &KnowledgeItemId) -> Option<u8> {
        let entry = self.entries.get(id)?;
        if entry.last_touched.elapsed() <= self.ttl {
            Some(entry.value)
        } else {
            None
        }
    }

    /// Remove any recorded value for `id`.
    pub fn delete(&self, id: &KnowledgeItemId) {
        self.entries.remove(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_none_strictly_after_ttl_expires() {
        let tracker = ProgressTracker::new(Duration::from_millis(10));
        let id = KnowledgeItemId::new("x");
        tracker.set(&id, 20);
        assert_eq!(tracker.get(&id), Some(20));
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(tracker.get(&id), None);
    }

    #[test]
    fn set_clamps_above_100() {
        let tracker = ProgressTracker::new(Duration::from_secs(60));
        let id = KnowledgeItemId::new("x");
        tracker.set(&id, 120);
        assert_eq!(tracker.get(&id), Some(100));
    }

    #[test]
    fn delete_removes_entry() {
        let tracker = ProgressTracker::new(Duration::from_secs(60));
        let id = KnowledgeItemId::new("x");
        tracker.set(&id, 50);
        tracker.delete(&id);
        assert_eq!(tracker.get(&id), None);
    }
}
