//! Last-update tracking for dashboard display.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

/// Process-wide "last data update" timestamp.
///
/// Overwritten on every state-mutating operation; no history is kept.
/// Handlers take this as an injected shared service rather than reading
/// an ambient global.
#[derive(Debug)]
pub struct FreshnessTracker {
    last_update: RwLock<DateTime<Utc>>,
}

impl FreshnessTracker {
    /// Create a tracker initialized to the current time.
    pub fn new() -> Self {
        Self {
            last_update: RwLock::new(Utc::now()),
        }
    }

    /// Record that machine or operation state just changed.
    pub fn touch(&self) {
        *self.last_update.write() = Utc::now();
    }

    /// The most recent update timestamp.
    pub fn last_update(&self) -> DateTime<Utc> {
        *self.last_update.read()
    }
}

impl Default for FreshnessTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialized_to_construction_time() {
        let before = Utc::now();
        let tracker = FreshnessTracker::new();
        let after = Utc::now();

        let value = tracker.last_update();
        assert!(value >= before && value <= after);
    }

    #[test]
    fn test_touch_moves_forward() {
        let tracker = FreshnessTracker::new();
        let first = tracker.last_update();

        tracker.touch();
        assert!(tracker.last_update() >= first);
    }
}
