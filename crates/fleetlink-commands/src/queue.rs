//! Per-device outbound command queue.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// Maximum commands retained per device.
///
/// Insertion past the cap drops the oldest entries: a device that polls
/// rarely loses its stalest commands instead of blocking producers.
pub const QUEUE_CAPACITY: usize = 20;

/// A command waiting for its device to poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedCommand {
    /// Wire-format payload, e.g. `cmd=get_status`.
    pub payload: String,
    pub enqueued_at: DateTime<Utc>,
}

/// Bounded per-SIM FIFO of outbound commands.
///
/// Enqueue and drain for one SIM are atomic with respect to each other:
/// the map locks per key, so a poll racing an enqueue sees the command
/// either in this drain or in the next one, never both, never neither.
/// Queues for different SIMs are fully independent.
pub struct DeviceQueue {
    queues: DashMap<String, Vec<QueuedCommand>>,
    capacity: usize,
}

impl DeviceQueue {
    pub fn new() -> Self {
        Self::with_capacity(QUEUE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            queues: DashMap::new(),
            capacity,
        }
    }

    /// Append a command for a device, evicting the oldest entries if the
    /// queue would exceed its capacity. Eviction and insertion happen
    /// under the same per-key lock.
    pub fn enqueue(
        &self,
        sim_number: &str,
        payload: impl Into<String>,
    ) -> Result<(), QueueError> {
        if sim_number.is_empty() {
            return Err(QueueError::MissingDeviceId);
        }

        let mut entry = self.queues.entry(sim_number.to_string()).or_default();
        entry.push(QueuedCommand {
            payload: payload.into(),
            enqueued_at: Utc::now(),
        });

        let overflow = entry.len().saturating_sub(self.capacity);
        if overflow > 0 {
            entry.drain(..overflow);
        }

        Ok(())
    }

    /// Snapshot of the pending commands for a device, oldest first.
    /// Unknown devices yield an empty list.
    pub fn peek(&self, sim_number: &str) -> Vec<QueuedCommand> {
        self.queues
            .get(sim_number)
            .map(|queue| queue.clone())
            .unwrap_or_default()
    }

    /// Whether any commands are waiting for a device.
    pub fn has_pending(&self, sim_number: &str) -> bool {
        self.queues
            .get(sim_number)
            .map(|queue| !queue.is_empty())
            .unwrap_or(false)
    }

    /// Atomically take and clear the pending commands for a device.
    pub fn drain(&self, sim_number: &str) -> Vec<QueuedCommand> {
        self.queues
            .remove(sim_number)
            .map(|(_, queue)| queue)
            .unwrap_or_default()
    }
}

impl Default for DeviceQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Queue error types.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("device identifier is required")]
    MissingDeviceId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_returns_fifo_order() {
        let queue = DeviceQueue::new();

        queue.enqueue("SIM1", "cmd=get_status").unwrap();
        queue.enqueue("SIM1", "cmd=dir_update&count=0").unwrap();

        let drained = queue.drain("SIM1");
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].payload, "cmd=get_status");
        assert_eq!(drained[1].payload, "cmd=dir_update&count=0");
    }

    #[test]
    fn test_drain_then_drain_is_empty() {
        let queue = DeviceQueue::new();
        queue.enqueue("SIM1", "cmd=get_status").unwrap();

        assert_eq!(queue.drain("SIM1").len(), 1);
        assert!(queue.drain("SIM1").is_empty());
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let queue = DeviceQueue::new();
        for i in 0..25 {
            queue.enqueue("SIM1", format!("cmd={i}")).unwrap();
        }

        let drained = queue.drain("SIM1");
        assert_eq!(drained.len(), QUEUE_CAPACITY);
        assert_eq!(drained[0].payload, "cmd=5");
        assert_eq!(drained[19].payload, "cmd=24");
    }

    #[test]
    fn test_empty_sim_rejected() {
        let queue = DeviceQueue::new();
        assert!(matches!(
            queue.enqueue("", "cmd=get_status"),
            Err(QueueError::MissingDeviceId)
        ));
        assert!(!queue.has_pending(""));
    }

    #[test]
    fn test_has_pending_per_device() {
        let queue = DeviceQueue::new();
        queue.enqueue("SIM1", "cmd=get_status").unwrap();

        assert!(queue.has_pending("SIM1"));
        assert!(!queue.has_pending("SIM2"));
    }

    #[test]
    fn test_peek_does_not_consume() {
        let queue = DeviceQueue::new();
        queue.enqueue("SIM1", "cmd=get_status").unwrap();

        assert_eq!(queue.peek("SIM1").len(), 1);
        assert_eq!(queue.peek("SIM1").len(), 1);
        assert!(queue.peek("SIM2").is_empty());
    }

    #[test]
    fn test_queues_are_independent() {
        let queue = DeviceQueue::new();
        queue.enqueue("SIM1", "a").unwrap();
        queue.enqueue("SIM2", "b").unwrap();

        assert_eq!(queue.drain("SIM1").len(), 1);
        assert!(queue.has_pending("SIM2"));
    }

    #[test]
    fn test_concurrent_enqueue_and_drain_loses_nothing() {
        use std::sync::Arc;

        let queue = Arc::new(DeviceQueue::with_capacity(10_000));
        let producer = {
            let queue = queue.clone();
            std::thread::spawn(move || {
                for i in 0..1_000 {
                    queue.enqueue("SIM1", format!("cmd={i}")).unwrap();
                }
            })
        };

        let mut seen = Vec::new();
        while seen.len() < 1_000 {
            seen.extend(queue.drain("SIM1"));
        }
        producer.join().unwrap();
        seen.extend(queue.drain("SIM1"));

        // Every command surfaced exactly once, in order.
        assert_eq!(seen.len(), 1_000);
        for (i, cmd) in seen.iter().enumerate() {
            assert_eq!(cmd.payload, format!("cmd={i}"));
        }
    }
}
