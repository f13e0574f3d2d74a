//! Command dispatch for polling devices.
//!
//! Provides:
//! - Per-SIM bounded FIFO queues of outbound commands
//! - Wire encoding of command payloads and poll responses
//!
//! Devices on cellular links cannot hold connections open, so commands
//! wait in a queue keyed by SIM number and are handed over in one batch
//! when the device polls.

pub mod encoder;
pub mod queue;

// Re-exports
pub use encoder::{CommandIntent, NO_MESSAGES, STATUS_REQUEST, encode_pending};
pub use queue::{DeviceQueue, QUEUE_CAPACITY, QueueError, QueuedCommand};
