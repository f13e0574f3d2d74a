//! Persistent record stores for the fleet backend.
//!
//! Each store owns one redb database file with JSON-serialized values.
//! Lookups the command core depends on (`find_by_sim`) intentionally
//! return every match: SIM numbers are shared across multi-unit
//! installations and are not a unique key.

pub mod error;
pub mod machines;
pub mod operations;
pub mod users;

pub use error::{Error, Result};
pub use machines::MachineStore;
pub use operations::OperationStore;
pub use users::UserStore;
