//! API handlers organized by domain.

pub mod basic;
pub mod device;
pub mod machines;
pub mod operations;
pub mod users;

// Re-export ServerState so handlers can use it
pub use crate::server::ServerState;
