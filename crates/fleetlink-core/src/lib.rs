//! Core types for the Fleetlink fleet-management backend.
//!
//! Provides:
//! - The shared error taxonomy
//! - Domain records (machines, operations, users)
//! - The freshness tracker surfaced to dashboards

pub mod error;
pub mod freshness;
pub mod model;

pub use error::{Error, Result};
pub use freshness::FreshnessTracker;
pub use model::{LinkState, Machine, Operation, User};
