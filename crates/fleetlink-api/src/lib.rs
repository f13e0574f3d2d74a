//! HTTP API for the Fleetlink fleet-management backend.
//!
//! Exposes the constrained-device polling channel (report ingestion and
//! command dispatch) plus CRUD for machines, operation logs, and users.

pub mod extract;
pub mod handlers;
pub mod models;
pub mod server;

pub use server::{ServerState, create_router_with_state, run};
