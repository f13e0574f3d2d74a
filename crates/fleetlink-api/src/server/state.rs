//! Server state shared across all handlers.

use std::path::Path;
use std::sync::Arc;

use fleetlink_commands::DeviceQueue;
use fleetlink_core::FreshnessTracker;
use fleetlink_storage::{MachineStore, OperationStore, UserStore};

/// Server state shared across all handlers.
///
/// Every service is behind an `Arc` so the state clones cheaply per
/// request. The command queue is in-memory by design: commands do not
/// survive a restart, devices re-request work on their poll schedule.
#[derive(Clone)]
pub struct ServerState {
    pub machines: Arc<MachineStore>,
    pub operations: Arc<OperationStore>,
    pub users: Arc<UserStore>,
    pub queue: Arc<DeviceQueue>,
    pub freshness: Arc<FreshnessTracker>,
}

impl ServerState {
    /// Open all persistent stores under `data_dir`.
    pub fn open(data_dir: &Path) -> fleetlink_storage::Result<Self> {
        Ok(Self {
            machines: Arc::new(MachineStore::open(data_dir.join("machines.redb"))?),
            operations: Arc::new(OperationStore::open(data_dir.join("operations.redb"))?),
            users: Arc::new(UserStore::open(data_dir.join("users.redb"))?),
            queue: Arc::new(DeviceQueue::new()),
            freshness: Arc::new(FreshnessTracker::new()),
        })
    }
}
