//! Domain records.
//!
//! Field names follow the wire format the dashboard and firmware already
//! speak (camelCase, status values in upper case).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Machine status / server connectivity, as reported over the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum LinkState {
    Online,
    #[default]
    Offline,
}

impl LinkState {
    /// Parse a wire value. Unknown values are rejected so a garbled
    /// report falls back to the existing state.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ONLINE" => Some(LinkState::Online),
            "OFFLINE" => Some(LinkState::Offline),
            _ => None,
        }
    }
}

/// One physical unit in the fleet.
///
/// `sim_number` is deliberately not unique: a multi-unit installation
/// shares one cellular link, and every report for that SIM updates all
/// machines carrying it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Machine {
    pub id: String,
    #[serde(default)]
    pub machine_name: String,
    #[serde(default)]
    pub sim_number: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub remarks: String,
    #[serde(default)]
    pub status: LinkState,
    #[serde(default = "default_none")]
    pub sensor_status: String,
    #[serde(default = "default_none")]
    pub location: String,
    #[serde(default)]
    pub server_connection: LinkState,
    #[serde(default)]
    pub last_status_update: Option<DateTime<Utc>>,
    #[serde(default)]
    pub directory_numbers: Vec<String>,
    #[serde(default)]
    pub phone_book: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_none() -> String {
    "None".to_string()
}

impl Machine {
    /// Create a new machine with default status fields.
    pub fn new(
        machine_name: impl Into<String>,
        sim_number: impl Into<String>,
        username: impl Into<String>,
        remarks: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            machine_name: machine_name.into(),
            sim_number: sim_number.into(),
            username: username.into(),
            remarks: remarks.into(),
            status: LinkState::Offline,
            sensor_status: default_none(),
            location: default_none(),
            server_connection: LinkState::Offline,
            last_status_update: None,
            directory_numbers: Vec::new(),
            phone_book: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Append-only log entry for one completed job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub id: String,
    pub machine_id: String,
    pub date_time: DateTime<Utc>,
    pub fuel_consumption: f64,
    pub pressure: f64,
    pub process_time: u64,
    pub location: String,
}

impl Operation {
    pub fn new(
        machine_id: impl Into<String>,
        fuel_consumption: f64,
        pressure: f64,
        process_time: u64,
        location: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            machine_id: machine_id.into(),
            date_time: Utc::now(),
            fuel_consumption,
            pressure,
            process_time,
            location: location.into(),
        }
    }
}

/// Dashboard account owning a set of machines.
///
/// Login flows are out of scope; the record exists so machine ownership
/// and per-user machine counts survive restarts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub machine_count: i64,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        name: impl Into<String>,
        username: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            username: username.into(),
            email: email.into(),
            machine_count: 0,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_machine_defaults() {
        let machine = Machine::new("Cab 1", "8944500101", "operator", "");

        assert_eq!(machine.status, LinkState::Offline);
        assert_eq!(machine.server_connection, LinkState::Offline);
        assert_eq!(machine.sensor_status, "None");
        assert_eq!(machine.location, "None");
        assert!(machine.last_status_update.is_none());
        assert!(machine.phone_book.is_empty());
    }

    #[test]
    fn test_machine_wire_field_names() {
        let machine = Machine::new("Cab 1", "8944500101", "operator", "");
        let json = serde_json::to_value(&machine).unwrap();

        assert!(json.get("machineName").is_some());
        assert!(json.get("simNumber").is_some());
        assert!(json.get("serverConnection").is_some());
        assert_eq!(json["status"], "OFFLINE");
    }

    #[test]
    fn test_link_state_parse() {
        assert_eq!(LinkState::parse("ONLINE"), Some(LinkState::Online));
        assert_eq!(LinkState::parse("OFFLINE"), Some(LinkState::Offline));
        assert_eq!(LinkState::parse("online"), None);
        assert_eq!(LinkState::parse(""), None);
    }

    #[test]
    fn test_operation_round_trip() {
        let op = Operation::new("machine-1", 12.5, 80.0, 45, "Site A");
        let json = serde_json::to_string(&op).unwrap();
        let back: Operation = serde_json::from_str(&json).unwrap();

        assert_eq!(back.machine_id, "machine-1");
        assert_eq!(back.fuel_consumption, 12.5);
        assert_eq!(back.process_time, 45);
    }
}
