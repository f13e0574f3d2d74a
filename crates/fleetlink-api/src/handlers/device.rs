//! Device polling channel: report ingestion and command dispatch.
//!
//! The embedded controller cannot hold a connection open over its
//! cellular link, so it POSTs reports and GETs pending commands against
//! the same endpoint on its own schedule. Responses on this channel are
//! plain text / form-urlencoded because the firmware parses raw bodies.

use std::collections::BTreeMap;

use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::Deserialize;

use fleetlink_commands::{CommandIntent, NO_MESSAGES, encode_pending};
use fleetlink_core::model::{LinkState, Machine, Operation};

use crate::extract::JsonOrForm;
use crate::handlers::ServerState;

/// Sentinel queue key for polls that omit the SIM number.
const DEFAULT_SIM: &str = "default";

const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";

/// A scalar that may arrive as a JSON number/bool or as a form string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Scalar {
    fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Bool(_) => None,
            Scalar::Number(n) => Some(*n),
            Scalar::Text(t) => t.trim().parse().ok(),
        }
    }

    fn as_u64(&self) -> Option<u64> {
        match self {
            Scalar::Bool(_) => None,
            Scalar::Number(n) if *n >= 0.0 => Some(*n as u64),
            Scalar::Number(_) => None,
            Scalar::Text(t) => t.trim().parse().ok(),
        }
    }

    fn as_text(&self) -> String {
        match self {
            Scalar::Bool(b) => b.to_string(),
            Scalar::Number(n) => n.to_string(),
            Scalar::Text(t) => t.clone(),
        }
    }

    /// Presence check for flag-like fields. An explicit false, zero, or
    /// empty string does not count.
    fn is_set(&self) -> bool {
        match self {
            Scalar::Bool(b) => *b,
            Scalar::Number(n) => *n != 0.0,
            Scalar::Text(t) => !t.is_empty(),
        }
    }
}

/// Phonebook payload: either a structured list or a raw string
/// (typically percent-encoded JSON).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PhoneBookField {
    Entries(Vec<String>),
    Raw(String),
}

/// Inbound device report, classified by the `cmd` tag.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeviceReport {
    pub cmd: Option<String>,
    pub sim_number: Option<String>,
    pub status: Option<String>,
    pub sensor_status: Option<String>,
    pub location: Option<String>,
    pub job: Option<Scalar>,
    pub fuel_consumption: Option<Scalar>,
    pub pressure: Option<Scalar>,
    pub process_time: Option<Scalar>,
    pub count: Option<Scalar>,
    pub phone_book: Option<PhoneBookField>,
    /// Indexed fields (`number1..numberN`) land here.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Scalar>,
}

impl DeviceReport {
    fn count(&self) -> u32 {
        self.count.as_ref().and_then(Scalar::as_u64).unwrap_or(0) as u32
    }

    /// Collect `number1..=count` in index order, skipping absent slots.
    fn directory_numbers(&self) -> Vec<String> {
        let mut numbers = Vec::new();
        for i in 1..=self.count() {
            if let Some(value) = self.extra.get(&format!("number{i}")) {
                let text = value.as_text();
                if !text.is_empty() {
                    numbers.push(text);
                }
            }
        }
        numbers
    }

    fn fuel_consumption(&self) -> f64 {
        self.fuel_consumption
            .as_ref()
            .and_then(Scalar::as_f64)
            .unwrap_or(0.0)
    }

    fn pressure(&self) -> f64 {
        self.pressure.as_ref().and_then(Scalar::as_f64).unwrap_or(0.0)
    }

    fn process_time(&self) -> u64 {
        self.process_time
            .as_ref()
            .and_then(Scalar::as_u64)
            .unwrap_or(0)
    }

    // Form posts routinely carry empty fields (`location=`); an empty
    // string counts as absent and keeps the stored value.
    fn sensor_status(&self) -> Option<&str> {
        self.sensor_status.as_deref().filter(|s| !s.is_empty())
    }

    fn location(&self) -> Option<&str> {
        self.location.as_deref().filter(|l| !l.is_empty())
    }
}

/// Decode a phonebook field into a cleaned list of entries.
///
/// Raw strings are percent-decoded and parsed as a JSON list; anything
/// that fails to decode or parse degrades to a one-element list holding
/// the raw value. Blank entries are dropped either way. Failures never
/// abort the surrounding update.
fn parse_phone_book(field: &PhoneBookField) -> Vec<String> {
    let entries = match field {
        PhoneBookField::Entries(list) => list.clone(),
        PhoneBookField::Raw(raw) => {
            let decoded = urlencoding::decode(raw)
                .map(|cow| cow.into_owned())
                .unwrap_or_else(|_| raw.clone());
            match serde_json::from_str::<Vec<String>>(&decoded) {
                Ok(list) => list,
                Err(err) => {
                    tracing::warn!(%err, "phonebook is not a JSON list, keeping raw value");
                    vec![raw.clone()]
                }
            }
        }
    };

    entries
        .into_iter()
        .filter(|entry| !entry.trim().is_empty())
        .collect()
}

/// Handle an inbound device or operator report.
///
/// POST /api/esp32data
pub async fn receive_report_handler(
    State(state): State<ServerState>,
    JsonOrForm(report): JsonOrForm<DeviceReport>,
) -> Response {
    let Some(sim) = report.sim_number.clone().filter(|sim| !sim.is_empty()) else {
        return (StatusCode::BAD_REQUEST, "SIM number is required").into_response();
    };

    match report.cmd.as_deref() {
        Some("get_status") => queue_status_request(&state, &sim),
        Some("dir_update") => queue_directory_update(&state, &sim, &report),
        Some("STATUS_UPDATE") => apply_status_update(&state, &sim, &report),
        Some("JOB") => apply_job_report(&state, &sim, &report),
        _ => apply_generic_report(&state, &sim, &report),
    }
}

fn queue_status_request(state: &ServerState, sim: &str) -> Response {
    if let Err(err) = state.queue.enqueue(sim, CommandIntent::StatusRequest.encode()) {
        tracing::error!(%err, sim, "failed to queue status request");
        return (StatusCode::INTERNAL_SERVER_ERROR, "Error queueing command").into_response();
    }

    state.freshness.touch();
    tracing::info!(sim, "status request queued");
    (StatusCode::OK, "Get status command queued successfully").into_response()
}

fn queue_directory_update(state: &ServerState, sim: &str, report: &DeviceReport) -> Response {
    let intent = CommandIntent::DirectoryUpdate {
        count: report.count(),
        numbers: report.directory_numbers(),
    };

    if let Err(err) = state.queue.enqueue(sim, intent.encode()) {
        tracing::error!(%err, sim, "failed to queue directory update");
        return (StatusCode::INTERNAL_SERVER_ERROR, "Error queueing command").into_response();
    }

    state.freshness.touch();
    tracing::info!(sim, "directory update queued");
    (StatusCode::OK, "Directory update command queued successfully").into_response()
}

fn apply_status_update(state: &ServerState, sim: &str, report: &DeviceReport) -> Response {
    let machines = match state.machines.find_by_sim(sim) {
        Ok(machines) => machines,
        Err(err) => {
            tracing::error!(%err, sim, "machine lookup failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error processing STATUS_UPDATE",
            )
                .into_response();
        }
    };

    if machines.is_empty() {
        tracing::info!(sim, "no machines found with this SIM");
        return (
            StatusCode::NOT_FOUND,
            "No machines found with this SIM number",
        )
            .into_response();
    }

    let updated = machines.len();
    for mut machine in machines {
        update_link_state(&mut machine, report);
        if let Some(field) = &report.phone_book {
            machine.phone_book = parse_phone_book(field);
        }
        if let Err(err) = state.machines.save(&machine) {
            // Fan-out is best-effort: already-saved machines stay updated.
            tracing::error!(%err, machine_id = %machine.id, "machine update failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error processing STATUS_UPDATE",
            )
                .into_response();
        }
    }

    state.freshness.touch();
    tracing::info!(sim, updated, "applied STATUS_UPDATE");
    (StatusCode::OK, "STATUS_UPDATE processed successfully").into_response()
}

fn apply_job_report(state: &ServerState, sim: &str, report: &DeviceReport) -> Response {
    let machines = match state.machines.find_by_sim(sim) {
        Ok(machines) => machines,
        Err(err) => {
            tracing::error!(%err, sim, "machine lookup failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Error processing JOB data")
                .into_response();
        }
    };

    if machines.is_empty() {
        tracing::info!(sim, "no machines found with this SIM");
        return (
            StatusCode::NOT_FOUND,
            "No machines found with this SIM number",
        )
            .into_response();
    }

    let location = report.location().unwrap_or("Unknown").to_string();

    // One operation record per matched machine.
    for machine in &machines {
        let operation = Operation::new(
            &machine.id,
            report.fuel_consumption(),
            report.pressure(),
            report.process_time(),
            location.clone(),
        );
        if let Err(err) = state.operations.insert(&operation) {
            tracing::error!(%err, machine_id = %machine.id, "operation insert failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Error processing JOB data")
                .into_response();
        }
    }

    let updated = machines.len();
    for mut machine in machines {
        machine.status = LinkState::Online;
        machine.server_connection = LinkState::Online;
        machine.last_status_update = Some(Utc::now());
        if let Some(loc) = report.location() {
            machine.location = loc.to_string();
        }
        machine.updated_at = Utc::now();
        if let Err(err) = state.machines.save(&machine) {
            tracing::error!(%err, machine_id = %machine.id, "machine update failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Error processing JOB data")
                .into_response();
        }
    }

    state.freshness.touch();
    tracing::info!(sim, updated, "created operation records for JOB");
    (StatusCode::OK, "JOB data processed successfully").into_response()
}

fn apply_generic_report(state: &ServerState, sim: &str, report: &DeviceReport) -> Response {
    let machines = match state.machines.find_by_sim(sim) {
        Ok(machines) => machines,
        Err(err) => {
            tracing::error!(%err, sim, "machine lookup failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Error processing data")
                .into_response();
        }
    };

    // An unmatched SIM on an untagged report is a no-op, not an error:
    // a device may race its own registration.
    if machines.is_empty() {
        tracing::info!(sim, "no machines found with this SIM, ignoring report");
        return (StatusCode::OK, "Data received successfully").into_response();
    }

    let has_job_payload = report.job.as_ref().is_some_and(Scalar::is_set)
        && report.fuel_consumption.as_ref().is_some_and(Scalar::is_set)
        && report.pressure.as_ref().is_some_and(Scalar::is_set)
        && report.process_time.as_ref().is_some_and(Scalar::is_set);

    let updated = machines.len();
    for mut machine in machines {
        update_link_state(&mut machine, report);
        if let Err(err) = state.machines.save(&machine) {
            tracing::error!(%err, machine_id = %machine.id, "machine update failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Error processing data")
                .into_response();
        }

        if has_job_payload {
            let operation = Operation::new(
                &machine.id,
                report.fuel_consumption(),
                report.pressure(),
                report.process_time(),
                report.location().unwrap_or("Unknown").to_string(),
            );
            if let Err(err) = state.operations.insert(&operation) {
                tracing::error!(%err, machine_id = %machine.id, "operation insert failed");
                return (StatusCode::INTERNAL_SERVER_ERROR, "Error processing data")
                    .into_response();
            }
        }
    }

    state.freshness.touch();
    tracing::info!(sim, updated, "applied device report");
    (StatusCode::OK, "Data received successfully").into_response()
}

fn update_link_state(machine: &mut Machine, report: &DeviceReport) {
    // Unknown status strings keep the existing state.
    if let Some(parsed) = report.status.as_deref().and_then(LinkState::parse) {
        machine.status = parsed;
    }
    machine.server_connection = LinkState::Online;
    machine.last_status_update = Some(Utc::now());
    if let Some(sensor) = report.sensor_status() {
        machine.sensor_status = sensor.to_string();
    }
    if let Some(location) = report.location() {
        machine.location = location.to_string();
    }
    machine.updated_at = Utc::now();
}

/// Poll query parameters.
#[derive(Debug, Deserialize)]
pub struct PollParams {
    #[serde(rename = "simNumber")]
    pub sim_number: Option<String>,
}

/// Hand over and clear a device's pending commands.
///
/// GET /api/esp32data
///
/// Never errors on a well-formed poll: devices poll every few seconds
/// and an empty queue is the common, cheap case.
pub async fn poll_commands_handler(
    State(state): State<ServerState>,
    Query(params): Query<PollParams>,
) -> Response {
    let sim = params
        .sim_number
        .unwrap_or_else(|| DEFAULT_SIM.to_string());

    let drained = state.queue.drain(&sim);
    let body = if drained.is_empty() {
        tracing::debug!(sim, "no pending commands");
        NO_MESSAGES.to_string()
    } else {
        tracing::info!(sim, count = drained.len(), "dispatching commands");
        encode_pending(&drained)
    };

    ([(header::CONTENT_TYPE, CONTENT_TYPE_FORM)], body).into_response()
}

/// Queue a status request for one machine, resolved to its SIM.
///
/// POST /api/getStatus/:id
pub async fn request_status_handler(
    State(state): State<ServerState>,
    Path(machine_id): Path<String>,
) -> Response {
    let machine = match state.machines.get(&machine_id) {
        Ok(Some(machine)) => machine,
        Ok(None) => return (StatusCode::NOT_FOUND, "Machine not found").into_response(),
        Err(err) => {
            tracing::error!(%err, machine_id, "machine lookup failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Error requesting status")
                .into_response();
        }
    };

    if machine.sim_number.is_empty() {
        return (StatusCode::BAD_REQUEST, "Machine has no SIM number").into_response();
    }

    if let Err(err) = state
        .queue
        .enqueue(&machine.sim_number, CommandIntent::StatusRequest.encode())
    {
        tracing::error!(%err, machine_id, "failed to queue status request");
        return (StatusCode::INTERNAL_SERVER_ERROR, "Error requesting status")
            .into_response();
    }

    tracing::info!(machine_id, sim = %machine.sim_number, "status request queued");
    (StatusCode::OK, "Status request sent").into_response()
}
