//! Machine CRUD handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use fleetlink_core::model::Machine;

use super::ServerState;
use crate::models::{ErrorResponse, HandlerResult, ok};

/// Query parameters for machine listing.
#[derive(Debug, Deserialize)]
pub struct ListMachinesParams {
    pub username: Option<String>,
}

/// List all machines, optionally filtered by owner.
///
/// GET /api/machines
pub async fn list_machines_handler(
    State(state): State<ServerState>,
    Query(params): Query<ListMachinesParams>,
) -> HandlerResult<Vec<Machine>> {
    let machines = state.machines.list(params.username.as_deref())?;
    Ok(Json(machines))
}

/// New machine payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMachineRequest {
    pub machine_name: String,
    #[serde(default)]
    pub sim_number: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub remarks: String,
}

/// Register a new machine and bump its owner's machine count.
///
/// POST /api/machines
pub async fn create_machine_handler(
    State(state): State<ServerState>,
    Json(req): Json<CreateMachineRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ErrorResponse> {
    let machine = Machine::new(req.machine_name, req.sim_number, req.username, req.remarks);
    state.machines.save(&machine)?;

    if !machine.username.is_empty() {
        state.users.adjust_machine_count(&machine.username, 1)?;
    }

    tracing::info!(machine_id = %machine.id, "machine added");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Machine added successfully",
            "machine": machine,
        })),
    ))
}

/// Patch-style machine update.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateMachineRequest {
    pub machine_name: Option<String>,
    pub sim_number: Option<String>,
    pub username: Option<String>,
    pub remarks: Option<String>,
    pub location: Option<String>,
    pub directory_numbers: Option<Vec<String>>,
    pub phone_book: Option<Vec<String>>,
}

/// Update a machine.
///
/// PATCH /api/machines/:id
pub async fn update_machine_handler(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateMachineRequest>,
) -> HandlerResult<Machine> {
    let Some(mut machine) = state.machines.get(&id)? else {
        return Err(ErrorResponse::not_found("Machine not found"));
    };

    if let Some(username) = &req.username {
        if !machine.username.is_empty() && machine.username != *username {
            return Err(ErrorResponse::forbidden(
                "Not authorized to update this machine",
            ));
        }
    }

    if let Some(name) = req.machine_name {
        machine.machine_name = name;
    }
    if let Some(sim) = req.sim_number {
        machine.sim_number = sim;
    }
    if let Some(remarks) = req.remarks {
        machine.remarks = remarks;
    }
    if let Some(location) = req.location {
        machine.location = location;
    }
    if let Some(numbers) = req.directory_numbers {
        machine.directory_numbers = numbers;
    }
    if let Some(phone_book) = req.phone_book {
        machine.phone_book = phone_book;
    }
    machine.updated_at = Utc::now();

    state.machines.save(&machine)?;
    state.freshness.touch();
    Ok(Json(machine))
}

/// Delete a machine and decrement its owner's machine count.
///
/// DELETE /api/machines/:id
pub async fn delete_machine_handler(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> HandlerResult<serde_json::Value> {
    let Some(machine) = state.machines.get(&id)? else {
        return Err(ErrorResponse::not_found("Machine not found"));
    };

    state.machines.delete(&id)?;
    if !machine.username.is_empty() {
        state.users.adjust_machine_count(&machine.username, -1)?;
    }

    tracing::info!(machine_id = %id, "machine deleted");
    ok(json!({ "message": "Machine deleted successfully" }))
}

/// Reset every machine's status to OFFLINE.
///
/// POST /api/machines/reset-status
pub async fn reset_status_handler(
    State(state): State<ServerState>,
) -> HandlerResult<serde_json::Value> {
    let count = state.machines.reset_all_status()?;
    tracing::info!(count, "machine statuses reset");
    ok(json!({
        "message": "All machines status reset to OFFLINE",
        "count": count,
    }))
}

/// Ownership query for directory-number access.
#[derive(Debug, Deserialize)]
pub struct DirectoryNumbersParams {
    pub username: Option<String>,
}

/// Read a machine's directory numbers.
///
/// GET /api/machines/:id/directory-numbers
pub async fn get_directory_numbers_handler(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Query(params): Query<DirectoryNumbersParams>,
) -> HandlerResult<serde_json::Value> {
    let Some(machine) = state.machines.get(&id)? else {
        return Err(ErrorResponse::not_found("Machine not found"));
    };

    if let Some(username) = &params.username {
        if !machine.username.is_empty() && machine.username != *username {
            return Err(ErrorResponse::forbidden(
                "Not authorized to access this machine",
            ));
        }
    }

    ok(json!({ "directoryNumbers": machine.directory_numbers }))
}

/// Directory-numbers payload. `directory_numbers` is validated by hand
/// so a missing or non-list value maps to 400 rather than a serde
/// rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SaveDirectoryNumbersRequest {
    pub directory_numbers: Option<serde_json::Value>,
    pub username: Option<String>,
}

/// Replace a machine's directory numbers.
///
/// POST /api/machines/:id/directory-numbers
pub async fn save_directory_numbers_handler(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(req): Json<SaveDirectoryNumbersRequest>,
) -> HandlerResult<serde_json::Value> {
    let numbers: Vec<String> = match req.directory_numbers.as_ref().and_then(|v| v.as_array()) {
        Some(list) => list
            .iter()
            .filter_map(|value| value.as_str().map(String::from))
            .collect(),
        None => {
            return Err(ErrorResponse::bad_request(
                "directoryNumbers must be an array",
            ));
        }
    };

    let Some(mut machine) = state.machines.get(&id)? else {
        return Err(ErrorResponse::not_found("Machine not found"));
    };

    if let Some(username) = &req.username {
        if !machine.username.is_empty() && machine.username != *username {
            return Err(ErrorResponse::forbidden(
                "Not authorized to update this machine",
            ));
        }
    }

    machine.directory_numbers = numbers;
    machine.updated_at = Utc::now();
    state.machines.save(&machine)?;

    ok(json!({ "message": "Directory numbers saved successfully" }))
}
