//! Operation log handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::json;

use fleetlink_core::model::Operation;

use super::ServerState;
use crate::models::{ErrorResponse, HandlerResult, ok};

/// The most recent operations for one machine, newest first.
///
/// GET /api/operations/:id
pub async fn list_operations_handler(
    State(state): State<ServerState>,
    Path(machine_id): Path<String>,
) -> HandlerResult<Vec<Operation>> {
    let operations = state.operations.list_for_machine(&machine_id)?;
    Ok(Json(operations))
}

/// Manual operation-record payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOperationRequest {
    pub machine_id: String,
    #[serde(default)]
    pub fuel_consumption: f64,
    #[serde(default)]
    pub pressure: f64,
    #[serde(default)]
    pub process_time: u64,
    #[serde(default = "default_location")]
    pub location: String,
}

fn default_location() -> String {
    "Unknown".to_string()
}

/// Append an operation record for an existing machine.
///
/// POST /api/operations
pub async fn create_operation_handler(
    State(state): State<ServerState>,
    Json(req): Json<CreateOperationRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ErrorResponse> {
    if state.machines.get(&req.machine_id)?.is_none() {
        return Err(ErrorResponse::not_found("Machine not found"));
    }

    let operation = Operation::new(
        &req.machine_id,
        req.fuel_consumption,
        req.pressure,
        req.process_time,
        req.location,
    );
    state.operations.insert(&operation)?;
    state.freshness.touch();

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Operation record created successfully",
            "operation": operation,
        })),
    ))
}

/// Delete an operation record.
///
/// DELETE /api/operations/:id
pub async fn delete_operation_handler(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> HandlerResult<serde_json::Value> {
    state.operations.delete(&id)?;
    ok(json!({ "message": "Operation deleted successfully" }))
}
