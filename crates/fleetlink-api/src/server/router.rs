//! Application router configuration.

use axum::{
    Router,
    routing::{delete, get, patch, post},
};
use tower_http::cors::CorsLayer;

use super::state::ServerState;

/// Create the application router with a specific state.
pub fn create_router_with_state(state: ServerState) -> Router {
    use crate::handlers::{basic, device, machines, operations, users};

    Router::new()
        // Health / freshness
        .route("/api/status", get(basic::status_handler))
        .route("/api/lastUpdate", get(basic::last_update_handler))
        // Device polling channel
        .route(
            "/api/esp32data",
            post(device::receive_report_handler).get(device::poll_commands_handler),
        )
        .route("/api/getStatus/:id", post(device::request_status_handler))
        // Machines
        .route(
            "/api/machines",
            get(machines::list_machines_handler).post(machines::create_machine_handler),
        )
        .route(
            "/api/machines/reset-status",
            post(machines::reset_status_handler),
        )
        .route(
            "/api/machines/:id",
            patch(machines::update_machine_handler).delete(machines::delete_machine_handler),
        )
        .route(
            "/api/machines/:id/directory-numbers",
            get(machines::get_directory_numbers_handler)
                .post(machines::save_directory_numbers_handler),
        )
        // Operation logs
        .route("/api/operations", post(operations::create_operation_handler))
        .route(
            "/api/operations/:id",
            get(operations::list_operations_handler)
                .delete(operations::delete_operation_handler),
        )
        // Users
        .route(
            "/api/users",
            get(users::list_users_handler).post(users::create_user_handler),
        )
        .route("/api/users/:id", delete(users::delete_user_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
