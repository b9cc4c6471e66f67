// ABOUTME: HTTP API layer for RFP Desk providing REST endpoints and routing
// ABOUTME: Integration layer that depends on all domain packages

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod error;
pub mod health;
pub mod notifications_handlers;
pub mod pagination;
pub mod response;
pub mod responses_handlers;
pub mod rfps_handlers;
pub mod snapshot_handlers;
pub mod state;
pub mod tasks_handlers;
pub mod timeline_handlers;

pub use error::{ApiResult, AppError};
pub use state::AppState;

/// Creates the RFP API router
pub fn create_rfps_router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(rfps_handlers::list_rfps).post(rfps_handlers::create_rfp),
        )
        .route(
            "/{id}",
            get(rfps_handlers::get_rfp).put(rfps_handlers::update_rfp),
        )
        .route("/{id}/sla", get(rfps_handlers::get_sla))
        .route("/{id}/stage", post(rfps_handlers::change_stage))
        .route("/{id}/transitions", get(rfps_handlers::list_transitions))
        .route("/{id}/activity", get(rfps_handlers::list_activity))
        // Stage checklist
        .route(
            "/{id}/tasks",
            get(tasks_handlers::list_tasks).post(tasks_handlers::create_task),
        )
        .route("/{id}/tasks/{task_id}", put(tasks_handlers::update_task))
        // Timeline
        .route("/{id}/timeline/tick", post(timeline_handlers::run_tick))
        .route("/{id}/timeline/events", get(timeline_handlers::list_events))
        // Suppliers and responses
        .route(
            "/{id}/suppliers",
            get(responses_handlers::list_suppliers).post(responses_handlers::invite_supplier),
        )
        .route(
            "/{id}/responses",
            get(responses_handlers::list_responses).post(responses_handlers::create_response),
        )
        .route("/{id}/brief", get(snapshot_handlers::get_decision_brief))
}

/// Creates the supplier response API router
pub fn create_responses_router() -> Router<AppState> {
    Router::new()
        .route("/{id}", put(responses_handlers::update_response))
        .route("/{id}/submit", post(responses_handlers::submit_response))
        .route(
            "/{id}/readiness",
            post(responses_handlers::recompute_readiness),
        )
}

/// Creates the notifications API router
pub fn create_notifications_router() -> Router<AppState> {
    Router::new()
        .route("/", get(notifications_handlers::list_notifications))
        .route("/{id}/read", post(notifications_handlers::mark_read))
}

/// Full application router with every endpoint nested under `/api`
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health::health_check))
        .route("/portfolio", get(snapshot_handlers::get_portfolio))
        .nest("/rfps", create_rfps_router())
        .nest("/responses", create_responses_router())
        .nest("/notifications", create_notifications_router());

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
