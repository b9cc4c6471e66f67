// ABOUTME: Unauthenticated liveness endpoint
// ABOUTME: Reports service name, version, and whether the database answers

use axum::{extract::State, Json};
use serde_json::{json, Value};
use tracing::warn;

use super::state::AppState;

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let database = match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => "ok",
        Err(e) => {
            warn!(error = %e, "Health check database probe failed");
            "unavailable"
        }
    };

    Json(json!({
        "status": "healthy",
        "timestamp": state.clock.now(),
        "version": env!("CARGO_PKG_VERSION"),
        "service": "rfpdesk-api",
        "database": database,
    }))
}
