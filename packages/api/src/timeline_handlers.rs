// ABOUTME: HTTP request handlers for timeline ticks and the timeline event log
// ABOUTME: A dry run reports the due actions without writing anything

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tracing::info;

use super::auth::{authorize_rfp, CurrentSession};
use super::error::ApiResult;
use super::pagination::{PaginatedResponse, PaginationParams};
use super::response::ok;
use super::state::AppState;
use rfpdesk_auth::Guard;
use rfpdesk_timeline::TickOptions;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickRequest {
    #[serde(default)]
    pub dry_run: bool,
}

pub async fn run_tick(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(rfp_id): Path<String>,
    payload: Result<Json<TickRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let rfp = authorize_rfp(&state, &session, &rfp_id, Guard::BUYER).await?;
    let Json(request) = payload?;

    let outcome = state
        .timeline
        .run_rfp_timeline_tick(
            &rfp_id,
            TickOptions {
                dry_run: request.dry_run,
                triggered_by_user_id: Some(session.user_id.clone()),
            },
        )
        .await?;
    info!(
        "Timeline tick for rfp: {} (dry run: {}, actions: {})",
        rfp_id,
        outcome.dry_run,
        outcome.actions_applied.len()
    );

    if !outcome.dry_run {
        state.snapshots.invalidate_rfp(&rfp_id, &rfp.company_id).await;
    }

    Ok(ok(outcome))
}

pub async fn list_events(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(rfp_id): Path<String>,
    Query(pagination): Query<PaginationParams>,
) -> ApiResult<impl IntoResponse> {
    authorize_rfp(&state, &session, &rfp_id, Guard::BUYER).await?;

    let (events, total) = state
        .timeline
        .list_events(&rfp_id, Some(pagination.limit()), Some(pagination.offset()))
        .await?;

    Ok(ok(PaginatedResponse::new(events, &pagination, total)))
}
