// ABOUTME: HTTP request handlers for stage checklist tasks
// ABOUTME: Lists, adds, and completes tasks on a buyer's RFP

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tracing::info;

use super::auth::{authorize_rfp, CurrentSession};
use super::error::ApiResult;
use super::response::{created, ok};
use super::state::AppState;
use rfpdesk_auth::Guard;
use rfpdesk_core::Stage;
use rfpdesk_stages::{StageTaskCreateInput, StageTaskUpdateInput};

#[derive(Debug, Default, Deserialize)]
pub struct TaskFilter {
    pub stage: Option<Stage>,
}

/// List tasks for an RFP, optionally for a single stage
pub async fn list_tasks(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(rfp_id): Path<String>,
    Query(filter): Query<TaskFilter>,
) -> ApiResult<impl IntoResponse> {
    authorize_rfp(&state, &session, &rfp_id, Guard::BUYER).await?;
    let tasks = state.stages.list_tasks(&rfp_id, filter.stage).await?;
    Ok(ok(tasks))
}

pub async fn create_task(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(rfp_id): Path<String>,
    payload: Result<Json<StageTaskCreateInput>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    authorize_rfp(&state, &session, &rfp_id, Guard::BUYER).await?;
    let Json(input) = payload?;

    let task = state
        .stages
        .create_task(&rfp_id, input, Some(&session.user_id))
        .await?;
    info!("Created task: {} for rfp: {}", task.id, rfp_id);

    Ok(created(task))
}

pub async fn update_task(
    State(state): State<AppState>,
    session: CurrentSession,
    Path((rfp_id, task_id)): Path<(String, String)>,
    payload: Result<Json<StageTaskUpdateInput>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    authorize_rfp(&state, &session, &rfp_id, Guard::BUYER).await?;
    let Json(input) = payload?;

    let task = state
        .stages
        .update_task(&rfp_id, &task_id, input, Some(&session.user_id))
        .await?;

    Ok(ok(task))
}
