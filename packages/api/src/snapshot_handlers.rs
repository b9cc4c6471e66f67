// ABOUTME: HTTP request handlers for the cached portfolio and decision brief read models
// ABOUTME: Responses carry when the snapshot was generated and whether it came from cache

use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::auth::{authorize_rfp, CurrentSession};
use super::error::ApiResult;
use super::response::ok;
use super::state::AppState;
use rfpdesk_auth::{Guard, Scope};
use rfpdesk_snapshots::Cached;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotBody<T> {
    pub snapshot: T,
    pub generated_at: DateTime<Utc>,
    pub from_cache: bool,
}

impl<T: Clone> From<Cached<T>> for SnapshotBody<T> {
    fn from(cached: Cached<T>) -> Self {
        Self {
            snapshot: (*cached.value).clone(),
            generated_at: cached.generated_at,
            from_cache: cached.from_cache,
        }
    }
}

pub async fn get_portfolio(
    State(state): State<AppState>,
    session: CurrentSession,
) -> ApiResult<impl IntoResponse> {
    Guard::BUYER.authorize(&session, Scope::Company(&session.company_id))?;
    let portfolio = state.snapshots.portfolio(&session.company_id).await?;
    Ok(ok(SnapshotBody::from(portfolio)))
}

pub async fn get_decision_brief(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(rfp_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    authorize_rfp(&state, &session, &rfp_id, Guard::BUYER).await?;
    let brief = state.snapshots.decision_brief(&rfp_id).await?;
    Ok(ok(SnapshotBody::from(brief)))
}
