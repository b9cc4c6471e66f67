// ABOUTME: HTTP request handlers for RFP records, SLA status, and stage moves
// ABOUTME: Buyers manage their company's RFPs; invited suppliers get read access

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use super::auth::{authorize_rfp, CurrentSession};
use super::error::{ApiResult, AppError};
use super::pagination::{PaginatedResponse, PaginationParams};
use super::response::{created, ok};
use super::state::AppState;
use rfpdesk_activity::{ActivityKind, NewActivity};
use rfpdesk_auth::{Guard, Scope};
use rfpdesk_core::{Role, Stage};
use rfpdesk_rfps::{RfpCreateInput, RfpUpdateInput};
use rfpdesk_stages::{allowed_next_stages, sla_report_for, validate_stage_transition, TransitionContext};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RfpListFilter {
    #[serde(default)]
    pub include_archived: bool,
}

/// List the RFPs visible to the caller
pub async fn list_rfps(
    State(state): State<AppState>,
    session: CurrentSession,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<RfpListFilter>,
) -> ApiResult<impl IntoResponse> {
    info!(
        "Listing rfps for company: {} (page: {})",
        session.company_id,
        pagination.page()
    );

    let limit = Some(pagination.limit());
    let offset = Some(pagination.offset());
    let (rfps, total) = match session.role {
        Role::Buyer => {
            state
                .rfps
                .list_rfps_paginated(&session.company_id, filter.include_archived, limit, offset)
                .await?
        }
        Role::Supplier => {
            state
                .rfps
                .list_invited_rfps_paginated(&session.company_id, limit, offset)
                .await?
        }
    };

    Ok(ok(PaginatedResponse::new(rfps, &pagination, total)))
}

pub async fn create_rfp(
    State(state): State<AppState>,
    session: CurrentSession,
    payload: Result<Json<RfpCreateInput>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    Guard::BUYER.authorize(&session, Scope::Company(&session.company_id))?;
    let Json(input) = payload?;

    let outcome = state
        .stages
        .create_rfp(&session.company_id, &session.user_id, input)
        .await?;
    state.snapshots.invalidate_company(&outcome.rfp.company_id).await;

    Ok(created(outcome.rfp))
}

pub async fn get_rfp(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(rfp_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let rfp = authorize_rfp(&state, &session, &rfp_id, Guard::MEMBER).await?;
    Ok(ok(rfp))
}

/// Request body for updating an RFP. Without `expectedVersion` the update
/// applies over whatever version is current.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRfpRequest {
    pub expected_version: Option<i64>,
    #[serde(flatten)]
    pub input: RfpUpdateInput,
}

pub async fn update_rfp(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(rfp_id): Path<String>,
    payload: Result<Json<UpdateRfpRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let rfp = authorize_rfp(&state, &session, &rfp_id, Guard::BUYER).await?;
    if rfp.is_read_only() {
        return Err(AppError::ArchivedReadOnly(rfp.id));
    }
    let Json(request) = payload?;

    let expected_version = request.expected_version.unwrap_or(rfp.version);
    let updated = state
        .rfps
        .update_rfp(&rfp_id, expected_version, request.input, state.clock.now())
        .await?;
    info!("Updated rfp: {} (version {})", updated.id, updated.version);

    state
        .activity
        .record(
            NewActivity::for_rfp(&rfp_id, Some(&session.user_id), ActivityKind::RfpUpdated)
                .with_payload(json!({ "version": updated.version })),
        )
        .await;
    state
        .snapshots
        .invalidate_rfp(&rfp_id, &updated.company_id)
        .await;

    Ok(ok(updated))
}

pub async fn get_sla(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(rfp_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let rfp = authorize_rfp(&state, &session, &rfp_id, Guard::MEMBER).await?;
    Ok(ok(sla_report_for(&rfp, state.clock.now())))
}

#[derive(Debug, Deserialize)]
pub struct ChangeStageRequest {
    pub stage: Stage,
}

pub async fn change_stage(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(rfp_id): Path<String>,
    payload: Result<Json<ChangeStageRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let rfp = authorize_rfp(&state, &session, &rfp_id, Guard::BUYER).await?;
    let Json(request) = payload?;

    let outcome = state
        .stages
        .transition(&rfp_id, request.stage, Some(&session.user_id))
        .await?;
    state.snapshots.invalidate_rfp(&rfp_id, &rfp.company_id).await;

    Ok(ok(outcome))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionOption {
    pub stage: Stage,
    pub valid: bool,
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionOptions {
    pub current: Stage,
    pub options: Vec<TransitionOption>,
}

/// The stages reachable from the current one, each with its guard verdict
pub async fn list_transitions(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(rfp_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let rfp = authorize_rfp(&state, &session, &rfp_id, Guard::BUYER).await?;
    let ctx = TransitionContext::for_rfp(&rfp, state.clock.now());

    let options = allowed_next_stages(rfp.stage)
        .into_iter()
        .map(|stage| {
            let decision = validate_stage_transition(rfp.stage, stage, &ctx);
            TransitionOption {
                stage,
                valid: decision.valid,
                reason: decision.reason,
            }
        })
        .collect();

    Ok(ok(TransitionOptions {
        current: rfp.stage,
        options,
    }))
}

pub async fn list_activity(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(rfp_id): Path<String>,
    Query(pagination): Query<PaginationParams>,
) -> ApiResult<impl IntoResponse> {
    authorize_rfp(&state, &session, &rfp_id, Guard::BUYER).await?;

    let (events, total) = state
        .activity_log
        .list_for_rfp_paginated(&rfp_id, Some(pagination.limit()), Some(pagination.offset()))
        .await?;

    Ok(ok(PaginatedResponse::new(events, &pagination, total)))
}
