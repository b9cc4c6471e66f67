// ABOUTME: HTTP request handlers for supplier invitations and supplier responses
// ABOUTME: Buyers invite and rescore; suppliers draft and submit through their own contacts

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tracing::info;

use super::auth::{authorize_response, authorize_rfp, CurrentSession};
use super::error::{ApiResult, AppError};
use super::response::{created, ok};
use super::state::AppState;
use rfpdesk_auth::Guard;
use rfpdesk_core::Role;
use rfpdesk_scoring::{ContactInviteInput, ResponseInput};

pub async fn list_suppliers(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(rfp_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    authorize_rfp(&state, &session, &rfp_id, Guard::BUYER).await?;
    let contacts = state.responses.list_contacts(&rfp_id).await?;
    Ok(ok(contacts))
}

pub async fn invite_supplier(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(rfp_id): Path<String>,
    payload: Result<Json<ContactInviteInput>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let rfp = authorize_rfp(&state, &session, &rfp_id, Guard::BUYER).await?;
    let Json(input) = payload?;

    let contact = state
        .responses
        .invite_supplier(&rfp_id, input, Some(&session.user_id))
        .await?;
    state.snapshots.invalidate_rfp(&rfp_id, &rfp.company_id).await;

    Ok(created(contact))
}

/// Buyers see every response; suppliers see those of their own company
pub async fn list_responses(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(rfp_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    authorize_rfp(&state, &session, &rfp_id, Guard::MEMBER).await?;
    let mut responses = state.responses.list_responses(&rfp_id).await?;

    if session.role == Role::Supplier {
        let own: Vec<String> = state
            .contacts()
            .list_for_company(&rfp_id, &session.company_id)
            .await?
            .into_iter()
            .map(|contact| contact.id)
            .collect();
        responses.retain(|response| own.contains(&response.supplier_contact_id));
    }

    Ok(ok(responses))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResponseRequest {
    pub contact_id: String,
    #[serde(flatten)]
    pub input: ResponseInput,
}

pub async fn create_response(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(rfp_id): Path<String>,
    payload: Result<Json<CreateResponseRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let rfp = authorize_rfp(&state, &session, &rfp_id, Guard::SUPPLIER).await?;
    let Json(request) = payload?;

    let contact = state.contacts().get_contact(&request.contact_id).await?;
    if contact.supplier_company_id.as_deref() != Some(session.company_id.as_str()) {
        return Err(AppError::forbidden("contact belongs to another supplier"));
    }

    let response = state
        .responses
        .create_response(&rfp_id, &contact.id, request.input)
        .await?;
    info!("Created response: {} for rfp: {}", response.id, rfp_id);
    state.snapshots.invalidate_rfp(&rfp_id, &rfp.company_id).await;

    Ok(created(response))
}

pub async fn update_response(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(response_id): Path<String>,
    payload: Result<Json<ResponseInput>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let (rfp, _) = authorize_response(&state, &session, &response_id, Guard::SUPPLIER).await?;
    let Json(input) = payload?;

    let response = state.responses.update_response(&response_id, input).await?;
    state.snapshots.invalidate_rfp(&rfp.id, &rfp.company_id).await;

    Ok(ok(response))
}

pub async fn submit_response(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(response_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let (rfp, _) = authorize_response(&state, &session, &response_id, Guard::SUPPLIER).await?;

    let response = state
        .responses
        .submit_response(&response_id, Some(&session.user_id))
        .await?;
    info!("Submitted response: {} for rfp: {}", response.id, rfp.id);
    state.snapshots.invalidate_rfp(&rfp.id, &rfp.company_id).await;

    Ok(ok(response))
}

/// Recompute a response's readiness from its stored inputs
pub async fn recompute_readiness(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(response_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let (rfp, _) = authorize_response(&state, &session, &response_id, Guard::BUYER).await?;

    let response = state.responses.update_response_readiness(&response_id).await?;
    state.snapshots.invalidate_rfp(&rfp.id, &rfp.company_id).await;

    Ok(ok(response))
}
