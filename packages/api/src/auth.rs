// ABOUTME: Authentication context for API requests
// ABOUTME: Resolves the bearer token to a session and authorizes access to RFPs and responses

use std::ops::Deref;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use super::error::{ApiResult, AppError};
use super::state::AppState;
use rfpdesk_auth::{Guard, Scope, Session};
use rfpdesk_core::Role;
use rfpdesk_rfps::Rfp;
use rfpdesk_scoring::SupplierResponse;

/// Session of the authenticated caller
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Session);

impl Deref for CurrentSession {
    type Target = Session;

    fn deref(&self) -> &Session {
        &self.0
    }
}

impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AppError::Unauthenticated)?;

        let session = state.sessions.authenticate(token, state.clock.now()).await?;
        Ok(Self(session))
    }
}

/// Load an RFP and check that `session` passes `guard` for it. Suppliers
/// must be invited to the RFP; buyers must own it.
pub async fn authorize_rfp(
    state: &AppState,
    session: &Session,
    rfp_id: &str,
    guard: Guard,
) -> ApiResult<Rfp> {
    let rfp = state.rfps.get_rfp(rfp_id).await?;
    let invited = match session.role {
        Role::Supplier => state.contacts().invited_companies(rfp_id).await?,
        Role::Buyer => Vec::new(),
    };

    guard.authorize(
        session,
        Scope::Rfp {
            company_id: &rfp.company_id,
            invited_companies: &invited,
        },
    )?;
    Ok(rfp)
}

/// Load a response and its RFP. A supplier may only reach responses filed
/// through one of its own company's contacts.
pub async fn authorize_response(
    state: &AppState,
    session: &Session,
    response_id: &str,
    guard: Guard,
) -> ApiResult<(Rfp, SupplierResponse)> {
    let response = state.responses.get_response(response_id).await?;
    let rfp = authorize_rfp(state, session, &response.rfp_id, guard).await?;

    if session.role == Role::Supplier {
        let contact = state
            .contacts()
            .get_contact(&response.supplier_contact_id)
            .await?;
        if contact.supplier_company_id.as_deref() != Some(session.company_id.as_str()) {
            return Err(AppError::forbidden("response belongs to another supplier"));
        }
    }

    Ok((rfp, response))
}
