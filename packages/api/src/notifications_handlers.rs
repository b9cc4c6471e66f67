// ABOUTME: HTTP request handlers for the caller's notification inbox
// ABOUTME: Lists the session user's notifications and marks them read

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;

use super::auth::CurrentSession;
use super::error::ApiResult;
use super::response::ok;
use super::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationFilter {
    #[serde(default)]
    pub unread_only: bool,
}

pub async fn list_notifications(
    State(state): State<AppState>,
    session: CurrentSession,
    Query(filter): Query<NotificationFilter>,
) -> ApiResult<impl IntoResponse> {
    let notifications = state
        .notifications
        .list_for_user(&session.user_id, filter.unread_only)
        .await?;
    Ok(ok(notifications))
}

pub async fn mark_read(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(notification_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let notification = state
        .notifications
        .mark_read(&notification_id, &session.user_id)
        .await?;
    Ok(ok(notification))
}
