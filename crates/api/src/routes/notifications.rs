//! In-app notifications (order status changes).

use axum::{Json, extract::State};
use serde::Serialize;

use bazaar_core::NotificationId;

use crate::db::NotificationRepository;
use crate::error::Result;
use crate::extract::{ApiPath, ApiQuery};
use crate::middleware::RequireAuth;
use crate::models::Page;
use crate::models::notification::{Notification, NotificationQuery};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MarkedRead {
    pub updated: u64,
}

/// GET /api/notifications?unread_only=
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiQuery(query): ApiQuery<NotificationQuery>,
) -> Result<Json<Page<Notification>>> {
    let pagination = query.pagination();
    let (notifications, total) = NotificationRepository::new(state.pool())
        .list(user.id, query.unread_only, pagination)
        .await?;
    Ok(Json(Page::new(notifications, total, pagination)))
}

/// POST /api/notifications/{id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<NotificationId>,
) -> Result<Json<Notification>> {
    let notification = NotificationRepository::new(state.pool())
        .mark_read(user.id, id)
        .await?;
    Ok(Json(notification))
}

/// POST /api/notifications/read-all
pub async fn mark_all_read(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<MarkedRead>> {
    let updated = NotificationRepository::new(state.pool())
        .mark_all_read(user.id)
        .await?;
    Ok(Json(MarkedRead { updated }))
}
