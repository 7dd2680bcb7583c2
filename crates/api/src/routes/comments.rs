//! Comment reactions and deletion.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use bazaar_core::CommentId;

use crate::db::CommentRepository;
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::RequireAuth;
use crate::models::comment::{ReactionInput, ReactionState};
use crate::state::AppState;

/// Like or dislike. Sending the current reaction again removes it.
///
/// POST /api/comments/{id}/reactions
pub async fn react(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<CommentId>,
    ApiJson(input): ApiJson<ReactionInput>,
) -> Result<Json<ReactionState>> {
    let reaction = CommentRepository::new(state.pool())
        .toggle_reaction(id, user.id, input.kind)
        .await?;
    Ok(Json(reaction))
}

/// Delete a comment and its replies. Author or admin only.
///
/// DELETE /api/comments/{id}
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<CommentId>,
) -> Result<StatusCode> {
    let comments = CommentRepository::new(state.pool());
    let comment = comments.get(id).await?;
    if comment.user_id != user.id && !user.role.is_admin() {
        return Err(AppError::Forbidden(
            "You can only delete your own comment".to_owned(),
        ));
    }
    comments.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
