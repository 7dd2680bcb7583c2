//! Edit and delete individual reviews.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use bazaar_core::ReviewId;

use crate::db::ReviewRepository;
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::RequireAuth;
use crate::models::review::{Review, ReviewInput};
use crate::state::AppState;

/// Authors may edit only their own review.
///
/// PUT /api/reviews/{id}
#[instrument(skip(state, user, input), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<ReviewId>,
    ApiJson(input): ApiJson<ReviewInput>,
) -> Result<Json<Review>> {
    let (rating, content) = input.validated()?;
    let review = ReviewRepository::new(state.pool())
        .update(id, user.id, rating, &content)
        .await?;
    Ok(Json(review))
}

/// The author or an admin may delete a review.
///
/// DELETE /api/reviews/{id}
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<ReviewId>,
) -> Result<StatusCode> {
    let reviews = ReviewRepository::new(state.pool());
    let review = reviews.get(id).await?;
    if review.user_id != user.id && !user.role.is_admin() {
        return Err(AppError::Forbidden(
            "You can only delete your own review".to_owned(),
        ));
    }
    reviews.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
