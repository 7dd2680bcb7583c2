//! Wishlist of the logged-in user.

use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;

use bazaar_core::ProductId;

use crate::db::{ProductRepository, WishlistRepository};
use crate::error::Result;
use crate::extract::ApiPath;
use crate::middleware::RequireAuth;
use crate::models::product::ProductView;
use crate::state::AppState;

/// Wishlisted products, most recently added first.
///
/// GET /api/wishlist
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<ProductView>>> {
    let ids = WishlistRepository::new(state.pool())
        .product_ids(user.id)
        .await?;
    let products = ProductRepository::new(state.pool())
        .get_many(&ids, Utc::now())
        .await?;
    Ok(Json(products))
}

/// Adding twice is a no-op.
///
/// POST /api/wishlist/{product_id}
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(product_id): ApiPath<ProductId>,
) -> Result<StatusCode> {
    WishlistRepository::new(state.pool())
        .add(user.id, product_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/wishlist/{product_id}
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(product_id): ApiPath<ProductId>,
) -> Result<StatusCode> {
    WishlistRepository::new(state.pool())
        .remove(user.id, product_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
