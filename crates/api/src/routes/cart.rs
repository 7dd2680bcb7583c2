//! Shopping cart of the logged-in user.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use crate::error::Result;
use crate::extract::ApiJson;
use crate::middleware::RequireAuth;
use crate::models::cart::{CartItemInput, CartItemKey, CartView};
use crate::services::cart::CartService;
use crate::state::AppState;

/// GET /api/cart
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CartView>> {
    let cart = CartService::new(state.pool()).view(user.id).await?;
    Ok(Json(cart))
}

/// Add to an existing line or create one.
///
/// POST /api/cart/items
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(input): ApiJson<CartItemInput>,
) -> Result<Json<CartView>> {
    let cart = CartService::new(state.pool()).add(user.id, &input).await?;
    Ok(Json(cart))
}

/// Set a line's quantity; zero removes it.
///
/// PUT /api/cart/items
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(input): ApiJson<CartItemInput>,
) -> Result<Json<CartView>> {
    let cart = CartService::new(state.pool()).set(user.id, &input).await?;
    Ok(Json(cart))
}

/// DELETE /api/cart/items
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(key): ApiJson<CartItemKey>,
) -> Result<StatusCode> {
    CartService::new(state.pool()).remove(user.id, &key).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/cart
pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<StatusCode> {
    CartService::new(state.pool()).clear(user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
