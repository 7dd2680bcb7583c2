//! Product catalog handlers, including per-product reviews and comments.

use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use tracing::instrument;

use bazaar_core::{ProductId, PromoWindow};

use crate::db::{CommentRepository, ProductRepository, ReviewRepository};
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::Page;
use crate::models::comment::{CommentInput, CommentRow, CommentThread, build_threads};
use crate::models::product::{ProductInput, ProductQuery, ProductView, PromoInput};
use crate::models::review::{Review, ReviewInput};
use crate::state::AppState;

// =============================================================================
// Catalog
// =============================================================================

/// Public listing with filters, search and sort.
///
/// GET /api/products
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ProductQuery>,
) -> Result<Json<Page<ProductView>>> {
    let (products, total, pagination) = ProductRepository::new(state.pool())
        .list(&query, Utc::now())
        .await?;
    Ok(Json(Page::new(products, total, pagination)))
}

/// GET /api/products/{id}
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<ProductView>> {
    let product = ProductRepository::new(state.pool())
        .get(id, Utc::now())
        .await?;
    Ok(Json(product))
}

/// POST /api/products
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<(StatusCode, Json<ProductView>)> {
    let input = input.normalized()?;
    let product = ProductRepository::new(state.pool())
        .create(&input, Utc::now())
        .await?;
    tracing::info!(product_id = %product.id, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// Replace a product, including its sizes.
///
/// PUT /api/products/{id}
#[instrument(skip(state, admin, input), fields(admin_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<Json<ProductView>> {
    let input = input.normalized()?;
    let product = ProductRepository::new(state.pool())
        .update(id, &input, Utc::now())
        .await?;
    Ok(Json(product))
}

/// Set or clear the promo window.
///
/// PUT /api/products/{id}/promo
pub async fn set_promo(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(input): ApiJson<PromoInput>,
) -> Result<Json<ProductView>> {
    let promo = PromoWindow::from(input);
    promo.validate()?;
    let product = ProductRepository::new(state.pool())
        .set_promo(id, &promo, Utc::now())
        .await?;
    Ok(Json(product))
}

/// DELETE /api/products/{id}
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<StatusCode> {
    ProductRepository::new(state.pool()).delete(id).await?;
    tracing::info!("Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Reviews
// =============================================================================

/// GET /api/products/{id}/reviews
pub async fn reviews(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Vec<Review>>> {
    ProductRepository::new(state.pool()).ensure_exists(id).await?;
    let reviews = ReviewRepository::new(state.pool()).list(id).await?;
    Ok(Json(reviews))
}

/// One review per user per product.
///
/// POST /api/products/{id}/reviews
#[instrument(skip(state, user, input), fields(user_id = %user.id))]
pub async fn create_review(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(input): ApiJson<ReviewInput>,
) -> Result<(StatusCode, Json<Review>)> {
    let (rating, content) = input.validated()?;
    let review = ReviewRepository::new(state.pool())
        .create(id, user.id, rating, &content)
        .await?;
    Ok((StatusCode::CREATED, Json(review)))
}

// =============================================================================
// Comments
// =============================================================================

/// Threaded comments, oldest first.
///
/// GET /api/products/{id}/comments
pub async fn comments(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Vec<CommentThread>>> {
    ProductRepository::new(state.pool()).ensure_exists(id).await?;
    let rows = CommentRepository::new(state.pool()).list(id).await?;
    Ok(Json(build_threads(rows)))
}

/// Post a comment or a reply to a top-level comment of the same product.
///
/// POST /api/products/{id}/comments
#[instrument(skip(state, user, input), fields(user_id = %user.id))]
pub async fn create_comment(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(input): ApiJson<CommentInput>,
) -> Result<(StatusCode, Json<CommentRow>)> {
    let content = input.content()?;
    let comments = CommentRepository::new(state.pool());

    if let Some(parent_id) = input.parent_id {
        let parent = comments.get(parent_id).await?;
        if parent.product_id != id || parent.parent_id.is_some() {
            return Err(AppError::BadRequest("Invalid parent comment".to_owned()));
        }
    }

    let comment = comments
        .create(id, user.id, input.parent_id, &content)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}
