//! Categories and product types.
//!
//! Reads are public; writes require an admin.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use bazaar_core::{CategoryId, ProductTypeId};

use crate::db::CatalogRepository;
use crate::error::Result;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::RequireAdmin;
use crate::models::catalog::{Category, CategoryInput, ProductType, ProductTypeInput, ProductTypeQuery};
use crate::models::required_text;
use crate::state::AppState;

// =============================================================================
// Categories
// =============================================================================

/// GET /api/categories
pub async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    let categories = CatalogRepository::new(state.pool()).list_categories().await?;
    Ok(Json(categories))
}

/// GET /api/categories/{id}
pub async fn show_category(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<CategoryId>,
) -> Result<Json<Category>> {
    let category = CatalogRepository::new(state.pool()).get_category(id).await?;
    Ok(Json(category))
}

/// POST /api/categories
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn create_category(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(input): ApiJson<CategoryInput>,
) -> Result<(StatusCode, Json<Category>)> {
    let input = input.normalized()?;
    let category = CatalogRepository::new(state.pool())
        .create_category(&input)
        .await?;
    tracing::info!(category_id = %category.id, "Category created");
    Ok((StatusCode::CREATED, Json(category)))
}

/// PUT /api/categories/{id}
pub async fn update_category(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<CategoryId>,
    ApiJson(input): ApiJson<CategoryInput>,
) -> Result<Json<Category>> {
    let input = input.normalized()?;
    let category = CatalogRepository::new(state.pool())
        .update_category(id, &input)
        .await?;
    Ok(Json(category))
}

/// Delete a category. Fails while products still reference it.
///
/// DELETE /api/categories/{id}
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete_category(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<CategoryId>,
) -> Result<StatusCode> {
    CatalogRepository::new(state.pool()).delete_category(id).await?;
    tracing::info!("Category deleted");
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Product types
// =============================================================================

/// GET /api/types?category=
pub async fn list_types(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ProductTypeQuery>,
) -> Result<Json<Vec<ProductType>>> {
    let types = CatalogRepository::new(state.pool())
        .list_types(query.category)
        .await?;
    Ok(Json(types))
}

/// GET /api/types/{id}
pub async fn show_type(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductTypeId>,
) -> Result<Json<ProductType>> {
    let product_type = CatalogRepository::new(state.pool()).get_type(id).await?;
    Ok(Json(product_type))
}

/// POST /api/types
pub async fn create_type(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiJson(input): ApiJson<ProductTypeInput>,
) -> Result<(StatusCode, Json<ProductType>)> {
    let name = required_text(&input.name, "Name")?;
    let product_type = CatalogRepository::new(state.pool())
        .create_type(input.category_id, &name)
        .await?;
    Ok((StatusCode::CREATED, Json(product_type)))
}

/// PUT /api/types/{id}
pub async fn update_type(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<ProductTypeId>,
    ApiJson(input): ApiJson<ProductTypeInput>,
) -> Result<Json<ProductType>> {
    let name = required_text(&input.name, "Name")?;
    let product_type = CatalogRepository::new(state.pool())
        .update_type(id, input.category_id, &name)
        .await?;
    Ok(Json(product_type))
}

/// DELETE /api/types/{id}
pub async fn delete_type(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<ProductTypeId>,
) -> Result<StatusCode> {
    CatalogRepository::new(state.pool()).delete_type(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
