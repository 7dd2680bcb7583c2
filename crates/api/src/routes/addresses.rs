//! Shipping address book of the logged-in user.

use axum::{Json, extract::State, http::StatusCode};

use bazaar_core::AddressId;

use crate::db::AddressRepository;
use crate::error::Result;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::RequireAuth;
use crate::models::address::{Address, AddressInput, NewAddress};
use crate::state::AppState;

/// GET /api/addresses
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Address>>> {
    let addresses = AddressRepository::new(state.pool()).list(user.id).await?;
    Ok(Json(addresses))
}

/// GET /api/addresses/{id}
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<AddressId>,
) -> Result<Json<Address>> {
    let address = AddressRepository::new(state.pool()).get(user.id, id).await?;
    Ok(Json(address))
}

/// Add an address. The first one becomes the default.
///
/// POST /api/addresses
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(body): ApiJson<NewAddress>,
) -> Result<(StatusCode, Json<Address>)> {
    let input = body.address.normalized()?;
    let address = AddressRepository::new(state.pool())
        .create(user.id, &input, body.is_default)
        .await?;
    Ok((StatusCode::CREATED, Json(address)))
}

/// PUT /api/addresses/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<AddressId>,
    ApiJson(body): ApiJson<AddressInput>,
) -> Result<Json<Address>> {
    let input = body.normalized()?;
    let address = AddressRepository::new(state.pool())
        .update(user.id, id, &input)
        .await?;
    Ok(Json(address))
}

/// POST /api/addresses/{id}/default
pub async fn set_default(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<AddressId>,
) -> Result<Json<Address>> {
    let address = AddressRepository::new(state.pool())
        .set_default(user.id, id)
        .await?;
    Ok(Json(address))
}

/// Delete an address, promoting another one if it was the default.
///
/// DELETE /api/addresses/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<AddressId>,
) -> Result<StatusCode> {
    AddressRepository::new(state.pool()).delete(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
