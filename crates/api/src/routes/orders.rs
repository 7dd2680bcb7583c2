//! Checkout and order tracking.

use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use tracing::instrument;

use bazaar_core::OrderId;

use crate::db::OrderRepository;
use crate::error::{Result, add_breadcrumb};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::Page;
use crate::models::order::{CreateOrderInput, Order, OrderQuery, StatusUpdate};
use crate::services::orders::OrderService;
use crate::state::AppState;

/// Place an order, reserving stock and clearing the ordered cart lines.
///
/// POST /api/orders
#[instrument(skip(state, user, input), fields(user_id = %user.id, lines = input.items.len()))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(input): ApiJson<CreateOrderInput>,
) -> Result<(StatusCode, Json<Order>)> {
    add_breadcrumb("checkout", "Placing order", None);
    let order = OrderService::new(state.pool())
        .place(&user, &input, state.config().shipping, Utc::now())
        .await?;
    add_breadcrumb("checkout", "Order placed", Some(&[("code", order.code.as_str())]));
    Ok((StatusCode::CREATED, Json(order)))
}

/// The logged-in user's orders, newest first.
///
/// GET /api/orders/mine
pub async fn mine(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiQuery(query): ApiQuery<OrderQuery>,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id, query.status)
        .await?;
    Ok(Json(orders))
}

/// Visible to the owner and to admins; 404 for everyone else.
///
/// GET /api/orders/{id}
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<Order>> {
    let order = OrderService::new(state.pool()).get_for(&user, id).await?;
    Ok(Json(order))
}

/// All orders, paginated.
///
/// GET /api/orders
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiQuery(query): ApiQuery<OrderQuery>,
) -> Result<Json<Page<Order>>> {
    let pagination = query.pagination();
    let (orders, total) = OrderRepository::new(state.pool())
        .list(query.status, pagination)
        .await?;
    Ok(Json(Page::new(orders, total, pagination)))
}

/// Move an order forward and notify its owner.
///
/// PUT /api/orders/{id}/status
#[instrument(skip(state, admin, update), fields(admin_id = %admin.id, status = %update.status))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<OrderId>,
    ApiJson(update): ApiJson<StatusUpdate>,
) -> Result<Json<Order>> {
    let order = OrderService::new(state.pool())
        .update_status(id, &update.status)
        .await?;
    Ok(Json(order))
}
