//! Back-office handlers: expenses, analytics and user management.
//!
//! Every handler requires an admin.

use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use bazaar_core::{ExpenseId, UserId, UserRole};

use crate::db::{ExpenseRepository, Pagination, UserRepository};
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::RequireAdmin;
use crate::models::Page;
use crate::models::analytics::{
    AnalyticsSummary, MonthlyRevenue, RevenueQuery, SummaryQuery, TopProduct, TopProductsQuery,
};
use crate::models::expense::{Expense, ExpenseInput, ExpenseQuery};
use crate::models::user::{RoleUpdate, User};
use crate::services::analytics::AnalyticsService;
use crate::state::AppState;

// =============================================================================
// Query / Response Types
// =============================================================================

/// Query parameters for the user list.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct UserQuery {
    pub role: Option<UserRole>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Twelve monthly buckets for one calendar year.
#[derive(Debug, Serialize)]
pub struct RevenueReport {
    pub year: i32,
    pub months: Vec<MonthlyRevenue>,
}

// =============================================================================
// Expenses
// =============================================================================

/// GET /api/admin/expenses?from=&to=
pub async fn list_expenses(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiQuery(query): ApiQuery<ExpenseQuery>,
) -> Result<Json<Vec<Expense>>> {
    query.validate()?;
    let expenses = ExpenseRepository::new(state.pool()).list(query).await?;
    Ok(Json(expenses))
}

/// POST /api/admin/expenses
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn create_expense(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(input): ApiJson<ExpenseInput>,
) -> Result<(StatusCode, Json<Expense>)> {
    let input = input.normalized()?;
    let expense = ExpenseRepository::new(state.pool()).create(&input).await?;
    tracing::info!(expense_id = %expense.id, amount = %expense.amount, "Expense recorded");
    Ok((StatusCode::CREATED, Json(expense)))
}

/// PUT /api/admin/expenses/{id}
pub async fn update_expense(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<ExpenseId>,
    ApiJson(input): ApiJson<ExpenseInput>,
) -> Result<Json<Expense>> {
    let input = input.normalized()?;
    let expense = ExpenseRepository::new(state.pool())
        .update(id, &input)
        .await?;
    Ok(Json(expense))
}

/// DELETE /api/admin/expenses/{id}
pub async fn delete_expense(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<ExpenseId>,
) -> Result<StatusCode> {
    ExpenseRepository::new(state.pool()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Analytics
// =============================================================================

/// Totals for the range compared with the preceding range.
///
/// GET /api/admin/analytics/summary?range=30d
pub async fn summary(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiQuery(query): ApiQuery<SummaryQuery>,
) -> Result<Json<AnalyticsSummary>> {
    let summary = AnalyticsService::new(state.pool(), state.summary_cache())
        .summary(query.range, Utc::now())
        .await?;
    Ok(Json(summary))
}

/// GET /api/admin/analytics/revenue?year=
pub async fn revenue(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiQuery(query): ApiQuery<RevenueQuery>,
) -> Result<Json<RevenueReport>> {
    let (year, months) = AnalyticsService::new(state.pool(), state.summary_cache())
        .monthly_revenue(query.year, Utc::now())
        .await?;
    Ok(Json(RevenueReport { year, months }))
}

/// GET /api/admin/analytics/top-products?limit=
pub async fn top_products(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiQuery(query): ApiQuery<TopProductsQuery>,
) -> Result<Json<Vec<TopProduct>>> {
    let products = AnalyticsService::new(state.pool(), state.summary_cache())
        .top_products(query.limit())
        .await?;
    Ok(Json(products))
}

// =============================================================================
// Users
// =============================================================================

/// GET /api/admin/users?role=&page=&per_page=
pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> Result<Json<Page<User>>> {
    let pagination = Pagination::new(query.page, query.per_page);
    let (users, total) = UserRepository::new(state.pool())
        .list(query.role, pagination)
        .await?;
    Ok(Json(Page::new(users, total, pagination)))
}

/// Promote or demote a user. Admin routes check the stored role on every
/// request, so a demotion also applies to sessions that are already open.
///
/// PUT /api/admin/users/{id}/role
#[instrument(skip(state, admin, update), fields(admin_id = %admin.id, role = ?update.role))]
pub async fn set_role(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<UserId>,
    ApiJson(update): ApiJson<RoleUpdate>,
) -> Result<Json<User>> {
    if id == admin.id && update.role != UserRole::Admin {
        return Err(AppError::BadRequest(
            "You cannot remove your own admin role".to_owned(),
        ));
    }
    let user = UserRepository::new(state.pool())
        .set_role(id, update.role)
        .await?;
    tracing::info!(user_id = %user.id, "User role changed");
    Ok(Json(user))
}
