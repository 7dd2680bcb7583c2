//! Admin routes with real accounts.
//!
//! Each test gets its own database from `#[sqlx::test]`.

#![allow(clippy::unwrap_used)]

use axum::Router;
use axum::http::{Method, StatusCode};
use serde_json::{Value, json};
use sqlx::PgPool;

use bazaar_core::UserRole;
use bazaar_integration_tests::{TestResponse, app_with_pool, create_user, request, send, sign_in};

async fn admin_session(pool: &PgPool) -> (Router, String) {
    create_user(pool, "admin@example.com", UserRole::Admin).await;
    let app = app_with_pool(pool.clone());
    let cookie = sign_in(&app, "admin@example.com").await;
    (app, cookie)
}

async fn send_as_admin(pool: &PgPool, method: Method, uri: &str, body: &Value) -> TestResponse {
    let (app, cookie) = admin_session(pool).await;
    send(&app, request(method, uri, Some(body), Some(&cookie))).await
}

fn assert_bad_request(response: &TestResponse, message: &str) {
    assert_eq!(response.status, StatusCode::BAD_REQUEST, "{}", response.body);
    assert_eq!(response.message(), message);
}

#[sqlx::test(migrations = "../api/migrations")]
async fn test_demoted_admin_loses_access_immediately(pool: PgPool) {
    let demoted = create_user(&pool, "first@example.com", UserRole::Admin).await;
    create_user(&pool, "second@example.com", UserRole::Admin).await;
    let app = app_with_pool(pool.clone());
    let first = sign_in(&app, "first@example.com").await;
    let second = sign_in(&app, "second@example.com").await;

    let response = send(&app, request(Method::GET, "/api/admin/users", None, Some(&first))).await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);

    let uri = format!("/api/admin/users/{}/role", demoted.id);
    let body = json!({"role": "customer"});
    let response = send(&app, request(Method::PUT, &uri, Some(&body), Some(&second))).await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    assert_eq!(response.json()["role"], "customer");

    let response = send(&app, request(Method::GET, "/api/admin/users", None, Some(&first))).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.message(), "Admin access required");

    // Still a valid customer session
    let response = send(&app, request(Method::GET, "/api/auth/me", None, Some(&first))).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[sqlx::test(migrations = "../api/migrations")]
async fn test_admin_cannot_demote_self(pool: PgPool) {
    let (app, cookie) = admin_session(&pool).await;
    let me = send(&app, request(Method::GET, "/api/auth/me", None, Some(&cookie))).await;
    let uri = format!("/api/admin/users/{}/role", me.json()["id"]);

    let body = json!({"role": "customer"});
    let response = send(&app, request(Method::PUT, &uri, Some(&body), Some(&cookie))).await;
    assert_bad_request(&response, "You cannot remove your own admin role");
}

#[sqlx::test(migrations = "../api/migrations")]
async fn test_order_status_must_be_known(pool: PgPool) {
    let body = json!({"status": "teleported"});
    let response = send_as_admin(&pool, Method::PUT, "/api/orders/1/status", &body).await;
    assert_bad_request(&response, "Invalid order status: teleported");
}

#[sqlx::test(migrations = "../api/migrations")]
async fn test_product_requires_sizes(pool: PgPool) {
    let body = json!({"name": "Basic Tee", "category_id": 1, "sizes": []});
    let response = send_as_admin(&pool, Method::POST, "/api/products", &body).await;
    assert_bad_request(&response, "At least one size is required");
}

#[sqlx::test(migrations = "../api/migrations")]
async fn test_product_discount_range(pool: PgPool) {
    let body = json!({
        "name": "Basic Tee",
        "category_id": 1,
        "sizes": [{"size": "M", "price": "19.99", "stock": 3}],
        "discount_percent": 150,
    });
    let response = send_as_admin(&pool, Method::POST, "/api/products", &body).await;
    assert_bad_request(&response, "Discount must be between 1 and 100");
}

#[sqlx::test(migrations = "../api/migrations")]
async fn test_expense_amount_not_negative(pool: PgPool) {
    let body = json!({"title": "Rent", "amount": "-5.00", "spent_on": "2026-03-01"});
    let response = send_as_admin(&pool, Method::POST, "/api/admin/expenses", &body).await;
    assert_bad_request(&response, "Amount must be greater than or equal to 0");
}

#[sqlx::test(migrations = "../api/migrations")]
async fn test_expense_range_must_be_ordered(pool: PgPool) {
    let (app, cookie) = admin_session(&pool).await;
    let uri = "/api/admin/expenses?from=2026-03-02&to=2026-03-01";

    let response = send(&app, request(Method::GET, uri, None, Some(&cookie))).await;
    assert_bad_request(&response, "`from` must not be after `to`");
}
