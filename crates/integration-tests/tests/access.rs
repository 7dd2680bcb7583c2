//! Authorization and input validation across the API.
//!
//! Every case here is decided before the database is touched. Admin cases
//! that get past the role check live in `admin.rs`.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use serde_json::{Value, json};

use bazaar_integration_tests::{
    TestResponse, app, app_with_memory_sessions, customer_cookie, request, send,
};

const PROTECTED: [(Method, &str); 10] = [
    (Method::GET, "/api/auth/me"),
    (Method::GET, "/api/addresses"),
    (Method::GET, "/api/cart"),
    (Method::DELETE, "/api/cart"),
    (Method::GET, "/api/orders/mine"),
    (Method::GET, "/api/orders/1"),
    (Method::GET, "/api/wishlist"),
    (Method::POST, "/api/wishlist/1"),
    (Method::GET, "/api/notifications"),
    (Method::POST, "/api/notifications/read-all"),
];

const ADMIN_ONLY: [(Method, &str); 8] = [
    (Method::GET, "/api/orders"),
    (Method::GET, "/api/admin/expenses"),
    (Method::GET, "/api/admin/analytics/summary"),
    (Method::GET, "/api/admin/analytics/revenue"),
    (Method::GET, "/api/admin/analytics/top-products"),
    (Method::GET, "/api/admin/users"),
    (Method::DELETE, "/api/products/1"),
    (Method::DELETE, "/api/categories/1"),
];

#[tokio::test]
async fn test_anonymous_requests_are_unauthorized() {
    let app = app();
    for (method, uri) in PROTECTED.into_iter().chain(ADMIN_ONLY) {
        let response = send(&app, request(method.clone(), uri, None, None)).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        assert_eq!(response.message(), "Not authenticated");
    }
}

#[tokio::test]
async fn test_customers_cannot_use_admin_routes() {
    let app = app_with_memory_sessions();
    let cookie = customer_cookie(&app).await;

    for (method, uri) in ADMIN_ONLY {
        let response = send(&app, request(method.clone(), uri, None, Some(&cookie))).await;
        assert_eq!(response.status, StatusCode::FORBIDDEN, "{method} {uri}");
        assert_eq!(response.message(), "Admin access required");
    }
}

#[tokio::test]
async fn test_admin_write_checks_role_before_body() {
    let app = app_with_memory_sessions();
    let cookie = customer_cookie(&app).await;

    let response = send(
        &app,
        request(Method::POST, "/api/products", Some(&json!({})), Some(&cookie)),
    )
    .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

async fn post_as_customer(method: Method, uri: &str, body: &Value) -> TestResponse {
    let app = app_with_memory_sessions();
    let cookie = customer_cookie(&app).await;
    send(&app, request(method, uri, Some(body), Some(&cookie))).await
}

fn assert_bad_request(response: &TestResponse, message: &str) {
    assert_eq!(response.status, StatusCode::BAD_REQUEST, "{}", response.body);
    assert_eq!(response.message(), message);
}

#[tokio::test]
async fn test_order_requires_items() {
    let body = json!({"items": [], "shipping_address": null});
    let response = post_as_customer(Method::POST, "/api/orders", &body).await;
    assert_bad_request(&response, "Order must contain at least one item");
}

#[tokio::test]
async fn test_order_rejects_zero_quantity() {
    let body = json!({"items": [{"product_id": 1, "size": "M", "quantity": 0}]});
    let response = post_as_customer(Method::POST, "/api/orders", &body).await;
    assert_bad_request(&response, "Quantity must be at least 1");
}

#[tokio::test]
async fn test_order_requires_address() {
    let body = json!({"items": [{"product_id": 1, "size": "M", "quantity": 2}]});
    let response = post_as_customer(Method::POST, "/api/orders", &body).await;
    assert_bad_request(&response, "A shipping address is required");
}

#[tokio::test]
async fn test_cart_add_rejects_zero_quantity() {
    let body = json!({"product_id": 1, "size": "M", "quantity": 0});
    let response = post_as_customer(Method::POST, "/api/cart/items", &body).await;
    assert_bad_request(&response, "Quantity must be at least 1");
}

#[tokio::test]
async fn test_review_rating_out_of_range() {
    let body = json!({"rating": 6, "content": "Too good"});
    let response = post_as_customer(Method::POST, "/api/products/1/reviews", &body).await;
    assert_bad_request(&response, "Rating must be between 1 and 5");
}

#[tokio::test]
async fn test_non_numeric_id_is_bad_request() {
    let response = send(&app(), request(Method::GET, "/api/products/abc", None, None)).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(!response.message().is_empty());
}
