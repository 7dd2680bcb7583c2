//! Catalog writes and per-product feedback lists against a real database.

#![allow(clippy::unwrap_used)]

use axum::Router;
use axum::http::{Method, StatusCode};
use serde_json::{Value, json};
use sqlx::PgPool;

use bazaar_core::UserRole;
use bazaar_integration_tests::{TestResponse, app_with_pool, create_user, request, send, sign_in};

async fn admin_app(pool: &PgPool) -> (Router, String) {
    create_user(pool, "admin@example.com", UserRole::Admin).await;
    let app = app_with_pool(pool.clone());
    let cookie = sign_in(&app, "admin@example.com").await;
    (app, cookie)
}

async fn post(app: &Router, cookie: &str, uri: &str, body: &Value) -> TestResponse {
    send(app, request(Method::POST, uri, Some(body), Some(cookie))).await
}

fn id_of(response: &TestResponse) -> i64 {
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    response.json()["id"].as_i64().unwrap()
}

fn tee(category_id: i64, type_id: i64) -> Value {
    json!({
        "name": "Basic Tee",
        "category_id": category_id,
        "type_id": type_id,
        "sizes": [{"size": "M", "price": "19.99", "stock": 3}],
    })
}

#[sqlx::test(migrations = "../api/migrations")]
async fn test_product_type_from_other_category_is_rejected(pool: PgPool) {
    let (app, cookie) = admin_app(&pool).await;
    let shirts = id_of(&post(&app, &cookie, "/api/categories", &json!({"name": "Shirts"})).await);
    let shoes = id_of(&post(&app, &cookie, "/api/categories", &json!({"name": "Shoes"})).await);
    let sneakers = json!({"category_id": shoes, "name": "Sneakers"});
    let sneakers = id_of(&post(&app, &cookie, "/api/types", &sneakers).await);

    let response = post(&app, &cookie, "/api/products", &tee(shirts, sneakers)).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST, "{}", response.body);
    assert_eq!(response.message(), "Type does not belong to the category");

    let product = id_of(&post(&app, &cookie, "/api/products", &tee(shoes, sneakers)).await);
    let uri = format!("/api/products/{product}");
    let body = tee(shirts, sneakers);
    let response = send(&app, request(Method::PUT, &uri, Some(&body), Some(&cookie))).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST, "{}", response.body);
}

#[sqlx::test(migrations = "../api/migrations")]
async fn test_feedback_lists_need_an_existing_product(pool: PgPool) {
    let (app, cookie) = admin_app(&pool).await;
    let shirts = id_of(&post(&app, &cookie, "/api/categories", &json!({"name": "Shirts"})).await);
    let body = json!({
        "name": "Basic Tee",
        "category_id": shirts,
        "sizes": [{"size": "M", "price": "19.99", "stock": 3}],
    });
    let product = id_of(&post(&app, &cookie, "/api/products", &body).await);

    for list in ["reviews", "comments"] {
        let uri = format!("/api/products/{product}/{list}");
        let response = send(&app, request(Method::GET, &uri, None, None)).await;
        assert_eq!(response.status, StatusCode::OK, "{uri}");
        assert_eq!(response.json(), json!([]));

        let uri = format!("/api/products/{}/{list}", product + 1000);
        let response = send(&app, request(Method::GET, &uri, None, None)).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND, "{uri}");
    }
}
