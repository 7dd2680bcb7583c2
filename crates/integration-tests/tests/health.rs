//! Health checks and request correlation.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use bazaar_integration_tests::{app, request, send};

#[tokio::test]
async fn test_health_is_ok() {
    let response = send(&app(), request(Method::GET, "/health", None, None)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, "ok");
}

#[tokio::test]
async fn test_readiness_without_database() {
    let response = send(&app(), request(Method::GET, "/health/ready", None, None)).await;
    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let mut req = request(Method::GET, "/health", None, None);
    req.headers_mut()
        .insert("x-request-id", "checkout-42".parse().unwrap());

    let response = send(&app(), req).await;
    assert_eq!(response.headers.get("x-request-id").unwrap(), "checkout-42");
}

#[tokio::test]
async fn test_request_id_is_generated() {
    let response = send(&app(), request(Method::GET, "/health", None, None)).await;
    let id = response.headers.get("x-request-id").unwrap().to_str().unwrap();
    assert_eq!(id.len(), 36);
}

#[tokio::test]
async fn test_oversized_request_id_is_replaced() {
    let mut req = request(Method::GET, "/health", None, None);
    req.headers_mut()
        .insert("x-request-id", "x".repeat(200).parse().unwrap());

    let response = send(&app(), req).await;
    let id = response.headers.get("x-request-id").unwrap().to_str().unwrap();
    assert_eq!(id.len(), 36);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let response = send(&app(), request(Method::GET, "/api/nope", None, None)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
