//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! # Auth
//! POST /api/auth/register           - Create account and log in
//! POST /api/auth/login              - Log in (rate limited)
//! POST /api/auth/logout             - Log out
//! GET  /api/auth/me                 - Current user
//! PUT  /api/auth/me                 - Update profile
//! PUT  /api/auth/me/password        - Change password
//!
//! # Addresses (auth)
//! GET|POST       /api/addresses
//! GET|PUT|DELETE /api/addresses/{id}
//! POST           /api/addresses/{id}/default
//!
//! # Catalog (reads public, writes admin)
//! GET|POST       /api/categories
//! GET|PUT|DELETE /api/categories/{id}
//! GET|POST       /api/types
//! GET|PUT|DELETE /api/types/{id}
//! GET|POST       /api/products
//! GET|PUT|DELETE /api/products/{id}
//! PUT            /api/products/{id}/promo
//! GET|POST       /api/products/{id}/reviews
//! GET|POST       /api/products/{id}/comments
//! PUT|DELETE     /api/reviews/{id}
//! DELETE         /api/comments/{id}
//! POST           /api/comments/{id}/reactions
//!
//! # Shopping (auth)
//! GET|DELETE            /api/cart
//! POST|PUT|DELETE       /api/cart/items
//! GET|POST              /api/orders            - list is admin only
//! GET                   /api/orders/mine
//! GET                   /api/orders/{id}
//! PUT                   /api/orders/{id}/status - admin
//! GET                   /api/wishlist
//! POST|DELETE           /api/wishlist/{product_id}
//! GET                   /api/notifications
//! POST                  /api/notifications/{id}/read
//! POST                  /api/notifications/read-all
//!
//! # Admin
//! GET|POST   /api/admin/expenses
//! PUT|DELETE /api/admin/expenses/{id}
//! GET        /api/admin/analytics/summary
//! GET        /api/admin/analytics/revenue
//! GET        /api/admin/analytics/top-products
//! GET        /api/admin/users
//! PUT        /api/admin/users/{id}/role
//! ```

pub mod addresses;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod comments;
pub mod notifications;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod wishlist;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Create the auth routes router.
///
/// Login and registration share a strict per-IP rate limit.
pub fn auth_routes() -> Router<AppState> {
    let limited = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(auth_rate_limiter());

    Router::new()
        .merge(limited)
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me).put(auth::update_me))
        .route("/me/password", put(auth::change_password))
}

/// Create the address routes router.
pub fn address_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(addresses::index).post(addresses::create))
        .route(
            "/{id}",
            get(addresses::show)
                .put(addresses::update)
                .delete(addresses::delete),
        )
        .route("/{id}/default", post(addresses::set_default))
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(catalog::list_categories).post(catalog::create_category),
        )
        .route(
            "/{id}",
            get(catalog::show_category)
                .put(catalog::update_category)
                .delete(catalog::delete_category),
        )
}

/// Create the product type routes router.
pub fn type_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(catalog::list_types).post(catalog::create_type))
        .route(
            "/{id}",
            get(catalog::show_type)
                .put(catalog::update_type)
                .delete(catalog::delete_type),
        )
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
        .route("/{id}/promo", put(products::set_promo))
        .route(
            "/{id}/reviews",
            get(products::reviews).post(products::create_review),
        )
        .route(
            "/{id}/comments",
            get(products::comments).post(products::create_comment),
        )
}

/// Create the review routes router.
pub fn review_routes() -> Router<AppState> {
    Router::new().route("/{id}", put(reviews::update).delete(reviews::delete))
}

/// Create the comment routes router.
pub fn comment_routes() -> Router<AppState> {
    Router::new()
        .route("/{id}", axum::routing::delete(comments::delete))
        .route("/{id}/reactions", post(comments::react))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route(
            "/items",
            post(cart::add).put(cart::update).delete(cart::remove),
        )
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index).post(orders::create))
        .route("/mine", get(orders::mine))
        .route("/{id}", get(orders::show))
        .route("/{id}/status", put(orders::update_status))
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::index))
        .route(
            "/{product_id}",
            post(wishlist::add).delete(wishlist::remove),
        )
}

/// Create the notification routes router.
pub fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(notifications::index))
        .route("/read-all", post(notifications::mark_all_read))
        .route("/{id}/read", post(notifications::mark_read))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/expenses",
            get(admin::list_expenses).post(admin::create_expense),
        )
        .route(
            "/expenses/{id}",
            put(admin::update_expense).delete(admin::delete_expense),
        )
        .route("/analytics/summary", get(admin::summary))
        .route("/analytics/revenue", get(admin::revenue))
        .route("/analytics/top-products", get(admin::top_products))
        .route("/users", get(admin::list_users))
        .route("/users/{id}/role", put(admin::set_role))
}

/// Create all `/api` routes.
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .nest("/auth", auth_routes())
        .nest("/addresses", address_routes())
        .nest("/categories", category_routes())
        .nest("/types", type_routes())
        .nest("/products", product_routes())
        .nest("/reviews", review_routes())
        .nest("/comments", comment_routes())
        .nest("/cart", cart_routes())
        .nest("/orders", order_routes())
        .nest("/wishlist", wishlist_routes())
        .nest("/notifications", notification_routes())
        .nest("/admin", admin_routes());

    Router::new().nest("/api", api)
}
