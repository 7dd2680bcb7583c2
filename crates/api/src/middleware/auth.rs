//! Authentication extractors.
//!
//! The logged-in user is stored in the server-side session at login. These
//! extractors read it back and reject with a JSON 401/403.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tower_sessions::Session;
use tracing::warn;

use crate::db::UserRepository;
use crate::error::AppError;
use crate::models::{CurrentUser, session_keys};
use crate::state::AppState;

const NOT_AUTHENTICATED: &str = "Not authenticated";

/// Extractor that requires a logged-in user.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        current_user(parts)
            .await
            .map(Self)
            .ok_or_else(|| AppError::Unauthorized(NOT_AUTHENTICATED.to_owned()))
    }
}

/// Extractor that requires a logged-in admin.
///
/// Rejects with 401 when nobody is logged in and 403 for non-admins. The
/// role is read back from `users` on every request, so a demotion applies
/// to sessions that are already open.
pub struct RequireAdmin(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAdmin
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = current_user(parts)
            .await
            .ok_or_else(|| AppError::Unauthorized(NOT_AUTHENTICATED.to_owned()))?;
        if !user.role.is_admin() {
            return Err(forbidden());
        }

        let state = AppState::from_ref(state);
        let stored = UserRepository::new(state.pool())
            .get_by_id(user.id)
            .await?
            .ok_or_else(|| AppError::Unauthorized(NOT_AUTHENTICATED.to_owned()))?;
        if !stored.role.is_admin() {
            warn!(user_id = %user.id, "Admin session rejected after role change");
            return Err(forbidden());
        }

        Ok(Self(user))
    }
}

fn forbidden() -> AppError {
    AppError::Forbidden("Admin access required".to_owned())
}

async fn current_user(parts: &Parts) -> Option<CurrentUser> {
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

/// Store the user in the session, rotating the session ID.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Destroy the session (logout).
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
