//! Authentication route handlers.
//!
//! Registration, login and logout plus the logged-in user's own profile.

use axum::{extract::State, http::StatusCode, Json};
use tower_sessions::Session;
use tracing::instrument;

use bazaar_core::UserRole;

use crate::db::UserRepository;
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::extract::ApiJson;
use crate::middleware::{RequireAuth, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::models::user::{ChangePasswordRequest, LoginRequest, ProfileUpdate, RegisterRequest, User};
use crate::services::auth::AuthService;
use crate::state::AppState;

fn session_error(e: &tower_sessions::session::Error) -> AppError {
    AppError::Internal(format!("session error: {e}"))
}

async fn start_session(session: &Session, user: &User) -> Result<()> {
    set_current_user(session, &CurrentUser::from(user))
        .await
        .map_err(|e| session_error(&e))?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}

/// Create a customer account and log it in.
///
/// POST /api/auth/register
#[instrument(skip(state, session, req), fields(email = %req.email))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<User>)> {
    let user = AuthService::new(state.pool())
        .register(&req.name, &req.email, &req.password, UserRole::Customer)
        .await?;
    start_session(&session, &user).await?;

    tracing::info!(user_id = %user.id, "User registered");
    Ok((StatusCode::CREATED, Json(user)))
}

/// Log in with email and password.
///
/// POST /api/auth/login
#[instrument(skip(state, session, req), fields(email = %req.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<User>> {
    let user = AuthService::new(state.pool())
        .login(&req.email, &req.password)
        .await
        .inspect_err(|e| tracing::warn!("Login failed: {e}"))?;
    start_session(&session, &user).await?;

    Ok(Json(user))
}

/// Destroy the session.
///
/// POST /api/auth/logout
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_user(&session)
        .await
        .map_err(|e| session_error(&e))?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// The logged-in user.
///
/// GET /api/auth/me
#[instrument(skip(state, current), fields(user_id = %current.id))]
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<User>> {
    let users = UserRepository::new(state.pool());
    users.touch_last_active(current.id).await?;
    let user = users
        .get_by_id(current.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Not authenticated".to_owned()))?;
    Ok(Json(user))
}

/// Update name, phone or avatar.
///
/// PUT /api/auth/me
#[instrument(skip(state, session, current, update), fields(user_id = %current.id))]
pub async fn update_me(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(current): RequireAuth,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> Result<Json<User>> {
    let update = update.normalized()?;
    let user = UserRepository::new(state.pool())
        .update_profile(current.id, &update)
        .await?;

    // Keep the session copy of the display name current
    set_current_user(&session, &CurrentUser::from(&user))
        .await
        .map_err(|e| session_error(&e))?;
    Ok(Json(user))
}

/// Change the password after checking the current one.
///
/// PUT /api/auth/me/password
#[instrument(skip(state, current, req), fields(user_id = %current.id))]
pub async fn change_password(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    ApiJson(req): ApiJson<ChangePasswordRequest>,
) -> Result<StatusCode> {
    AuthService::new(state.pool())
        .change_password(current.id, &req.current_password, &req.new_password)
        .await?;
    tracing::info!("Password changed");
    Ok(StatusCode::NO_CONTENT)
}
