//! Admin user management commands.
//!
//! # Usage
//!
//! ```bash
//! # Create a new admin account
//! bazaar admin create -e admin@example.com -n "Admin Name" --password '...'
//!
//! # Promote an existing customer
//! bazaar admin promote -e someone@example.com
//! ```

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use bazaar_api::db::UserRepository;
use bazaar_api::db::RepositoryError;
use bazaar_api::services::auth::{AuthError, AuthService};
use bazaar_core::{Email, UserRole};

use super::{ConnectError, connect};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// Registration failed (invalid email, weak password, duplicate).
    #[error("{0}")]
    Auth(#[from] AuthError),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// No account with that email.
    #[error("No user with email: {0}")]
    UnknownUser(String),
}

/// Create a new admin user.
///
/// # Errors
///
/// Returns `AdminError` if validation fails, the email is taken or the
/// database is unreachable.
pub async fn create_user(
    email: &str,
    name: &str,
    password: &SecretString,
) -> Result<(), AdminError> {
    let pool = connect().await?;

    tracing::info!("Creating admin user: {email}");
    let user = AuthService::new(&pool)
        .register(name, email, password.expose_secret(), UserRole::Admin)
        .await?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );
    Ok(())
}

/// Promote an existing user to admin.
///
/// # Errors
///
/// Returns `AdminError::UnknownUser` if no account has this email.
pub async fn promote(email: &str) -> Result<(), AdminError> {
    let email = Email::parse(email).map_err(|_| AdminError::InvalidEmail(email.to_owned()))?;
    let pool = connect().await?;
    let users = UserRepository::new(&pool);

    let record = users
        .get_with_password(&email)
        .await?
        .ok_or_else(|| AdminError::UnknownUser(email.to_string()))?;
    if record.user.role.is_admin() {
        tracing::info!("{email} is already an admin");
        return Ok(());
    }

    users.set_role(record.user.id, UserRole::Admin).await?;
    tracing::info!("{email} promoted to admin; the change applies at their next login");
    Ok(())
}
