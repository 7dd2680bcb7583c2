//! User domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{DomainError, Email, UserId, UserRole};

use super::optional_text;

/// An account as returned to clients (never includes the password hash).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: UserRole,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub last_active_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user row together with its stored password hash.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserWithPassword {
    #[sqlx(flatten)]
    pub user: User,
    pub password_hash: String,
}

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Password change request body.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Partial profile update. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
}

impl ProfileUpdate {
    /// Trim fields and reject an explicitly blank name.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Invalid` when `name` is present but blank.
    pub fn normalized(self) -> Result<Self, DomainError> {
        let name = match self.name {
            Some(name) if name.trim().is_empty() => {
                return Err(DomainError::Invalid("Name cannot be empty".to_owned()));
            }
            other => other.map(|n| n.trim().to_owned()),
        };
        Ok(Self {
            name,
            phone: optional_text(self.phone.as_deref()),
            avatar_url: optional_text(self.avatar_url.as_deref()),
        })
    }
}

/// Role change request body (admin).
#[derive(Debug, Deserialize)]
pub struct RoleUpdate {
    pub role: UserRole,
}
