//! Address book repository.
//!
//! Each user has at most one default address (enforced by a partial unique
//! index). The first address saved becomes the default, and deleting the
//! default promotes the most recently created remaining address.
//!
//! Writes that touch the default flag lock the owning `users` row first, so
//! concurrent writes to one address book run one after another.

use sqlx::{PgConnection, PgPool};

use bazaar_core::{AddressId, UserId};

use super::RepositoryError;
use crate::models::address::{Address, AddressInput};

const ADDRESS_COLUMNS: &str = "id, user_id, full_name, phone, line1, line2, city, province, \
                               postal_code, country, is_default, created_at";

const DEFAULT_TAKEN: &str = "Another default address was saved at the same time";

pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a user's addresses, default first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        let addresses = sqlx::query_as::<_, Address>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM addresses
             WHERE user_id = $1
             ORDER BY is_default DESC, created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;
        Ok(addresses)
    }

    /// Get one of a user's addresses.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address does not exist or
    /// belongs to another user.
    pub async fn get(&self, user_id: UserId, id: AddressId) -> Result<Address, RepositoryError> {
        sqlx::query_as::<_, Address>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM addresses WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Save a new address. It becomes the default when requested or when it
    /// is the user's first address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown user and
    /// `RepositoryError::Conflict` if another default appeared meanwhile.
    pub async fn create(
        &self,
        user_id: UserId,
        input: &AddressInput,
        make_default: bool,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        lock_address_book(&mut tx, user_id).await?;

        let has_any = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM addresses WHERE user_id = $1)",
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;
        let is_default = make_default || !has_any;
        if is_default {
            clear_default(&mut tx, user_id).await?;
        }

        let address = sqlx::query_as::<_, Address>(&format!(
            "INSERT INTO addresses
                 (user_id, full_name, phone, line1, line2, city, province, postal_code, country, is_default)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(user_id)
        .bind(&input.full_name)
        .bind(&input.phone)
        .bind(&input.line1)
        .bind(input.line2.as_deref())
        .bind(&input.city)
        .bind(&input.province)
        .bind(&input.postal_code)
        .bind(&input.country)
        .bind(is_default)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, DEFAULT_TAKEN))?;

        tx.commit().await?;
        Ok(address)
    }

    /// Replace an address's fields. The default flag is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address is not the user's.
    pub async fn update(
        &self,
        user_id: UserId,
        id: AddressId,
        input: &AddressInput,
    ) -> Result<Address, RepositoryError> {
        sqlx::query_as::<_, Address>(&format!(
            "UPDATE addresses
             SET full_name = $3, phone = $4, line1 = $5, line2 = $6, city = $7,
                 province = $8, postal_code = $9, country = $10
             WHERE id = $1 AND user_id = $2
             RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(id)
        .bind(user_id)
        .bind(&input.full_name)
        .bind(&input.phone)
        .bind(&input.line1)
        .bind(input.line2.as_deref())
        .bind(&input.city)
        .bind(&input.province)
        .bind(&input.postal_code)
        .bind(&input.country)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Make an address the user's default.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address is not the user's.
    pub async fn set_default(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        lock_address_book(&mut tx, user_id).await?;
        clear_default(&mut tx, user_id).await?;

        let address = sqlx::query_as::<_, Address>(&format!(
            "UPDATE addresses SET is_default = TRUE
             WHERE id = $1 AND user_id = $2
             RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, DEFAULT_TAKEN))?
        .ok_or(RepositoryError::NotFound)?;

        tx.commit().await?;
        Ok(address)
    }

    /// Delete an address, promoting another one if it was the default.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address is not the user's.
    pub async fn delete(&self, user_id: UserId, id: AddressId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        lock_address_book(&mut tx, user_id).await?;

        let was_default = sqlx::query_scalar::<_, bool>(
            "DELETE FROM addresses WHERE id = $1 AND user_id = $2 RETURNING is_default",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        if was_default {
            sqlx::query(
                "UPDATE addresses SET is_default = TRUE
                 WHERE id = (
                     SELECT id FROM addresses WHERE user_id = $1
                     ORDER BY created_at DESC, id DESC LIMIT 1
                 )",
            )
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

async fn lock_address_book(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<(), RepositoryError> {
    sqlx::query_scalar::<_, i32>("SELECT 1 FROM users WHERE id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_optional(conn)
        .await?
        .ok_or(RepositoryError::NotFound)?;
    Ok(())
}

async fn clear_default(conn: &mut PgConnection, user_id: UserId) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE addresses SET is_default = FALSE WHERE user_id = $1 AND is_default")
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(())
}
