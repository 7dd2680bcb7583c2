use sqlx::PgPool;

use bazaar_core::ExpenseId;

use super::RepositoryError;
use crate::models::expense::{Expense, ExpenseInput, ExpenseQuery};

const EXPENSE_COLUMNS: &str = "id, title, category, amount, spent_on, note, created_at";

pub struct ExpenseRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ExpenseRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Expenses within an inclusive date range, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, range: ExpenseQuery) -> Result<Vec<Expense>, RepositoryError> {
        let expenses = sqlx::query_as::<_, Expense>(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses
             WHERE ($1::date IS NULL OR spent_on >= $1)
               AND ($2::date IS NULL OR spent_on <= $2)
             ORDER BY spent_on DESC, id DESC"
        ))
        .bind(range.from)
        .bind(range.to)
        .fetch_all(self.pool)
        .await?;
        Ok(expenses)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, input: &ExpenseInput) -> Result<Expense, RepositoryError> {
        let expense = sqlx::query_as::<_, Expense>(&format!(
            "INSERT INTO expenses (title, category, amount, spent_on, note)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {EXPENSE_COLUMNS}"
        ))
        .bind(&input.title)
        .bind(input.category())
        .bind(input.amount)
        .bind(input.spent_on)
        .bind(input.note.as_deref())
        .fetch_one(self.pool)
        .await?;
        Ok(expense)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the expense does not exist.
    pub async fn update(
        &self,
        id: ExpenseId,
        input: &ExpenseInput,
    ) -> Result<Expense, RepositoryError> {
        sqlx::query_as::<_, Expense>(&format!(
            "UPDATE expenses
             SET title = $2, category = $3, amount = $4, spent_on = $5, note = $6
             WHERE id = $1
             RETURNING {EXPENSE_COLUMNS}"
        ))
        .bind(id)
        .bind(&input.title)
        .bind(input.category())
        .bind(input.amount)
        .bind(input.spent_on)
        .bind(input.note.as_deref())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the expense does not exist.
    pub async fn delete(&self, id: ExpenseId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
