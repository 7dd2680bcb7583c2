//! Product comments and reactions.

use sqlx::PgPool;

use bazaar_core::{CommentId, ProductId, ReactionKind, UserId};

use super::RepositoryError;
use crate::models::comment::{CommentRow, ReactionState};

const COMMENT_SELECT: &str = "SELECT c.id, c.product_id, c.user_id, u.name AS author_name, \
     c.parent_id, c.content, c.created_at,
     COUNT(r.user_id) FILTER (WHERE r.kind = 'like') AS likes,
     COUNT(r.user_id) FILTER (WHERE r.kind = 'dislike') AS dislikes
     FROM comments c
     JOIN users u ON u.id = c.user_id
     LEFT JOIN comment_reactions r ON r.comment_id = c.id";

pub struct CommentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CommentRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All comments on a product, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, product_id: ProductId) -> Result<Vec<CommentRow>, RepositoryError> {
        let comments = sqlx::query_as::<_, CommentRow>(&format!(
            "{COMMENT_SELECT}
             WHERE c.product_id = $1
             GROUP BY c.id, u.name
             ORDER BY c.created_at, c.id"
        ))
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;
        Ok(comments)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the comment does not exist.
    pub async fn get(&self, id: CommentId) -> Result<CommentRow, RepositoryError> {
        sqlx::query_as::<_, CommentRow>(&format!(
            "{COMMENT_SELECT} WHERE c.id = $1 GROUP BY c.id, u.name"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn create(
        &self,
        product_id: ProductId,
        user_id: UserId,
        parent_id: Option<CommentId>,
        content: &str,
    ) -> Result<CommentRow, RepositoryError> {
        let id = sqlx::query_scalar::<_, CommentId>(
            "INSERT INTO comments (product_id, user_id, parent_id, content)
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(product_id)
        .bind(user_id)
        .bind(parent_id)
        .bind(content)
        .fetch_one(self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                RepositoryError::NotFound
            }
            other => RepositoryError::Database(other),
        })?;
        self.get(id).await
    }

    /// Delete a comment and its replies.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the comment does not exist.
    pub async fn delete(&self, id: CommentId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Toggle a reaction: the same kind again removes it, the other kind
    /// replaces it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the comment does not exist.
    pub async fn toggle_reaction(
        &self,
        comment_id: CommentId,
        user_id: UserId,
        kind: ReactionKind,
    ) -> Result<ReactionState, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_scalar::<_, ReactionKind>(
            "SELECT kind FROM comment_reactions
             WHERE comment_id = $1 AND user_id = $2
             FOR UPDATE",
        )
        .bind(comment_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let reaction = if existing == Some(kind) {
            sqlx::query("DELETE FROM comment_reactions WHERE comment_id = $1 AND user_id = $2")
                .bind(comment_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
            None
        } else {
            sqlx::query(
                "INSERT INTO comment_reactions (comment_id, user_id, kind) VALUES ($1, $2, $3)
                 ON CONFLICT (comment_id, user_id)
                 DO UPDATE SET kind = EXCLUDED.kind, created_at = NOW()",
            )
            .bind(comment_id)
            .bind(user_id)
            .bind(kind)
            .execute(&mut *tx)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                    RepositoryError::NotFound
                }
                other => RepositoryError::Database(other),
            })?;
            Some(kind)
        };

        let (likes, dislikes) = sqlx::query_as::<_, (i64, i64)>(
            "SELECT COUNT(*) FILTER (WHERE kind = 'like'),
                    COUNT(*) FILTER (WHERE kind = 'dislike')
             FROM comment_reactions WHERE comment_id = $1",
        )
        .bind(comment_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(ReactionState {
            comment_id,
            reaction,
            likes,
            dislikes,
        })
    }
}
