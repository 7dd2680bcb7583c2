//! Threaded product comments and reactions.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{CommentId, DomainError, ProductId, ReactionKind, UserId};

use super::required_text;

/// Longest comment body accepted, in characters.
pub const MAX_COMMENT_LENGTH: usize = 2000;

/// A comment with its author and reaction counts.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CommentRow {
    pub id: CommentId,
    pub product_id: ProductId,
    pub user_id: UserId,
    pub author_name: String,
    pub parent_id: Option<CommentId>,
    pub content: String,
    pub likes: i64,
    pub dislikes: i64,
    pub created_at: DateTime<Utc>,
}

/// A top-level comment and its replies (oldest first).
#[derive(Debug, Clone, Serialize)]
pub struct CommentThread {
    #[serde(flatten)]
    pub comment: CommentRow,
    pub replies: Vec<CommentRow>,
}

/// Group comments into threads.
///
/// `rows` must be ordered oldest first. Replies whose parent is not a
/// top-level comment in `rows` are dropped.
#[must_use]
pub fn build_threads(rows: Vec<CommentRow>) -> Vec<CommentThread> {
    let (top, replies): (Vec<_>, Vec<_>) = rows.into_iter().partition(|c| c.parent_id.is_none());

    let mut by_parent: HashMap<CommentId, Vec<CommentRow>> = HashMap::new();
    for reply in replies {
        if let Some(parent) = reply.parent_id {
            by_parent.entry(parent).or_default().push(reply);
        }
    }

    top.into_iter()
        .map(|comment| CommentThread {
            replies: by_parent.remove(&comment.id).unwrap_or_default(),
            comment,
        })
        .collect()
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentInput {
    pub content: String,
    pub parent_id: Option<CommentId>,
}

impl CommentInput {
    /// Trimmed comment body.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Invalid` for a blank or oversized body.
    pub fn content(&self) -> Result<String, DomainError> {
        let content = required_text(&self.content, "Comment")?;
        if content.chars().count() > MAX_COMMENT_LENGTH {
            return Err(DomainError::Invalid(format!(
                "Comment must be at most {MAX_COMMENT_LENGTH} characters"
            )));
        }
        Ok(content)
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ReactionInput {
    pub kind: ReactionKind,
}

/// Reaction state after a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReactionState {
    pub comment_id: CommentId,
    pub reaction: Option<ReactionKind>,
    pub likes: i64,
    pub dislikes: i64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn row(id: i32, parent: Option<i32>) -> CommentRow {
        CommentRow {
            id: CommentId::new(id),
            product_id: ProductId::new(1),
            user_id: UserId::new(1),
            author_name: "An".to_owned(),
            parent_id: parent.map(CommentId::new),
            content: format!("comment {id}"),
            likes: 0,
            dislikes: 0,
            created_at: Utc.timestamp_opt(1_700_000_000 + i64::from(id), 0).unwrap(),
        }
    }

    #[test]
    fn test_build_threads_groups_replies() {
        let threads = build_threads(vec![
            row(1, None),
            row(2, Some(1)),
            row(3, None),
            row(4, Some(1)),
            row(5, Some(99)),
        ]);

        assert_eq!(threads.len(), 2);
        let first = threads.first().unwrap();
        assert_eq!(first.comment.id, CommentId::new(1));
        let reply_ids: Vec<_> = first.replies.iter().map(|r| r.id.as_i32()).collect();
        assert_eq!(reply_ids, vec![2, 4]);
        assert!(threads.get(1).unwrap().replies.is_empty());
    }

    #[test]
    fn test_comment_content_limits() {
        let input = |content: String| CommentInput {
            content,
            parent_id: None,
        };
        assert!(input("  ".to_owned()).content().is_err());
        assert!(input("x".repeat(MAX_COMMENT_LENGTH + 1)).content().is_err());
        assert_eq!(input(" hi ".to_owned()).content(), Ok("hi".to_owned()));
    }
}
