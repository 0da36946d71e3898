//! Core error types.

use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SocialError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

impl SocialError {
    /// Classify a failed write.
    ///
    /// The unique index on an edge is the only guard against two identical
    /// concurrent writes, so losing that race surfaces as `Conflict`. A foreign
    /// key violation means a referent vanished between the check and the write.
    pub fn from_write(err: DbErr, conflict: &str, missing: &str) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => SocialError::Conflict(conflict.into()),
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
                SocialError::NotFound(missing.into())
            }
            _ => SocialError::Database(err),
        }
    }

    /// Message safe to show to an API caller.
    pub fn public_message(&self) -> String {
        match self {
            SocialError::NotFound(m)
            | SocialError::Conflict(m)
            | SocialError::InvalidOperation(m)
            | SocialError::InvalidInput(m)
            | SocialError::Forbidden(m) => m.clone(),
            SocialError::Database(e) => format!("DB error: {e}"),
        }
    }
}

pub type SocialResult<T> = Result<T, SocialError>;

#[cfg(test)]
mod tests {
    use super::*;

    // ── Display messages ──────────────────────────────────────────────

    #[test]
    fn test_display_not_found() {
        let err = SocialError::NotFound("Track not found".into());
        assert_eq!(err.to_string(), "not found: Track not found");
    }

    #[test]
    fn test_display_conflict() {
        let err = SocialError::Conflict("Already liked this track".into());
        assert_eq!(err.to_string(), "conflict: Already liked this track");
    }

    #[test]
    fn test_display_invalid_operation() {
        let err = SocialError::InvalidOperation("Cannot follow yourself".into());
        assert_eq!(err.to_string(), "invalid operation: Cannot follow yourself");
    }

    #[test]
    fn test_display_forbidden() {
        let err = SocialError::Forbidden("You can only edit your own comments".into());
        assert_eq!(
            err.to_string(),
            "forbidden: You can only edit your own comments"
        );
    }

    // ── From conversions ──────────────────────────────────────────────

    #[test]
    fn test_from_db_error() {
        let err: SocialError = DbErr::Custom("boom".into()).into();
        assert!(matches!(err, SocialError::Database(_)));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_from_write_passes_through_unclassified_errors() {
        let err = SocialError::from_write(DbErr::Custom("disk full".into()), "dup", "gone");
        assert!(matches!(err, SocialError::Database(_)));
    }

    // ── Public message ────────────────────────────────────────────────

    #[test]
    fn test_public_message_strips_prefix() {
        let err = SocialError::InvalidInput("Comment content cannot be empty".into());
        assert_eq!(err.public_message(), "Comment content cannot be empty");
    }

    #[test]
    fn test_public_message_database() {
        let err = SocialError::Database(DbErr::Custom("x".into()));
        assert!(err.public_message().starts_with("DB error:"));
    }
}
