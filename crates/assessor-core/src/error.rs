//! Error types for the assessment engine and its storage ports.
//!
//! Storage adapters return [`StoreError`]; the engine converts those into the
//! [`AssessmentError`] taxonomy so callers can match on failure kinds without
//! string matching.

use thiserror::Error;
use uuid::Uuid;

/// Errors raised by a persistence backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Another attempt was recorded for the same student and quiz between the
    /// engine's read and its write.
    #[error("attempt conflict for student {student_id} on quiz {quiz_id}")]
    Conflict { student_id: Uuid, quiz_id: Uuid },

    /// The referenced row does not exist.
    #[error("{entity} {id} not found")]
    Missing { entity: &'static str, id: Uuid },

    /// A generic backend failure.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// Reading or writing the backing file failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored data could not be (de)serialized.
    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failures surfaced by the quiz engine.
#[derive(Debug, Error)]
pub enum AssessmentError {
    /// Malformed input or an authoring rule violation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Quiz, lesson, or attempt is absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// Enrollment or ownership check failed.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// The attempt state does not permit the requested operation.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The store failed to read or write.
    #[error("persistence error: {0}")]
    Persistence(StoreError),
}

impl From<StoreError> for AssessmentError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { .. } => AssessmentError::InvalidState(
                "attempt state changed concurrently; re-query the latest attempt before retrying"
                    .into(),
            ),
            other => AssessmentError::Persistence(other),
        }
    }
}

impl AssessmentError {
    /// Message suitable for showing to an end user.
    ///
    /// Persistence failures are reported generically so storage details do
    /// not leak.
    pub fn user_message(&self) -> String {
        match self {
            AssessmentError::Validation(msg)
            | AssessmentError::NotFound(msg)
            | AssessmentError::AccessDenied(msg)
            | AssessmentError::InvalidState(msg) => msg.clone(),
            AssessmentError::Persistence(_) => {
                "the request could not be completed, please try again later".into()
            }
        }
    }

    /// Returns `true` for storage failures. A submit or retake that failed
    /// this way may or may not have recorded an attempt.
    pub fn is_persistence(&self) -> bool {
        matches!(self, AssessmentError::Persistence(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_maps_to_invalid_state() {
        let err: AssessmentError = StoreError::Conflict {
            student_id: Uuid::nil(),
            quiz_id: Uuid::nil(),
        }
        .into();
        assert!(matches!(err, AssessmentError::InvalidState(_)));
        assert!(!err.is_persistence());
    }

    #[test]
    fn persistence_message_is_generic() {
        let err: AssessmentError =
            StoreError::Backend("connection refused to 10.0.0.5:5432".into()).into();
        assert!(err.is_persistence());
        assert!(!err.user_message().contains("10.0.0.5"));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn specific_messages_pass_through() {
        let err = AssessmentError::AccessDenied("you are not enrolled in this course".into());
        assert_eq!(err.user_message(), "you are not enrolled in this course");
    }
}
