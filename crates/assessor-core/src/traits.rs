//! Core trait definitions for persistence and enrollment lookups.
//!
//! These async traits are implemented by the `assessor-store` crate. The
//! engine only ever talks to storage through them.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::{Attempt, AttemptRecord, Course, Lesson, Quiz, StudentAnswer};

// ---------------------------------------------------------------------------
// Persistence port
// ---------------------------------------------------------------------------

/// Storage for quizzes and attempts, plus read access to lessons and courses.
#[async_trait]
pub trait QuizStore: Send + Sync {
    /// Persist a quiz with its questions and answers.
    ///
    /// Returns the quiz as stored. Backends that assign their own row ids may
    /// return different identifiers than the ones passed in.
    async fn insert_quiz(&self, quiz: &Quiz) -> Result<Quiz, StoreError>;

    /// Point a question at its correct answer. Idempotent.
    async fn set_correct_answer(&self, question_id: Uuid, answer_id: Uuid)
        -> Result<(), StoreError>;

    /// Fetch a quiz with its questions and answers.
    async fn find_quiz(&self, quiz_id: Uuid) -> Result<Option<Quiz>, StoreError>;

    /// All quizzes attached to a lesson.
    async fn quizzes_for_lesson(&self, lesson_id: Uuid) -> Result<Vec<Quiz>, StoreError>;

    async fn find_lesson(&self, lesson_id: Uuid) -> Result<Option<Lesson>, StoreError>;

    async fn find_course(&self, course_id: Uuid) -> Result<Option<Course>, StoreError>;

    /// Append an attempt and its answers in a single write.
    ///
    /// The write only happens if the current latest attempt for the
    /// record's (student, quiz) pair has id `expected_latest` (`None` meaning
    /// no attempt yet). Otherwise returns [`StoreError::Conflict`].
    async fn record_attempt(
        &self,
        record: &AttemptRecord,
        expected_latest: Option<Uuid>,
    ) -> Result<(), StoreError>;

    /// The attempt with the greatest timestamp for (student, quiz).
    async fn latest_attempt(
        &self,
        student_id: Uuid,
        quiz_id: Uuid,
    ) -> Result<Option<Attempt>, StoreError>;

    /// Every attempt on a quiz, oldest first.
    async fn attempts_for_quiz(&self, quiz_id: Uuid) -> Result<Vec<Attempt>, StoreError>;

    async fn answers_for_attempt(&self, attempt_id: Uuid)
        -> Result<Vec<StudentAnswer>, StoreError>;

    /// Remove a quiz together with its questions, answers, attempts and
    /// student answers. Returns `false` if the quiz did not exist.
    async fn delete_quiz(&self, quiz_id: Uuid) -> Result<bool, StoreError>;
}

// ---------------------------------------------------------------------------
// Enrollment gate
// ---------------------------------------------------------------------------

/// Read-only enrollment lookup.
#[async_trait]
pub trait EnrollmentGate: Send + Sync {
    /// Whether the student is enrolled in the course. Unknown or nil ids
    /// yield `false`, not an error.
    async fn is_enrolled(&self, student_id: Uuid, course_id: Uuid) -> Result<bool, StoreError>;
}
