//! In-memory store.
//!
//! Holds the whole dataset behind a single `RwLock`. Every trait method
//! takes the lock once and releases it before returning, so each write is
//! atomic with respect to every other call.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use assessor_core::error::StoreError;
use assessor_core::model::{
    Attempt, AttemptRecord, Course, Enrollment, Lesson, Quiz, StudentAnswer,
};
use assessor_core::traits::{EnrollmentGate, QuizStore};

/// Everything the store knows, in a serializable shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub courses: Vec<Course>,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
    #[serde(default)]
    pub enrollments: Vec<Enrollment>,
    #[serde(default)]
    pub quizzes: Vec<Quiz>,
    /// Attempts in the order they were recorded.
    #[serde(default)]
    pub attempts: Vec<Attempt>,
    #[serde(default)]
    pub student_answers: Vec<StudentAnswer>,
}

impl Dataset {
    /// Add a course owned by `instructor_id` and return its id.
    pub fn add_course(&mut self, name: &str, instructor_id: Uuid) -> Uuid {
        let id = Uuid::new_v4();
        self.courses.push(Course {
            id,
            name: name.to_string(),
            instructor_id,
        });
        id
    }

    /// Add a lesson to a course and return its id.
    pub fn add_lesson(&mut self, name: &str, course_id: Uuid) -> Uuid {
        let id = Uuid::new_v4();
        self.lessons.push(Lesson {
            id,
            name: name.to_string(),
            course_id,
        });
        id
    }

    pub fn enroll(&mut self, student_id: Uuid, course_id: Uuid) {
        let enrollment = Enrollment {
            student_id,
            course_id,
        };
        if !self.enrollments.contains(&enrollment) {
            self.enrollments.push(enrollment);
        }
    }

    fn latest_attempt(&self, student_id: Uuid, quiz_id: Uuid) -> Option<&Attempt> {
        // `max_by_key` keeps the last of equal maxima, so ties go to the
        // attempt recorded later.
        self.attempts
            .iter()
            .filter(|a| a.student_id == student_id && a.quiz_id == quiz_id)
            .max_by_key(|a| a.taken_at)
    }

    pub(crate) fn insert_quiz(&mut self, quiz: &Quiz) -> Result<Quiz, StoreError> {
        if self.quizzes.iter().any(|q| q.id == quiz.id) {
            return Err(StoreError::Backend(format!("quiz {} already exists", quiz.id)));
        }
        self.quizzes.push(quiz.clone());
        Ok(quiz.clone())
    }

    pub(crate) fn set_correct_answer(&mut self, question_id: Uuid, answer_id: Uuid) -> Result<(), StoreError> {
        let question = self
            .quizzes
            .iter_mut()
            .flat_map(|q| q.questions.iter_mut())
            .find(|q| q.id == question_id)
            .ok_or(StoreError::Missing {
                entity: "question",
                id: question_id,
            })?;

        if !question.answers.iter().any(|a| a.id == answer_id) {
            return Err(StoreError::Missing {
                entity: "answer",
                id: answer_id,
            });
        }
        question.correct_answer_id = answer_id;
        Ok(())
    }

    pub(crate) fn record_attempt(
        &mut self,
        record: &AttemptRecord,
        expected_latest: Option<Uuid>,
    ) -> Result<(), StoreError> {
        let attempt = &record.attempt;
        let current = self
            .latest_attempt(attempt.student_id, attempt.quiz_id)
            .map(|a| a.id);
        if current != expected_latest {
            return Err(StoreError::Conflict {
                student_id: attempt.student_id,
                quiz_id: attempt.quiz_id,
            });
        }
        if !self.quizzes.iter().any(|q| q.id == attempt.quiz_id) {
            return Err(StoreError::Missing {
                entity: "quiz",
                id: attempt.quiz_id,
            });
        }

        self.attempts.push(attempt.clone());
        self.student_answers.extend(record.answers.iter().cloned());
        Ok(())
    }

    pub(crate) fn delete_quiz(&mut self, quiz_id: Uuid) -> bool {
        let before = self.quizzes.len();
        self.quizzes.retain(|q| q.id != quiz_id);
        if self.quizzes.len() == before {
            return false;
        }

        let removed: Vec<Uuid> = self
            .attempts
            .iter()
            .filter(|a| a.quiz_id == quiz_id)
            .map(|a| a.id)
            .collect();
        self.attempts.retain(|a| a.quiz_id != quiz_id);
        self.student_answers
            .retain(|sa| !removed.contains(&sa.attempt_id));
        true
    }
}

/// A store that keeps everything in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<Dataset>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing dataset.
    pub fn with_dataset(dataset: Dataset) -> Self {
        Self {
            data: RwLock::new(dataset),
        }
    }

    /// A copy of the current dataset.
    pub fn snapshot(&self) -> Result<Dataset, StoreError> {
        Ok(self.read()?.clone())
    }

    /// Swap in a new dataset wholesale.
    pub(crate) fn replace(&self, dataset: Dataset) -> Result<(), StoreError> {
        *self.write()? = dataset;
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Dataset>, StoreError> {
        self.data
            .read()
            .map_err(|_| StoreError::Backend("store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Dataset>, StoreError> {
        self.data
            .write()
            .map_err(|_| StoreError::Backend("store lock poisoned".into()))
    }
}

#[async_trait]
impl QuizStore for MemoryStore {
    async fn insert_quiz(&self, quiz: &Quiz) -> Result<Quiz, StoreError> {
        self.write()?.insert_quiz(quiz)
    }

    async fn set_correct_answer(
        &self,
        question_id: Uuid,
        answer_id: Uuid,
    ) -> Result<(), StoreError> {
        self.write()?.set_correct_answer(question_id, answer_id)
    }

    async fn find_quiz(&self, quiz_id: Uuid) -> Result<Option<Quiz>, StoreError> {
        Ok(self.read()?.quizzes.iter().find(|q| q.id == quiz_id).cloned())
    }

    async fn quizzes_for_lesson(&self, lesson_id: Uuid) -> Result<Vec<Quiz>, StoreError> {
        Ok(self
            .read()?
            .quizzes
            .iter()
            .filter(|q| q.lesson_id == lesson_id)
            .cloned()
            .collect())
    }

    async fn find_lesson(&self, lesson_id: Uuid) -> Result<Option<Lesson>, StoreError> {
        Ok(self.read()?.lessons.iter().find(|l| l.id == lesson_id).cloned())
    }

    async fn find_course(&self, course_id: Uuid) -> Result<Option<Course>, StoreError> {
        Ok(self.read()?.courses.iter().find(|c| c.id == course_id).cloned())
    }

    async fn record_attempt(
        &self,
        record: &AttemptRecord,
        expected_latest: Option<Uuid>,
    ) -> Result<(), StoreError> {
        self.write()?.record_attempt(record, expected_latest)
    }

    async fn latest_attempt(
        &self,
        student_id: Uuid,
        quiz_id: Uuid,
    ) -> Result<Option<Attempt>, StoreError> {
        Ok(self.read()?.latest_attempt(student_id, quiz_id).cloned())
    }

    async fn attempts_for_quiz(&self, quiz_id: Uuid) -> Result<Vec<Attempt>, StoreError> {
        let mut attempts: Vec<Attempt> = self
            .read()?
            .attempts
            .iter()
            .filter(|a| a.quiz_id == quiz_id)
            .cloned()
            .collect();
        // Stable, so equal timestamps stay in recording order.
        attempts.sort_by_key(|a| a.taken_at);
        Ok(attempts)
    }

    async fn answers_for_attempt(
        &self,
        attempt_id: Uuid,
    ) -> Result<Vec<StudentAnswer>, StoreError> {
        Ok(self
            .read()?
            .student_answers
            .iter()
            .filter(|sa| sa.attempt_id == attempt_id)
            .cloned()
            .collect())
    }

    async fn delete_quiz(&self, quiz_id: Uuid) -> Result<bool, StoreError> {
        Ok(self.write()?.delete_quiz(quiz_id))
    }
}

#[async_trait]
impl EnrollmentGate for MemoryStore {
    async fn is_enrolled(&self, student_id: Uuid, course_id: Uuid) -> Result<bool, StoreError> {
        if student_id.is_nil() || course_id.is_nil() {
            return Ok(false);
        }
        Ok(self.read()?.enrollments.contains(&Enrollment {
            student_id,
            course_id,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assessor_core::model::{Answer, Question};
    use chrono::{Duration, Utc};

    fn quiz(lesson_id: Uuid) -> Quiz {
        let quiz_id = Uuid::new_v4();
        let question_id = Uuid::new_v4();
        let answers = vec![
            Answer {
                id: Uuid::new_v4(),
                question_id,
                text: "right".into(),
                is_correct: true,
            },
            Answer {
                id: Uuid::new_v4(),
                question_id,
                text: "wrong".into(),
                is_correct: false,
            },
        ];
        Quiz {
            id: quiz_id,
            title: "Iterators".into(),
            description: String::new(),
            lesson_id,
            questions: vec![Question {
                id: question_id,
                quiz_id,
                text: "Is `iter()` lazy?".into(),
                correct_answer_id: answers[0].id,
                answers,
            }],
        }
    }

    fn record(quiz_id: Uuid, student_id: Uuid, passed: bool) -> AttemptRecord {
        let attempt = Attempt {
            id: Uuid::new_v4(),
            student_id,
            quiz_id,
            taken_at: Utc::now(),
            score: u32::from(passed),
            passed,
        };
        AttemptRecord {
            answers: vec![StudentAnswer {
                id: Uuid::new_v4(),
                attempt_id: attempt.id,
                question_id: Uuid::new_v4(),
                answer_id: Uuid::new_v4(),
            }],
            attempt,
        }
    }

    #[tokio::test]
    async fn insert_and_find_quiz() {
        let store = MemoryStore::new();
        let lesson = Uuid::new_v4();
        let q = quiz(lesson);

        let stored = store.insert_quiz(&q).await.unwrap();
        assert_eq!(stored, q);
        assert_eq!(store.find_quiz(q.id).await.unwrap(), Some(q.clone()));
        assert_eq!(store.quizzes_for_lesson(lesson).await.unwrap().len(), 1);
        assert!(store.insert_quiz(&q).await.is_err());
    }

    #[tokio::test]
    async fn set_correct_answer_is_idempotent() {
        let store = MemoryStore::new();
        let q = quiz(Uuid::new_v4());
        store.insert_quiz(&q).await.unwrap();
        let question = &q.questions[0];
        let other = question.answers[1].id;

        store.set_correct_answer(question.id, other).await.unwrap();
        store.set_correct_answer(question.id, other).await.unwrap();
        let found = store.find_quiz(q.id).await.unwrap().unwrap();
        assert_eq!(found.questions[0].correct_answer_id, other);

        let err = store
            .set_correct_answer(question.id, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Missing { entity: "answer", .. }));
    }

    #[tokio::test]
    async fn record_attempt_compare_and_set() {
        let store = MemoryStore::new();
        let q = quiz(Uuid::new_v4());
        store.insert_quiz(&q).await.unwrap();
        let student = Uuid::new_v4();

        let first = record(q.id, student, false);
        store.record_attempt(&first, None).await.unwrap();

        // Stale expectation: someone else already wrote the first attempt.
        let stale = record(q.id, student, true);
        let err = store.record_attempt(&stale, None).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));

        let second = record(q.id, student, true);
        store
            .record_attempt(&second, Some(first.attempt.id))
            .await
            .unwrap();

        let latest = store.latest_attempt(student, q.id).await.unwrap().unwrap();
        assert_eq!(latest.id, second.attempt.id);
        assert_eq!(store.attempts_for_quiz(q.id).await.unwrap().len(), 2);
        assert_eq!(
            store
                .answers_for_attempt(second.attempt.id)
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn latest_attempt_prefers_greatest_timestamp() {
        let store = MemoryStore::new();
        let q = quiz(Uuid::new_v4());
        store.insert_quiz(&q).await.unwrap();
        let student = Uuid::new_v4();

        let mut newer = record(q.id, student, false);
        newer.attempt.taken_at = Utc::now() + Duration::minutes(5);
        let mut older = record(q.id, student, true);
        older.attempt.taken_at = Utc::now() - Duration::minutes(5);

        store.record_attempt(&newer, None).await.unwrap();
        store
            .record_attempt(&older, Some(newer.attempt.id))
            .await
            .unwrap();

        let latest = store.latest_attempt(student, q.id).await.unwrap().unwrap();
        assert_eq!(latest.id, newer.attempt.id);

        let ordered = store.attempts_for_quiz(q.id).await.unwrap();
        assert_eq!(ordered[0].id, older.attempt.id);
    }

    #[tokio::test]
    async fn equal_timestamps_go_to_later_record() {
        let store = MemoryStore::new();
        let q = quiz(Uuid::new_v4());
        store.insert_quiz(&q).await.unwrap();
        let student = Uuid::new_v4();
        let at = Utc::now();

        let mut first = record(q.id, student, false);
        first.attempt.taken_at = at;
        let mut second = record(q.id, student, false);
        second.attempt.taken_at = at;

        store.record_attempt(&first, None).await.unwrap();
        store
            .record_attempt(&second, Some(first.attempt.id))
            .await
            .unwrap();

        let latest = store.latest_attempt(student, q.id).await.unwrap().unwrap();
        assert_eq!(latest.id, second.attempt.id);
    }

    #[tokio::test]
    async fn attempt_for_unknown_quiz_is_rejected() {
        let store = MemoryStore::new();
        let err = store
            .record_attempt(&record(Uuid::new_v4(), Uuid::new_v4(), true), None)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Missing { entity: "quiz", .. }));
    }

    #[tokio::test]
    async fn delete_cascades() {
        let store = MemoryStore::new();
        let q = quiz(Uuid::new_v4());
        let keep = quiz(Uuid::new_v4());
        store.insert_quiz(&q).await.unwrap();
        store.insert_quiz(&keep).await.unwrap();
        let student = Uuid::new_v4();
        let gone = record(q.id, student, false);
        let kept = record(keep.id, student, false);
        store.record_attempt(&gone, None).await.unwrap();
        store.record_attempt(&kept, None).await.unwrap();

        assert!(store.delete_quiz(q.id).await.unwrap());
        assert!(!store.delete_quiz(q.id).await.unwrap());

        assert!(store.find_quiz(q.id).await.unwrap().is_none());
        assert!(store.latest_attempt(student, q.id).await.unwrap().is_none());
        assert!(store
            .answers_for_attempt(gone.attempt.id)
            .await
            .unwrap()
            .is_empty());
        assert!(store.latest_attempt(student, keep.id).await.unwrap().is_some());
        assert_eq!(
            store
                .answers_for_attempt(kept.attempt.id)
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn enrollment_lookup() {
        let mut data = Dataset::default();
        let instructor = Uuid::new_v4();
        let course = data.add_course("Rust 101", instructor);
        let student = Uuid::new_v4();
        data.enroll(student, course);
        data.enroll(student, course);
        assert_eq!(data.enrollments.len(), 1);

        let store = MemoryStore::with_dataset(data);
        assert!(store.is_enrolled(student, course).await.unwrap());
        assert!(!store.is_enrolled(Uuid::new_v4(), course).await.unwrap());
        assert!(!store.is_enrolled(Uuid::nil(), course).await.unwrap());
        assert!(!store.is_enrolled(student, Uuid::nil()).await.unwrap());
    }
}
