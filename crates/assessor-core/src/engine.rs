//! Central quiz assessment engine.
//!
//! Coordinates authoring, access checks, submission, retakes and result
//! retrieval. Owns the per (student, quiz) attempt state machine:
//!
//! ```text
//! NoAttempt --submit--> Failed | Passed
//! Failed    --retake--> Failed | Passed
//! Passed    --submit/retake--> Passed   (no-op)
//! ```

use std::sync::Arc;

use chrono::Utc;
use futures::future::try_join_all;
use uuid::Uuid;

use crate::access::{authorize, Actor, Capability, CourseScope};
use crate::error::{AssessmentError, StoreError};
use crate::model::{
    Answer, Attempt, AttemptRecord, AttemptState, AttemptSummary, Question, Quiz, QuizDraft,
    QuizResult, QuizView, StudentAnswer, SubmitOutcome, SubmittedAnswer,
};
use crate::parser::check_draft;
use crate::report::{AttemptLine, QuizAttemptsReport};
use crate::scoring::{score_submission, AnswerKey};
use crate::traits::{EnrollmentGate, QuizStore};

type Result<T> = std::result::Result<T, AssessmentError>;

/// The quiz assessment engine.
#[derive(Clone)]
pub struct QuizEngine {
    store: Arc<dyn QuizStore>,
    enrollment: Arc<dyn EnrollmentGate>,
}

impl QuizEngine {
    pub fn new(store: Arc<dyn QuizStore>, enrollment: Arc<dyn EnrollmentGate>) -> Self {
        Self { store, enrollment }
    }

    // -----------------------------------------------------------------------
    // Authoring
    // -----------------------------------------------------------------------

    /// Create a quiz on a lesson the instructor owns.
    ///
    /// Identifiers are assigned here, so each question already points at its
    /// correct answer when the quiz is first written. If the store re-keys
    /// rows on insert, the correct-answer ids are patched afterwards.
    #[tracing::instrument(skip(self, draft), fields(lesson = %draft.lesson_id))]
    pub async fn create_quiz(&self, instructor_id: Uuid, draft: &QuizDraft) -> Result<QuizView> {
        check_draft(draft)?;

        let scope = self.lesson_scope(draft.lesson_id).await?;
        self.authorize(Actor::Instructor(instructor_id), &scope, Capability::ManageQuiz)
            .await?;

        let quiz = build_quiz(draft);
        let mut stored = self.store.insert_quiz(&quiz).await?;

        for question in &mut stored.questions {
            let correct_id = question
                .flagged_correct()
                .map(|a| a.id)
                .ok_or_else(|| {
                    StoreError::Backend(format!(
                        "stored question {} has no single correct answer",
                        question.id
                    ))
                })?;

            if question.correct_answer_id != correct_id {
                tracing::warn!(
                    question = %question.id,
                    "correct answer id changed on insert, patching"
                );
                self.store
                    .set_correct_answer(question.id, correct_id)
                    .await?;
                question.correct_answer_id = correct_id;
            }
        }

        tracing::info!(
            quiz = %stored.id,
            questions = stored.questions.len(),
            "quiz created"
        );
        Ok(QuizView::from(&stored))
    }

    /// Delete a quiz and everything recorded against it.
    #[tracing::instrument(skip(self))]
    pub async fn delete_quiz(&self, quiz_id: Uuid, instructor_id: Uuid) -> Result<()> {
        self.open_quiz(quiz_id, Actor::Instructor(instructor_id), Capability::ManageQuiz)
            .await?;

        if !self.store.delete_quiz(quiz_id).await? {
            return Err(quiz_not_found(quiz_id));
        }

        tracing::info!(quiz = %quiz_id, "quiz deleted");
        Ok(())
    }

    /// Every attempt on a quiz, for the instructor who owns it.
    #[tracing::instrument(skip(self))]
    pub async fn quiz_attempts(
        &self,
        quiz_id: Uuid,
        instructor_id: Uuid,
    ) -> Result<QuizAttemptsReport> {
        let (quiz, _) = self
            .open_quiz(quiz_id, Actor::Instructor(instructor_id), Capability::ManageQuiz)
            .await?;

        let attempts = self.store.attempts_for_quiz(quiz_id).await?;
        let answer_counts = try_join_all(
            attempts
                .iter()
                .map(|a| self.store.answers_for_attempt(a.id)),
        )
        .await?;

        let lines = attempts
            .iter()
            .zip(answer_counts)
            .map(|(attempt, answers)| AttemptLine::new(attempt, answers.len()))
            .collect();

        Ok(QuizAttemptsReport::new(&quiz, lines))
    }

    // -----------------------------------------------------------------------
    // Student operations
    // -----------------------------------------------------------------------

    /// The student-facing view of a quiz.
    #[tracing::instrument(skip(self))]
    pub async fn get_quiz(&self, quiz_id: Uuid, student_id: Uuid) -> Result<QuizView> {
        let (quiz, _) = self
            .open_quiz(quiz_id, Actor::Student(student_id), Capability::TakeQuiz)
            .await?;
        Ok(QuizView::from(&quiz))
    }

    /// The quiz attached to a lesson.
    #[tracing::instrument(skip(self))]
    pub async fn quiz_for_lesson(&self, lesson_id: Uuid, student_id: Uuid) -> Result<QuizView> {
        let scope = self.lesson_scope(lesson_id).await?;
        self.authorize(Actor::Student(student_id), &scope, Capability::TakeQuiz)
            .await?;

        let quizzes = self.store.quizzes_for_lesson(lesson_id).await?;
        quizzes
            .first()
            .map(QuizView::from)
            .ok_or_else(|| AssessmentError::NotFound(format!("lesson {lesson_id} has no quiz")))
    }

    /// Submit answers to a quiz.
    ///
    /// Once the student has passed, further submissions record nothing and
    /// return [`SubmitOutcome::AlreadyPassed`].
    #[tracing::instrument(skip(self, answers), fields(answers = answers.len()))]
    pub async fn submit_quiz(
        &self,
        quiz_id: Uuid,
        student_id: Uuid,
        answers: &[SubmittedAnswer],
    ) -> Result<SubmitOutcome> {
        let (quiz, _) = self
            .open_quiz(quiz_id, Actor::Student(student_id), Capability::TakeQuiz)
            .await?;
        let latest = self.store.latest_attempt(student_id, quiz_id).await?;

        match (AttemptState::from_latest(latest.as_ref()), latest) {
            (AttemptState::Passed, Some(passed)) => {
                tracing::info!(quiz = %quiz_id, student = %student_id, "already passed, nothing recorded");
                Ok(SubmitOutcome::AlreadyPassed(AttemptSummary::new(
                    &passed,
                    quiz.question_count(),
                )))
            }
            (_, latest) => {
                let summary = self
                    .record_attempt(&quiz, student_id, answers, latest.as_ref())
                    .await?;
                Ok(SubmitOutcome::Scored(summary))
            }
        }
    }

    /// Retake a failed quiz. Requires a previous attempt that did not pass.
    #[tracing::instrument(skip(self, answers), fields(answers = answers.len()))]
    pub async fn retake_quiz(
        &self,
        quiz_id: Uuid,
        student_id: Uuid,
        answers: &[SubmittedAnswer],
    ) -> Result<SubmitOutcome> {
        let (quiz, _) = self
            .open_quiz(quiz_id, Actor::Student(student_id), Capability::TakeQuiz)
            .await?;
        let latest = self.store.latest_attempt(student_id, quiz_id).await?;

        match AttemptState::from_latest(latest.as_ref()) {
            AttemptState::NoAttempt => Err(AssessmentError::InvalidState(
                "there is no previous attempt to retake".into(),
            )),
            AttemptState::Passed => Err(AssessmentError::InvalidState(
                "you have already passed this quiz".into(),
            )),
            AttemptState::Failed => {
                let summary = self
                    .record_attempt(&quiz, student_id, answers, latest.as_ref())
                    .await?;
                Ok(SubmitOutcome::Scored(summary))
            }
        }
    }

    /// Whether the student's latest attempt failed.
    #[tracing::instrument(skip(self))]
    pub async fn can_retake(&self, quiz_id: Uuid, student_id: Uuid) -> Result<bool> {
        Ok(self.attempt_state(quiz_id, student_id).await?.can_retake())
    }

    /// Whether the student has any attempt on the quiz.
    #[tracing::instrument(skip(self))]
    pub async fn has_taken(&self, quiz_id: Uuid, student_id: Uuid) -> Result<bool> {
        Ok(self.attempt_state(quiz_id, student_id).await? != AttemptState::NoAttempt)
    }

    /// Whether the student's latest attempt passed.
    #[tracing::instrument(skip(self))]
    pub async fn has_passed(&self, quiz_id: Uuid, student_id: Uuid) -> Result<bool> {
        Ok(self.attempt_state(quiz_id, student_id).await? == AttemptState::Passed)
    }

    /// The student's latest result on a quiz.
    #[tracing::instrument(skip(self))]
    pub async fn get_result(&self, quiz_id: Uuid, student_id: Uuid) -> Result<QuizResult> {
        let (quiz, _) = self
            .open_quiz(quiz_id, Actor::Student(student_id), Capability::TakeQuiz)
            .await?;
        let latest = self
            .store
            .latest_attempt(student_id, quiz_id)
            .await?
            .ok_or_else(|| {
                AssessmentError::NotFound("no attempt found for this quiz".into())
            })?;

        Ok(QuizResult {
            quiz_id,
            quiz_title: quiz.title.clone(),
            student_id,
            score: latest.score,
            total_questions: quiz.question_count(),
            passed: latest.passed,
            taken_at: latest.taken_at,
        })
    }

    /// Whether the student has passed every quiz attached to a lesson.
    #[tracing::instrument(skip(self))]
    pub async fn lesson_unlocked(&self, lesson_id: Uuid, student_id: Uuid) -> Result<bool> {
        let scope = self.lesson_scope(lesson_id).await?;
        self.authorize(Actor::Student(student_id), &scope, Capability::TakeQuiz)
            .await?;

        let quizzes = self.store.quizzes_for_lesson(lesson_id).await?;
        let latest = try_join_all(
            quizzes
                .iter()
                .map(|q| self.store.latest_attempt(student_id, q.id)),
        )
        .await?;

        Ok(latest
            .iter()
            .all(|a| AttemptState::from_latest(a.as_ref()) == AttemptState::Passed))
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    async fn attempt_state(&self, quiz_id: Uuid, student_id: Uuid) -> Result<AttemptState> {
        self.open_quiz(quiz_id, Actor::Student(student_id), Capability::TakeQuiz)
            .await?;
        let latest = self.store.latest_attempt(student_id, quiz_id).await?;
        Ok(AttemptState::from_latest(latest.as_ref()))
    }

    /// Score a submission and append it as a new attempt.
    ///
    /// The write is conditional on `previous` still being the latest attempt.
    async fn record_attempt(
        &self,
        quiz: &Quiz,
        student_id: Uuid,
        answers: &[SubmittedAnswer],
        previous: Option<&Attempt>,
    ) -> Result<AttemptSummary> {
        let card = score_submission(&AnswerKey::from_quiz(quiz), answers);
        tracing::debug!(
            quiz = %quiz.id,
            score = card.score,
            total = card.total,
            ignored = answers.len() - card.accepted.len(),
            "submission scored"
        );

        // Latest is decided by timestamp, so never go backwards.
        let now = Utc::now();
        let taken_at = previous.map_or(now, |p| now.max(p.taken_at));

        let attempt = Attempt {
            id: Uuid::new_v4(),
            student_id,
            quiz_id: quiz.id,
            taken_at,
            score: card.score,
            passed: card.passed,
        };
        let record = AttemptRecord {
            answers: card
                .accepted
                .iter()
                .map(|a| StudentAnswer {
                    id: Uuid::new_v4(),
                    attempt_id: attempt.id,
                    question_id: a.question_id,
                    answer_id: a.answer_id,
                })
                .collect(),
            attempt,
        };

        if let Err(e) = self
            .store
            .record_attempt(&record, previous.map(|p| p.id))
            .await
        {
            if matches!(e, StoreError::Conflict { .. }) {
                tracing::warn!(quiz = %quiz.id, student = %student_id, "concurrent attempt detected");
            }
            return Err(e.into());
        }

        tracing::info!(
            quiz = %quiz.id,
            student = %student_id,
            attempt = %record.attempt.id,
            score = record.attempt.score,
            passed = record.attempt.passed,
            "attempt recorded"
        );
        Ok(AttemptSummary::new(&record.attempt, quiz.question_count()))
    }

    /// Load a quiz, resolve its course, and check the actor may use it.
    async fn open_quiz(
        &self,
        quiz_id: Uuid,
        actor: Actor,
        capability: Capability,
    ) -> Result<(Quiz, CourseScope)> {
        let quiz = self
            .store
            .find_quiz(quiz_id)
            .await?
            .ok_or_else(|| quiz_not_found(quiz_id))?;
        let scope = self.lesson_scope(quiz.lesson_id).await?;
        self.authorize(actor, &scope, capability).await?;
        Ok((quiz, scope))
    }

    async fn lesson_scope(&self, lesson_id: Uuid) -> Result<CourseScope> {
        let lesson = self
            .store
            .find_lesson(lesson_id)
            .await?
            .ok_or_else(|| AssessmentError::NotFound(format!("lesson {lesson_id} not found")))?;
        let course = self
            .store
            .find_course(lesson.course_id)
            .await?
            .ok_or_else(|| {
                AssessmentError::NotFound(format!("course {} not found", lesson.course_id))
            })?;
        Ok(CourseScope { lesson, course })
    }

    async fn authorize(
        &self,
        actor: Actor,
        scope: &CourseScope,
        capability: Capability,
    ) -> Result<()> {
        authorize(self.enrollment.as_ref(), actor, scope, capability).await
    }
}

fn quiz_not_found(quiz_id: Uuid) -> AssessmentError {
    AssessmentError::NotFound(format!("quiz {quiz_id} not found"))
}

/// Turn a validated draft into a quiz with every identifier assigned.
fn build_quiz(draft: &QuizDraft) -> Quiz {
    let quiz_id = Uuid::new_v4();
    let questions = draft
        .questions
        .iter()
        .map(|q| {
            let question_id = Uuid::new_v4();
            let answers: Vec<Answer> = q
                .answers
                .iter()
                .map(|a| Answer {
                    id: Uuid::new_v4(),
                    question_id,
                    text: a.text.clone(),
                    is_correct: a.is_correct,
                })
                .collect();
            let correct_answer_id = answers
                .iter()
                .find(|a| a.is_correct)
                .map_or(Uuid::nil(), |a| a.id);
            Question {
                id: question_id,
                quiz_id,
                text: q.text.clone(),
                answers,
                correct_answer_id,
            }
        })
        .collect();

    Quiz {
        id: quiz_id,
        title: draft.title.clone(),
        description: draft.description.clone(),
        lesson_id: draft.lesson_id,
        questions,
    }
}
