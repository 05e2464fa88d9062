//! Core data model types for assessor.
//!
//! Quizzes, their questions and answers, student attempts, and the read-only
//! course records the engine consults for enrollment and ownership checks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A quiz attached to a course lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    /// Unique identifier for this quiz.
    pub id: Uuid,
    /// Human-readable title.
    pub title: String,
    /// Free-form description shown to students.
    #[serde(default)]
    pub description: String,
    /// The lesson this quiz belongs to.
    pub lesson_id: Uuid,
    /// Questions in presentation order.
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl Quiz {
    /// Number of questions, the denominator for scoring.
    pub fn question_count(&self) -> u32 {
        self.questions.len() as u32
    }
}

/// A single multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,
    pub quiz_id: Uuid,
    pub text: String,
    #[serde(default)]
    pub answers: Vec<Answer>,
    /// Identifier of the one answer marked correct. `Uuid::nil()` until resolved.
    pub correct_answer_id: Uuid,
}

impl Question {
    /// The answer flagged correct, if exactly one exists.
    pub fn flagged_correct(&self) -> Option<&Answer> {
        let mut correct = self.answers.iter().filter(|a| a.is_correct);
        match (correct.next(), correct.next()) {
            (Some(answer), None) => Some(answer),
            _ => None,
        }
    }
}

/// A possible answer to a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub id: Uuid,
    pub question_id: Uuid,
    pub text: String,
    pub is_correct: bool,
}

/// One student's scored try at one quiz.
///
/// Attempts are append-only: score and pass flag are fixed when the attempt
/// is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attempt {
    pub id: Uuid,
    pub student_id: Uuid,
    pub quiz_id: Uuid,
    pub taken_at: DateTime<Utc>,
    pub score: u32,
    pub passed: bool,
}

/// The answer a student chose for one question within an attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentAnswer {
    pub id: Uuid,
    pub attempt_id: Uuid,
    pub question_id: Uuid,
    pub answer_id: Uuid,
}

/// An attempt together with the answers recorded for it, written as one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub attempt: Attempt,
    pub answers: Vec<StudentAnswer>,
}

/// A `{question, answer}` pair as submitted by a student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubmittedAnswer {
    pub question_id: Uuid,
    pub answer_id: Uuid,
}

/// A course, owned by a single instructor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: Uuid,
    pub name: String,
    pub instructor_id: Uuid,
}

/// A lesson inside a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: Uuid,
    pub name: String,
    pub course_id: Uuid,
}

/// A student's enrollment in a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Enrollment {
    pub student_id: Uuid,
    pub course_id: Uuid,
}

// ---------------------------------------------------------------------------
// Attempt state machine
// ---------------------------------------------------------------------------

/// Where a student stands on a quiz, derived from the latest attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptState {
    NoAttempt,
    Failed,
    Passed,
}

impl AttemptState {
    pub fn from_latest(latest: Option<&Attempt>) -> Self {
        match latest {
            None => AttemptState::NoAttempt,
            Some(a) if a.passed => AttemptState::Passed,
            Some(_) => AttemptState::Failed,
        }
    }

    /// A retake needs a failed attempt to retake.
    pub fn can_retake(self) -> bool {
        self == AttemptState::Failed
    }
}

// ---------------------------------------------------------------------------
// Authoring input
// ---------------------------------------------------------------------------

/// An instructor's quiz definition before identifiers are assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub lesson_id: Uuid,
    #[serde(default)]
    pub questions: Vec<QuestionDraft>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionDraft {
    pub text: String,
    #[serde(default)]
    pub answers: Vec<AnswerDraft>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerDraft {
    pub text: String,
    #[serde(default, alias = "correct")]
    pub is_correct: bool,
}

// ---------------------------------------------------------------------------
// Result shapes returned by the engine
// ---------------------------------------------------------------------------

/// Student-facing view of a quiz. Carries no correctness information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub lesson_id: Uuid,
    pub questions: Vec<QuestionView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionView {
    pub id: Uuid,
    pub text: String,
    pub answers: Vec<AnswerView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerView {
    pub id: Uuid,
    pub text: String,
}

impl From<&Quiz> for QuizView {
    fn from(quiz: &Quiz) -> Self {
        Self {
            id: quiz.id,
            title: quiz.title.clone(),
            description: quiz.description.clone(),
            lesson_id: quiz.lesson_id,
            questions: quiz
                .questions
                .iter()
                .map(|q| QuestionView {
                    id: q.id,
                    text: q.text.clone(),
                    answers: q
                        .answers
                        .iter()
                        .map(|a| AnswerView {
                            id: a.id,
                            text: a.text.clone(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

/// Score and outcome of a single attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptSummary {
    pub attempt_id: Uuid,
    pub quiz_id: Uuid,
    pub student_id: Uuid,
    pub score: u32,
    pub total_questions: u32,
    pub passed: bool,
    pub taken_at: DateTime<Utc>,
}

impl AttemptSummary {
    pub fn new(attempt: &Attempt, total_questions: u32) -> Self {
        Self {
            attempt_id: attempt.id,
            quiz_id: attempt.quiz_id,
            student_id: attempt.student_id,
            score: attempt.score,
            total_questions,
            passed: attempt.passed,
            taken_at: attempt.taken_at,
        }
    }
}

/// Outcome of a submit or retake call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// A new attempt was recorded.
    Scored(AttemptSummary),
    /// The student had already passed; nothing was recorded.
    AlreadyPassed(AttemptSummary),
}

impl SubmitOutcome {
    pub fn summary(&self) -> &AttemptSummary {
        match self {
            SubmitOutcome::Scored(s) | SubmitOutcome::AlreadyPassed(s) => s,
        }
    }

    pub fn is_already_passed(&self) -> bool {
        matches!(self, SubmitOutcome::AlreadyPassed(_))
    }
}

/// A student's latest result on a quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizResult {
    pub quiz_id: Uuid,
    pub quiz_title: String,
    pub student_id: Uuid,
    pub score: u32,
    pub total_questions: u32,
    pub passed: bool,
    pub taken_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempt(passed: bool) -> Attempt {
        Attempt {
            id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
            quiz_id: Uuid::new_v4(),
            taken_at: Utc::now(),
            score: if passed { 3 } else { 1 },
            passed,
        }
    }

    #[test]
    fn attempt_state_from_latest() {
        assert_eq!(AttemptState::from_latest(None), AttemptState::NoAttempt);
        assert_eq!(
            AttemptState::from_latest(Some(&attempt(false))),
            AttemptState::Failed
        );
        assert_eq!(
            AttemptState::from_latest(Some(&attempt(true))),
            AttemptState::Passed
        );
        assert!(AttemptState::Failed.can_retake());
        assert!(!AttemptState::Passed.can_retake());
        assert!(!AttemptState::NoAttempt.can_retake());
    }

    #[test]
    fn flagged_correct_requires_exactly_one() {
        let question_id = Uuid::new_v4();
        let answer = |is_correct| Answer {
            id: Uuid::new_v4(),
            question_id,
            text: "a".into(),
            is_correct,
        };
        let mut question = Question {
            id: question_id,
            quiz_id: Uuid::new_v4(),
            text: "q".into(),
            answers: vec![answer(false), answer(true)],
            correct_answer_id: Uuid::nil(),
        };
        assert_eq!(question.flagged_correct().map(|a| a.id), Some(question.answers[1].id));

        question.answers.push(answer(true));
        assert!(question.flagged_correct().is_none());

        question.answers.retain(|a| !a.is_correct);
        assert!(question.flagged_correct().is_none());
    }

    #[test]
    fn quiz_view_hides_correctness() {
        let quiz_id = Uuid::new_v4();
        let question_id = Uuid::new_v4();
        let correct_id = Uuid::new_v4();
        let quiz = Quiz {
            id: quiz_id,
            title: "Borrowing".into(),
            description: String::new(),
            lesson_id: Uuid::new_v4(),
            questions: vec![Question {
                id: question_id,
                quiz_id,
                text: "Who owns the value?".into(),
                answers: vec![Answer {
                    id: correct_id,
                    question_id,
                    text: "The binding".into(),
                    is_correct: true,
                }],
                correct_answer_id: correct_id,
            }],
        };

        let view = QuizView::from(&quiz);
        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("is_correct"));
        assert!(!json.contains("correct_answer_id"));
        assert_eq!(view.questions[0].answers[0].id, correct_id);
    }

    #[test]
    fn submit_outcome_serializes_with_tag() {
        let a = attempt(true);
        let outcome = SubmitOutcome::AlreadyPassed(AttemptSummary::new(&a, 3));
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "already_passed");
        assert_eq!(json["score"], 3);
        assert!(outcome.is_already_passed());
    }
}
