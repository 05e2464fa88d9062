//! Scoring policy for single-correct-answer multiple choice quizzes.
//!
//! One point per correctly answered question; an attempt passes at 70% of
//! the question count, rounded up.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Quiz, SubmittedAnswer};

/// Pass mark as a fraction of the question count, in tenths.
const PASS_TENTHS: u32 = 7;

/// Minimum score needed to pass a quiz with `total` questions.
///
/// `ceil(0.7 * total)` in integer arithmetic, so exactly 70% passes.
pub fn pass_threshold(total: u32) -> u32 {
    (PASS_TENTHS * total).div_ceil(10)
}

/// Maps each question to the id of its correct answer.
#[derive(Debug, Clone, Default)]
pub struct AnswerKey {
    correct: HashMap<Uuid, Uuid>,
}

impl AnswerKey {
    pub fn new(correct: HashMap<Uuid, Uuid>) -> Self {
        Self { correct }
    }

    pub fn from_quiz(quiz: &Quiz) -> Self {
        Self {
            correct: quiz
                .questions
                .iter()
                .map(|q| (q.id, q.correct_answer_id))
                .collect(),
        }
    }

    pub fn total(&self) -> u32 {
        self.correct.len() as u32
    }

    pub fn contains(&self, question_id: Uuid) -> bool {
        self.correct.contains_key(&question_id)
    }

    pub fn is_correct(&self, answer: &SubmittedAnswer) -> bool {
        self.correct.get(&answer.question_id) == Some(&answer.answer_id)
    }
}

/// The scored outcome of one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreCard {
    pub score: u32,
    pub total: u32,
    pub passed: bool,
    /// Submitted pairs that count: known questions, first answer per question.
    pub accepted: Vec<SubmittedAnswer>,
}

/// Score a submission against an answer key.
///
/// Pairs for unknown questions are ignored. When a question is answered more
/// than once, only the first answer is kept.
pub fn score_submission(key: &AnswerKey, submitted: &[SubmittedAnswer]) -> ScoreCard {
    let mut seen = HashSet::new();
    let accepted: Vec<SubmittedAnswer> = submitted
        .iter()
        .filter(|a| key.contains(a.question_id) && seen.insert(a.question_id))
        .copied()
        .collect();

    let score = accepted.iter().filter(|a| key.is_correct(a)).count() as u32;
    let total = key.total();

    ScoreCard {
        score,
        total,
        passed: score >= pass_threshold(total),
        accepted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_with(n: usize) -> (AnswerKey, Vec<(Uuid, Uuid)>) {
        let pairs: Vec<(Uuid, Uuid)> = (0..n).map(|_| (Uuid::new_v4(), Uuid::new_v4())).collect();
        (AnswerKey::new(pairs.iter().copied().collect()), pairs)
    }

    fn submit(question_id: Uuid, answer_id: Uuid) -> SubmittedAnswer {
        SubmittedAnswer {
            question_id,
            answer_id,
        }
    }

    #[test]
    fn threshold_rounds_up() {
        assert_eq!(pass_threshold(0), 0);
        assert_eq!(pass_threshold(1), 1);
        assert_eq!(pass_threshold(3), 3);
        assert_eq!(pass_threshold(4), 3);
        assert_eq!(pass_threshold(10), 7);
        assert_eq!(pass_threshold(11), 8);
    }

    #[test]
    fn exact_seventy_percent_passes() {
        let (key, pairs) = key_with(10);
        let answers: Vec<_> = pairs.iter().take(7).map(|&(q, a)| submit(q, a)).collect();
        let card = score_submission(&key, &answers);
        assert_eq!(card.score, 7);
        assert!(card.passed);
    }

    #[test]
    fn two_of_three_fails() {
        let (key, pairs) = key_with(3);
        let answers = vec![
            submit(pairs[0].0, pairs[0].1),
            submit(pairs[1].0, pairs[1].1),
            submit(pairs[2].0, Uuid::new_v4()),
        ];
        let card = score_submission(&key, &answers);
        assert_eq!(card.score, 2);
        assert_eq!(card.total, 3);
        assert!(!card.passed);
        assert_eq!(card.accepted.len(), 3);
    }

    #[test]
    fn unknown_questions_ignored() {
        let (key, pairs) = key_with(2);
        let answers = vec![
            submit(Uuid::new_v4(), pairs[0].1),
            submit(pairs[0].0, pairs[0].1),
        ];
        let card = score_submission(&key, &answers);
        assert_eq!(card.score, 1);
        assert_eq!(card.accepted.len(), 1);
    }

    #[test]
    fn duplicate_answers_keep_first() {
        let (key, pairs) = key_with(1);
        let (q, a) = pairs[0];

        let wrong_then_right = vec![submit(q, Uuid::new_v4()), submit(q, a)];
        let card = score_submission(&key, &wrong_then_right);
        assert_eq!(card.score, 0);
        assert_eq!(card.accepted, vec![wrong_then_right[0]]);

        let right_repeated = vec![submit(q, a), submit(q, a), submit(q, a)];
        let card = score_submission(&key, &right_repeated);
        assert_eq!(card.score, 1);
        assert_eq!(card.accepted.len(), 1);
    }

    #[test]
    fn score_never_exceeds_total() {
        for n in 0..=12 {
            let (key, pairs) = key_with(n);
            let mut answers: Vec<_> = pairs.iter().map(|&(q, a)| submit(q, a)).collect();
            answers.extend(answers.clone());
            for take in 0..=answers.len() {
                let card = score_submission(&key, &answers[..take]);
                assert!(card.score <= card.total);
                assert_eq!(card.passed, card.score >= pass_threshold(card.total));
            }
        }
    }

    #[test]
    fn empty_submission_scores_zero() {
        let (key, _) = key_with(4);
        let card = score_submission(&key, &[]);
        assert_eq!(card.score, 0);
        assert!(!card.passed);
        assert!(card.accepted.is_empty());
    }
}
