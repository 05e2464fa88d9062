//! TOML quiz definition parser.
//!
//! Loads quiz drafts from TOML files and directories, and validates them.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AssessmentError;
use crate::model::{AnswerDraft, QuestionDraft, QuizDraft};

/// Intermediate TOML structure for parsing quiz definition files.
#[derive(Debug, Deserialize)]
struct TomlQuizFile {
    quiz: TomlQuizHeader,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlQuizHeader {
    title: String,
    #[serde(default)]
    description: String,
    lesson_id: Uuid,
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    text: String,
    #[serde(default)]
    answers: Vec<TomlAnswer>,
}

#[derive(Debug, Deserialize)]
struct TomlAnswer {
    text: String,
    #[serde(default)]
    correct: bool,
}

/// Parse a single TOML file into a `QuizDraft`.
pub fn parse_quiz_draft(path: &Path) -> Result<QuizDraft> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read quiz file: {}", path.display()))?;

    parse_quiz_draft_str(&content, path)
}

/// Parse a TOML string into a `QuizDraft` (useful for testing).
pub fn parse_quiz_draft_str(content: &str, source_path: &Path) -> Result<QuizDraft> {
    let parsed: TomlQuizFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let questions = parsed
        .questions
        .into_iter()
        .map(|q| QuestionDraft {
            text: q.text,
            answers: q
                .answers
                .into_iter()
                .map(|a| AnswerDraft {
                    text: a.text,
                    is_correct: a.correct,
                })
                .collect(),
        })
        .collect();

    Ok(QuizDraft {
        title: parsed.quiz.title,
        description: parsed.quiz.description,
        lesson_id: parsed.quiz.lesson_id,
        questions,
    })
}

/// Recursively load all `.toml` quiz files from a directory.
pub fn load_quiz_directory(dir: &Path) -> Result<Vec<QuizDraft>> {
    let mut drafts = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            drafts.extend(load_quiz_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_quiz_draft(&path) {
                Ok(draft) => drafts.push(draft),
                Err(e) => {
                    tracing::warn!("skipping {}: {}", path.display(), e);
                }
            }
        }
    }

    Ok(drafts)
}

/// Enforce the authoring rules a quiz must satisfy before it is stored.
///
/// The title must be non-empty, there must be at least one question, and
/// every question needs text and exactly one answer marked correct.
pub fn check_draft(draft: &QuizDraft) -> Result<(), AssessmentError> {
    if draft.title.trim().is_empty() {
        return Err(AssessmentError::Validation("quiz title is empty".into()));
    }
    if draft.questions.is_empty() {
        return Err(AssessmentError::Validation(
            "a quiz needs at least one question".into(),
        ));
    }

    for (index, question) in draft.questions.iter().enumerate() {
        let number = index + 1;
        if question.text.trim().is_empty() {
            return Err(AssessmentError::Validation(format!(
                "question {number} has no text"
            )));
        }
        let correct = question.answers.iter().filter(|a| a.is_correct).count();
        if correct != 1 {
            return Err(AssessmentError::Validation(format!(
                "question {number} must have exactly one correct answer, found {correct}"
            )));
        }
    }

    Ok(())
}

/// A non-fatal issue found in a quiz draft.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// 1-based question number (if applicable).
    pub question: Option<usize>,
    /// Warning message.
    pub message: String,
}

/// Check a quiz draft for common authoring mistakes that do not block
/// creation.
pub fn validate_draft(draft: &QuizDraft) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if draft.description.trim().is_empty() {
        warnings.push(ValidationWarning {
            question: None,
            message: "description is empty".into(),
        });
    }

    let mut seen_questions = HashSet::new();
    for (index, question) in draft.questions.iter().enumerate() {
        let number = Some(index + 1);

        if !seen_questions.insert(question.text.trim().to_lowercase()) {
            warnings.push(ValidationWarning {
                question: number,
                message: format!("duplicate question text: {}", question.text.trim()),
            });
        }

        if question.answers.len() < 2 {
            warnings.push(ValidationWarning {
                question: number,
                message: format!("only {} answer(s) offered", question.answers.len()),
            });
        }

        let mut seen_answers = HashSet::new();
        for answer in &question.answers {
            if !seen_answers.insert(answer.text.trim().to_lowercase()) {
                warnings.push(ValidationWarning {
                    question: number,
                    message: format!("duplicate answer text: {}", answer.text.trim()),
                });
            }
        }
    }

    warnings
}
