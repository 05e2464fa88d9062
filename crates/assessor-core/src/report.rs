//! Instructor-facing attempt reports with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Attempt, Quiz};
use crate::scoring::pass_threshold;

/// Every attempt recorded on one quiz.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizAttemptsReport {
    /// When the report was generated.
    pub created_at: DateTime<Utc>,
    /// The quiz the attempts belong to.
    pub quiz: QuizSummary,
    /// Attempts, oldest first.
    pub attempts: Vec<AttemptLine>,
}

/// Summary of a quiz (without its questions).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizSummary {
    pub id: Uuid,
    pub title: String,
    pub question_count: u32,
    pub pass_threshold: u32,
}

impl From<&Quiz> for QuizSummary {
    fn from(quiz: &Quiz) -> Self {
        Self {
            id: quiz.id,
            title: quiz.title.clone(),
            question_count: quiz.question_count(),
            pass_threshold: pass_threshold(quiz.question_count()),
        }
    }
}

/// One attempt in a report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptLine {
    pub attempt_id: Uuid,
    pub student_id: Uuid,
    pub score: u32,
    pub passed: bool,
    pub taken_at: DateTime<Utc>,
    /// Number of answers stored for the attempt.
    pub answers_recorded: usize,
}

impl AttemptLine {
    pub fn new(attempt: &Attempt, answers_recorded: usize) -> Self {
        Self {
            attempt_id: attempt.id,
            student_id: attempt.student_id,
            score: attempt.score,
            passed: attempt.passed,
            taken_at: attempt.taken_at,
            answers_recorded,
        }
    }
}

impl QuizAttemptsReport {
    pub fn new(quiz: &Quiz, attempts: Vec<AttemptLine>) -> Self {
        Self {
            created_at: Utc::now(),
            quiz: QuizSummary::from(quiz),
            attempts,
        }
    }

    /// Number of attempts that passed.
    pub fn passed_count(&self) -> usize {
        self.attempts.iter().filter(|a| a.passed).count()
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: QuizAttemptsReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Format the report as a markdown table.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**{}:** {} attempts, {} passed (pass mark {}/{})\n\n",
            self.quiz.title,
            self.attempts.len(),
            self.passed_count(),
            self.quiz.pass_threshold,
            self.quiz.question_count
        ));

        if !self.attempts.is_empty() {
            md.push_str("| Student | Taken | Score | Passed | Answers |\n");
            md.push_str("|---------|-------|-------|--------|---------|\n");
            for a in &self.attempts {
                md.push_str(&format!(
                    "| {} | {} | {}/{} | {} | {} |\n",
                    a.student_id,
                    a.taken_at.format("%Y-%m-%d %H:%M:%S"),
                    a.score,
                    self.quiz.question_count,
                    if a.passed { "yes" } else { "no" },
                    a.answers_recorded
                ));
            }
        }

        md
    }
}
