//! The `assessor attempts` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};
use uuid::Uuid;

use assessor_core::report::QuizAttemptsReport;
use assessor_store::AssessorConfig;

use super::open_engine;

pub async fn execute(
    config: &AssessorConfig,
    quiz_id: Uuid,
    instructor: Uuid,
    json_out: Option<PathBuf>,
    markdown_out: Option<PathBuf>,
) -> Result<()> {
    let engine = open_engine(config)?;
    let report = engine.quiz_attempts(quiz_id, instructor).await?;

    print_summary(&report);

    if let Some(path) = json_out {
        report.save_json(&path)?;
        eprintln!("Report saved to: {}", path.display());
    }
    if let Some(path) = markdown_out {
        std::fs::write(&path, report.to_markdown())?;
        eprintln!("Markdown report: {}", path.display());
    }

    Ok(())
}

fn print_summary(report: &QuizAttemptsReport) {
    println!(
        "{}: {} attempt(s), {} passed, pass mark {}/{}",
        report.quiz.title,
        report.attempts.len(),
        report.passed_count(),
        report.quiz.pass_threshold,
        report.quiz.question_count
    );
    if report.attempts.is_empty() {
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["Student", "Taken", "Score", "Passed", "Answers"]);

    for line in &report.attempts {
        table.add_row(vec![
            Cell::new(line.student_id),
            Cell::new(line.taken_at.format("%Y-%m-%d %H:%M:%S")),
            Cell::new(format!("{}/{}", line.score, report.quiz.question_count)),
            Cell::new(if line.passed { "yes" } else { "no" }),
            Cell::new(line.answers_recorded),
        ]);
    }

    println!("{table}");
}
