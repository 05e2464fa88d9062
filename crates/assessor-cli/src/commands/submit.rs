//! The `assessor submit` and `assessor retake` commands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use uuid::Uuid;

use assessor_core::model::{SubmitOutcome, SubmittedAnswer};
use assessor_store::AssessorConfig;

use super::open_engine;

#[derive(Args)]
pub struct SubmitArgs {
    /// Quiz being answered
    #[arg(long)]
    quiz_id: Uuid,

    /// Student answering
    #[arg(long)]
    student: Uuid,

    /// Answers as comma-separated `question=answer` id pairs
    #[arg(long, conflicts_with = "answers_file", required_unless_present = "answers_file")]
    answers: Option<String>,

    /// JSON file holding `[{"question_id": ..., "answer_id": ...}]`
    #[arg(long)]
    answers_file: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

pub async fn execute(config: &AssessorConfig, args: SubmitArgs, retake: bool) -> Result<()> {
    let answers = match (&args.answers, &args.answers_file) {
        (Some(pairs), _) => parse_answers(pairs)?,
        (None, Some(path)) => load_answers(path)?,
        (None, None) => anyhow::bail!("either --answers or --answers-file is required"),
    };

    let engine = open_engine(config)?;
    let outcome = if retake {
        engine.retake_quiz(args.quiz_id, args.student, &answers).await?
    } else {
        engine.submit_quiz(args.quiz_id, args.student, &answers).await?
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    let summary = outcome.summary();
    let verdict = if summary.passed { "passed" } else { "failed" };
    match &outcome {
        SubmitOutcome::Scored(_) => println!(
            "Scored {}/{} ({verdict}), attempt {}",
            summary.score, summary.total_questions, summary.attempt_id
        ),
        SubmitOutcome::AlreadyPassed(_) => println!(
            "Already passed with {}/{}, nothing recorded",
            summary.score, summary.total_questions
        ),
    }
    Ok(())
}

/// Parse `question=answer,question=answer`.
fn parse_answers(pairs: &str) -> Result<Vec<SubmittedAnswer>> {
    pairs
        .split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| -> Result<SubmittedAnswer> {
            let (question, answer) = pair
                .split_once('=')
                .with_context(|| format!("expected question=answer, got '{pair}'"))?;
            Ok(SubmittedAnswer {
                question_id: question
                    .trim()
                    .parse()
                    .with_context(|| format!("invalid question id in '{pair}'"))?,
                answer_id: answer
                    .trim()
                    .parse()
                    .with_context(|| format!("invalid answer id in '{pair}'"))?,
            })
        })
        .collect()
}

fn load_answers(path: &Path) -> Result<Vec<SubmittedAnswer>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read answers file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse answers file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_answer_pairs() {
        let q = Uuid::new_v4();
        let a = Uuid::new_v4();
        let q2 = Uuid::new_v4();
        let a2 = Uuid::new_v4();

        let parsed = parse_answers(&format!("{q}={a}, {q2} = {a2},")).unwrap();
        assert_eq!(
            parsed,
            vec![
                SubmittedAnswer {
                    question_id: q,
                    answer_id: a
                },
                SubmittedAnswer {
                    question_id: q2,
                    answer_id: a2
                },
            ]
        );
        assert!(parse_answers("").unwrap().is_empty());
    }

    #[test]
    fn parse_answer_pairs_rejects_garbage() {
        assert!(parse_answers("not-a-pair").is_err());
        assert!(parse_answers(&format!("{}=nope", Uuid::new_v4())).is_err());
    }

    #[test]
    fn load_answers_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("answers.json");
        let q = Uuid::new_v4();
        let a = Uuid::new_v4();
        std::fs::write(
            &path,
            format!(r#"[{{"question_id": "{q}", "answer_id": "{a}"}}]"#),
        )
        .unwrap();

        let answers = load_answers(&path).unwrap();
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].answer_id, a);
    }
}
