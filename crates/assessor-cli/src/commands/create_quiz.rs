//! The `assessor create-quiz` command.

use std::path::PathBuf;

use anyhow::Result;
use uuid::Uuid;

use assessor_core::parser;
use assessor_store::AssessorConfig;

use super::open_engine;

pub async fn execute(config: &AssessorConfig, quiz_path: PathBuf, instructor: Uuid) -> Result<()> {
    let draft = parser::parse_quiz_draft(&quiz_path)?;
    for w in parser::validate_draft(&draft) {
        match w.question {
            Some(n) => eprintln!("  [question {n}] WARNING: {}", w.message),
            None => eprintln!("  WARNING: {}", w.message),
        }
    }

    let engine = open_engine(config)?;
    let quiz = engine.create_quiz(instructor, &draft).await?;

    println!("Created quiz {} ({})", quiz.id, quiz.title);
    super::show_quiz::print_questions(&quiz);

    Ok(())
}
