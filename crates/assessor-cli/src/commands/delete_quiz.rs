//! The `assessor delete-quiz` command.

use anyhow::Result;
use uuid::Uuid;

use assessor_store::AssessorConfig;

use super::open_engine;

pub async fn execute(config: &AssessorConfig, quiz_id: Uuid, instructor: Uuid) -> Result<()> {
    let engine = open_engine(config)?;
    engine.delete_quiz(quiz_id, instructor).await?;
    println!("Deleted quiz {quiz_id}");
    Ok(())
}
