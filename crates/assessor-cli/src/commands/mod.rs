pub mod attempts;
pub mod create_quiz;
pub mod delete_quiz;
pub mod init;
pub mod show_quiz;
pub mod status;
pub mod submit;
pub mod validate;

use anyhow::{Context, Result};

use assessor_core::QuizEngine;
use assessor_store::AssessorConfig;

/// Build an engine over the configured store.
pub fn open_engine(config: &AssessorConfig) -> Result<QuizEngine> {
    if let Some(path) = config.data_path() {
        if !path.exists() {
            tracing::warn!(
                "data file {} does not exist yet, run `assessor init` to seed one",
                path.display()
            );
        }
    }
    assessor_store::create_engine(&config.store).context("failed to open the quiz store")
}
