//! The `assessor validate` command.

use std::path::PathBuf;

use anyhow::Result;

use assessor_core::parser;

pub fn execute(quiz_path: PathBuf) -> Result<()> {
    let drafts = if quiz_path.is_dir() {
        parser::load_quiz_directory(&quiz_path)?
    } else {
        vec![parser::parse_quiz_draft(&quiz_path)?]
    };

    let mut total_errors = 0;
    let mut total_warnings = 0;

    for draft in &drafts {
        println!("Quiz: {} ({} questions)", draft.title, draft.questions.len());

        if let Err(e) = parser::check_draft(draft) {
            println!("  ERROR: {}", e.user_message());
            total_errors += 1;
        }

        let warnings = parser::validate_draft(draft);
        for w in &warnings {
            let prefix = w
                .question
                .map(|n| format!("  [question {n}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_errors > 0 {
        anyhow::bail!("{total_errors} quiz definition(s) invalid");
    }

    if total_warnings == 0 {
        println!("All quizzes valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
