//! The `assessor init` command.

use std::path::Path;

use anyhow::{Context, Result};
use uuid::Uuid;

use assessor_store::{AssessorConfig, Dataset, FileStore, StoreConfig};

const EXAMPLE_QUIZ: &str = "quizzes/example.toml";

/// Write `config` to `config_path` unless it exists, then seed the data file
/// the config points at.
pub fn execute(config: &AssessorConfig, config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("{} already exists, skipping.", config_path.display());
    } else {
        let body = toml::to_string_pretty(config).context("failed to render config")?;
        std::fs::write(config_path, format!("# assessor configuration\n\n{body}"))?;
        println!("Created {}", config_path.display());
    }

    let pretty = matches!(config.store, StoreConfig::File { pretty: true, .. });
    let lesson_id = match config.data_path() {
        None => {
            println!("Store is in memory, no data file to seed.");
            None
        }
        Some(data_path) if data_path.exists() => {
            println!("{} already exists, skipping.", data_path.display());
            existing_lesson(&data_path)?
        }
        Some(data_path) => {
            let seed = Seed::new();
            FileStore::create(&data_path, seed.dataset, pretty)
                .with_context(|| format!("failed to write {}", data_path.display()))?;
            println!("Created {}", data_path.display());
            println!("  instructor: {}", seed.instructor);
            println!("  student:    {}", seed.student);
            println!("  lesson:     {}", seed.lesson);
            Some(seed.lesson)
        }
    };

    let example_path = Path::new(EXAMPLE_QUIZ);
    if example_path.exists() {
        println!("{EXAMPLE_QUIZ} already exists, skipping.");
    } else {
        let lesson_id = lesson_id.unwrap_or_else(Uuid::nil);
        std::fs::create_dir_all("quizzes")?;
        std::fs::write(
            example_path,
            EXAMPLE_QUIZ_TOML.replace("{lesson_id}", &lesson_id.to_string()),
        )?;
        println!("Created {EXAMPLE_QUIZ}");
    }

    println!("\nNext steps:");
    println!("  1. Run: assessor validate --quiz {EXAMPLE_QUIZ}");
    println!("  2. Run: assessor create-quiz --quiz {EXAMPLE_QUIZ} --instructor <instructor>");
    println!("  3. Run: assessor show-quiz --quiz-id <quiz> --student <student>");

    Ok(())
}

/// Demo course with one instructor, one lesson and one enrolled student.
struct Seed {
    dataset: Dataset,
    instructor: Uuid,
    student: Uuid,
    lesson: Uuid,
}

impl Seed {
    fn new() -> Self {
        let mut dataset = Dataset::default();
        let instructor = Uuid::new_v4();
        let student = Uuid::new_v4();
        let course = dataset.add_course("Introduction to Rust", instructor);
        let lesson = dataset.add_lesson("Ownership and borrowing", course);
        dataset.enroll(student, course);
        Self {
            dataset,
            instructor,
            student,
            lesson,
        }
    }
}

fn existing_lesson(path: &Path) -> Result<Option<Uuid>> {
    let store = FileStore::open(path, true)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(store.snapshot()?.lessons.first().map(|l| l.id))
}

const EXAMPLE_QUIZ_TOML: &str = r#"[quiz]
title = "Ownership basics"
description = "Checks the three ownership rules"
lesson_id = "{lesson_id}"

[[questions]]
text = "How many owners can a value have at a time?"

[[questions.answers]]
text = "One"
correct = true

[[questions.answers]]
text = "As many as there are references"

[[questions.answers]]
text = "Two, if one is mutable"

[[questions]]
text = "What happens when the owner goes out of scope?"

[[questions.answers]]
text = "The value is dropped"
correct = true

[[questions.answers]]
text = "The value leaks until the program exits"

[[questions]]
text = "Which of these moves a String?"

[[questions.answers]]
text = "let b = &a;"

[[questions.answers]]
text = "let b = a;"
correct = true

[[questions.answers]]
text = "let b = a.len();"
"#;
