//! The `assessor show-quiz` command.

use anyhow::Result;
use uuid::Uuid;

use assessor_core::model::QuizView;
use assessor_store::AssessorConfig;

use super::open_engine;

pub async fn execute(
    config: &AssessorConfig,
    quiz_id: Option<Uuid>,
    lesson: Option<Uuid>,
    student: Uuid,
    json: bool,
) -> Result<()> {
    let engine = open_engine(config)?;
    let quiz = match (quiz_id, lesson) {
        (Some(quiz_id), _) => engine.get_quiz(quiz_id, student).await?,
        (None, Some(lesson)) => engine.quiz_for_lesson(lesson, student).await?,
        (None, None) => anyhow::bail!("either --quiz-id or --lesson is required"),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&quiz)?);
        return Ok(());
    }

    println!("{} ({})", quiz.title, quiz.id);
    if !quiz.description.is_empty() {
        println!("{}", quiz.description);
    }
    print_questions(&quiz);

    Ok(())
}

/// Numbered question list with the ids a submission needs.
pub fn print_questions(quiz: &QuizView) {
    for (index, question) in quiz.questions.iter().enumerate() {
        println!("\n{}. {} [{}]", index + 1, question.text, question.id);
        for answer in &question.answers {
            println!("   - {} [{}]", answer.text, answer.id);
        }
    }
}
