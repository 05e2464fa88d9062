//! Read-only attempt queries: `can-retake`, `result` and `lesson-status`.

use anyhow::Result;
use uuid::Uuid;

use assessor_store::AssessorConfig;

use super::open_engine;

pub async fn can_retake(config: &AssessorConfig, quiz_id: Uuid, student: Uuid) -> Result<()> {
    let engine = open_engine(config)?;
    println!("{}", engine.can_retake(quiz_id, student).await?);
    Ok(())
}

pub async fn result(config: &AssessorConfig, quiz_id: Uuid, student: Uuid, json: bool) -> Result<()> {
    let engine = open_engine(config)?;
    let result = engine.get_result(quiz_id, student).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("Quiz:    {} ({})", result.quiz_title, result.quiz_id);
    println!("Student: {}", result.student_id);
    println!(
        "Score:   {}/{} ({})",
        result.score,
        result.total_questions,
        if result.passed { "passed" } else { "failed" }
    );
    println!("Taken:   {}", result.taken_at.format("%Y-%m-%d %H:%M:%S UTC"));
    Ok(())
}

pub async fn lesson(config: &AssessorConfig, lesson: Uuid, student: Uuid) -> Result<()> {
    let engine = open_engine(config)?;
    if engine.lesson_unlocked(lesson, student).await? {
        println!("unlocked");
    } else {
        println!("locked: pass the lesson's quiz first");
    }
    Ok(())
}
