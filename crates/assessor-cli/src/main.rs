//! assessor CLI, the operator-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use uuid::Uuid;

use assessor_core::AssessmentError;

mod commands;

#[derive(Parser)]
#[command(name = "assessor", version, about = "Quiz assessment engine")]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter config, a seeded data file and an example quiz
    Init,

    /// Validate quiz definition TOML files
    Validate {
        /// Path to quiz file or directory
        #[arg(long)]
        quiz: PathBuf,
    },

    /// Create a quiz from a definition file
    CreateQuiz {
        /// Path to quiz definition TOML
        #[arg(long)]
        quiz: PathBuf,

        /// Instructor who owns the lesson's course
        #[arg(long)]
        instructor: Uuid,
    },

    /// Show a quiz as a student sees it
    ShowQuiz {
        /// Quiz to show
        #[arg(long, conflicts_with = "lesson", required_unless_present = "lesson")]
        quiz_id: Option<Uuid>,

        /// Show the quiz attached to this lesson instead
        #[arg(long)]
        lesson: Option<Uuid>,

        /// Student viewing the quiz
        #[arg(long)]
        student: Uuid,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Submit answers to a quiz
    Submit {
        #[command(flatten)]
        args: commands::submit::SubmitArgs,
    },

    /// Retake a failed quiz
    Retake {
        #[command(flatten)]
        args: commands::submit::SubmitArgs,
    },

    /// Whether the student's latest attempt failed and may be retaken
    CanRetake {
        #[arg(long)]
        quiz_id: Uuid,

        #[arg(long)]
        student: Uuid,
    },

    /// Show the student's latest result
    #[command(name = "result")]
    ShowResult {
        #[arg(long)]
        quiz_id: Uuid,

        #[arg(long)]
        student: Uuid,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Whether the student has passed every quiz on a lesson
    LessonStatus {
        #[arg(long)]
        lesson: Uuid,

        #[arg(long)]
        student: Uuid,
    },

    /// List every attempt on a quiz
    Attempts {
        #[arg(long)]
        quiz_id: Uuid,

        /// Instructor who owns the quiz's course
        #[arg(long)]
        instructor: Uuid,

        /// Also write the report as JSON
        #[arg(long)]
        json_out: Option<PathBuf>,

        /// Also write the report as markdown
        #[arg(long)]
        markdown_out: Option<PathBuf>,
    },

    /// Delete a quiz and every attempt on it
    DeleteQuiz {
        #[arg(long)]
        quiz_id: Uuid,

        /// Instructor who owns the quiz's course
        #[arg(long)]
        instructor: Uuid,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match cli.config.as_deref() {
        Some(path) => assessor_store::config::load_config_from(Some(path)),
        None => assessor_store::load_config(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    };

    let directive = format!("assessor={}", config.log_level)
        .parse()
        .unwrap_or_else(|_| "assessor=info".parse().unwrap());
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(directive))
        .init();

    let result = match cli.command {
        Commands::Init => {
            let path = cli.config.unwrap_or_else(|| PathBuf::from("assessor.toml"));
            commands::init::execute(&config, &path)
        }
        Commands::Validate { quiz } => commands::validate::execute(quiz),
        Commands::CreateQuiz { quiz, instructor } => {
            commands::create_quiz::execute(&config, quiz, instructor).await
        }
        Commands::ShowQuiz {
            quiz_id,
            lesson,
            student,
            json,
        } => commands::show_quiz::execute(&config, quiz_id, lesson, student, json).await,
        Commands::Submit { args } => commands::submit::execute(&config, args, false).await,
        Commands::Retake { args } => commands::submit::execute(&config, args, true).await,
        Commands::CanRetake { quiz_id, student } => {
            commands::status::can_retake(&config, quiz_id, student).await
        }
        Commands::ShowResult {
            quiz_id,
            student,
            json,
        } => commands::status::result(&config, quiz_id, student, json).await,
        Commands::LessonStatus { lesson, student } => {
            commands::status::lesson(&config, lesson, student).await
        }
        Commands::Attempts {
            quiz_id,
            instructor,
            json_out,
            markdown_out,
        } => commands::attempts::execute(&config, quiz_id, instructor, json_out, markdown_out).await,
        Commands::DeleteQuiz {
            quiz_id,
            instructor,
        } => commands::delete_quiz::execute(&config, quiz_id, instructor).await,
    };

    if let Err(e) = result {
        match e.downcast_ref::<AssessmentError>() {
            Some(err) => eprintln!("Error: {}", err.user_message()),
            None => eprintln!("Error: {e:#}"),
        }
        process::exit(1);
    }
}
