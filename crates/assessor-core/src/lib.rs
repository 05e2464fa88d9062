//! assessor-core — Quiz assessment engine, storage ports, and scoring.
//!
//! This crate defines the data model, the persistence and enrollment traits,
//! the scoring policy, and the engine that enforces the attempt lifecycle.

pub mod access;
pub mod engine;
pub mod error;
pub mod model;
pub mod parser;
pub mod report;
pub mod scoring;
pub mod traits;

pub use engine::QuizEngine;
pub use error::{AssessmentError, StoreError};
