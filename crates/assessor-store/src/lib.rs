//! assessor-store — Storage backends for the quiz engine.
//!
//! Implements the `QuizStore` and `EnrollmentGate` traits over process
//! memory and over a JSON data file, and builds engines from configuration.

pub mod config;
pub mod file;
pub mod memory;

pub use config::{create_engine, load_config, AssessorConfig, StoreConfig};
pub use file::FileStore;
pub use memory::{Dataset, MemoryStore};
