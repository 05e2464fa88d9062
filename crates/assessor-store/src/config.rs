//! Store configuration and factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use assessor_core::QuizEngine;

use crate::file::FileStore;
use crate::memory::MemoryStore;

/// Which backend holds quizzes and attempts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    /// Process memory only. Nothing survives a restart.
    Memory,
    /// A JSON document on disk.
    File {
        #[serde(default = "default_data_path")]
        path: String,
        #[serde(default = "default_true")]
        pretty: bool,
    },
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::File {
            path: default_data_path(),
            pretty: true,
        }
    }
}

fn default_data_path() -> String {
    "./assessor-data/assessor.json".to_string()
}

fn default_true() -> bool {
    true
}

/// Top-level assessor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessorConfig {
    /// Default log level for assessor crates when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Storage backend.
    #[serde(default)]
    pub store: StoreConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AssessorConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            store: StoreConfig::default(),
        }
    }
}

impl AssessorConfig {
    /// Path of the data file, if the store is file-backed.
    pub fn data_path(&self) -> Option<PathBuf> {
        match &self.store {
            StoreConfig::File { path, .. } => Some(PathBuf::from(path)),
            StoreConfig::Memory => None,
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Resolve env vars in a store config.
fn resolve_store_config(config: &StoreConfig) -> StoreConfig {
    match config {
        StoreConfig::Memory => StoreConfig::Memory,
        StoreConfig::File { path, pretty } => StoreConfig::File {
            path: resolve_env_vars(path),
            pretty: *pretty,
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `assessor.toml` in the current directory
/// 2. `~/.config/assessor/config.toml`
///
/// Environment variable override: `ASSESSOR_DATA_FILE`.
pub fn load_config() -> Result<AssessorConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<AssessorConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("assessor.toml");
        if local.exists() {
            Some(local)
        } else if let Some(home) = dirs_path() {
            let global = home.join("config.toml");
            if global.exists() {
                Some(global)
            } else {
                None
            }
        } else {
            None
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<AssessorConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => AssessorConfig::default(),
    };

    // Apply env var overrides
    if let Ok(data_file) = std::env::var("ASSESSOR_DATA_FILE") {
        let pretty = match config.store {
            StoreConfig::File { pretty, .. } => pretty,
            StoreConfig::Memory => true,
        };
        config.store = StoreConfig::File {
            path: data_file,
            pretty,
        };
    }

    config.store = resolve_store_config(&config.store);

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("assessor"))
}

/// Create an engine backed by the configured store.
pub fn create_engine(config: &StoreConfig) -> Result<QuizEngine> {
    match config {
        StoreConfig::Memory => {
            let store = Arc::new(MemoryStore::new());
            Ok(QuizEngine::new(store.clone(), store))
        }
        StoreConfig::File { path, pretty } => {
            let store = Arc::new(
                FileStore::open(path, *pretty)
                    .with_context(|| format!("failed to open data file: {path}"))?,
            );
            Ok(QuizEngine::new(store.clone(), store))
        }
    }
}
