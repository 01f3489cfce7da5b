//! Error types for gantry.
//!
//! Each subsystem reports failures through its own [`thiserror`] enum:
//! [`ConfigError`] for key lookup and `{KEY}` substitution, [`TaskError`]
//! for task resolution and execution, [`LoadError`] for the project file
//! and module loading. [`GantryError`] wraps all three so the engine can
//! return a single type; command handlers map it to exit codes, or into
//! [`anyhow::Error`] where they want to bail with context.
//!
//! Not every [`TaskError`] is a failure: `AlreadyComplete` is a
//! control-flow signal raised when checkers report there is nothing left
//! to do, and callers treat it accordingly.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the gantry engine.
///
/// Aggregates domain-specific sub-errors and is convertible to
/// [`anyhow::Error`] for use at CLI command boundaries.
#[derive(Error, Debug)]
pub enum GantryError {
    /// Configuration-related error (missing key, substitution failure).
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Task execution error or signal.
    #[error("Task execution error: {0}")]
    Task(#[from] TaskError),

    /// Project file or module loading error.
    #[error("Load error: {0}")]
    Load(#[from] LoadError),
}

/// Errors that arise from configuration lookup and string substitution.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A `{KEY}` template referenced a key that is not in the config tree.
    ///
    /// `parent` is the key whose value was being rendered when the lookup
    /// failed, when known.
    #[error("{}", render_missing_key(parent.as_deref(), key))]
    MissingKey {
        /// Key being rendered when the lookup failed, if any.
        parent: Option<String>,
        /// The key that could not be resolved.
        key: String,
    },

    /// A dotted path walked into a value that is not a config group.
    #[error("'{key}' in path '{path}' is not a config group")]
    NotAGroup {
        /// The full dotted path being resolved.
        path: String,
        /// The segment that resolved to a plain value.
        key: String,
    },
}

fn render_missing_key(parent: Option<&str>, key: &str) -> String {
    match parent {
        Some(parent) => format!("Missing config while rendering {parent}: {key}"),
        None => format!("Missing config: {key}"),
    }
}

/// Errors and signals that arise during task resolution and execution.
#[derive(Error, Debug)]
pub enum TaskError {
    /// The task's checkers passed and no dependency ran.
    ///
    /// This is a successful no-op signal, not a failure: at the top level it
    /// maps to its own exit code, and during a dependency descent it is
    /// absorbed by the caller.
    #[error("Task is already complete")]
    AlreadyComplete,

    /// A task body reported failure (non-zero status or an execution error).
    #[error("Task '{task}' failed: {reason}")]
    ExecuteFailed {
        /// Name of the task that failed.
        task: String,
        /// Human-readable reason for the failure.
        reason: String,
    },

    /// The requested name is not in the registry.
    #[error("Unknown task '{0}'")]
    UnknownTask(String),

    /// The task dependency graph contains a cycle.
    #[error("Task dependency cycle detected: {0}")]
    DependencyCycle(String),
}

/// Errors that arise while loading the project file and its modules.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The project configuration file does not exist.
    #[error("Config file not found: {}", path.display())]
    NotFound {
        /// Path that was probed.
        path: PathBuf,
    },

    /// The project file parsed but has no `[init]` entry point.
    #[error("[init] was not found within {}", path.display())]
    MissingInit {
        /// Path of the file that was loaded.
        path: PathBuf,
    },

    /// A module named in `[init] modules` is not a built-in module.
    #[error("Unknown module '{0}'")]
    UnknownModule(String),

    /// The project file contains invalid TOML.
    #[error("Invalid TOML in {}: {source}", path.display())]
    Parse {
        /// Path of the file that failed to parse.
        path: PathBuf,
        /// Underlying TOML error.
        source: toml::de::Error,
    },

    /// An I/O error occurred while reading the project file.
    #[error("IO error reading config file {}: {source}", path.display())]
    Io {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}
