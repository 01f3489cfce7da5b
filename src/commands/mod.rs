//! Top-level command handling: session initialisation, task runs, and help.

pub mod help;
pub mod run;

use std::path::PathBuf;

use tracing::debug;

use crate::config::{Config, loader};
use crate::error::LoadError;
use crate::module;
use crate::task::Registry;

/// Exit codes returned by the CLI. Negative values are errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitCode {
    /// Success.
    Success,
    /// Task is already complete; override with `--force`.
    AlreadyComplete,
    /// The requested task is not registered.
    UnknownTask,
    /// The project file loaded but has no `[init]` entry point.
    NoInit,
    /// The project file does not exist.
    NoConfigFile,
    /// A task body failed.
    TaskFailed,
}

impl ExitCode {
    /// The process exit code for this outcome.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::AlreadyComplete => -1,
            Self::UnknownTask => -2,
            Self::NoInit => -3,
            Self::NoConfigFile => -4,
            Self::TaskFailed => -5,
        }
    }

    /// Whether this outcome is an error.
    #[must_use]
    pub const fn is_error(self) -> bool {
        !matches!(self, Self::Success)
    }
}

/// Everything a run needs: the loaded configuration and task registry.
#[derive(Debug)]
pub struct Session {
    /// Root configuration with project values installed.
    pub config: Config,
    /// Registry holding module and project tasks.
    pub registry: Registry,
}

/// Initialise gantry: seed the configuration, load the `core` module, then
/// load the project file.
///
/// `path` overrides the project file location; by default it comes from
/// `GANTRY_CONFIG` or `<cwd>/gantry.toml`.
///
/// # Errors
///
/// Returns a [`LoadError`] when the project file is missing, unparseable,
/// has no `[init]` table, or names an unknown module.
pub fn init(path: Option<PathBuf>) -> Result<Session, LoadError> {
    let version = option_env!("GANTRY_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
    debug!("gantry v{version}");

    let mut config = Config::with_defaults();
    let mut registry = Registry::new();
    module::load_module("core", &mut config, &mut registry)?;

    let path = path.unwrap_or_else(loader::default_path);
    loader::load_project(&path, &mut config, &mut registry)?;

    Ok(Session { config, registry })
}

/// Map an initialisation failure to its exit code.
#[must_use]
pub fn init_error_code(error: &LoadError) -> ExitCode {
    match error {
        LoadError::NotFound { .. } => ExitCode::NoConfigFile,
        _ => ExitCode::NoInit,
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_match_the_cli_contract() {
        assert_eq!(ExitCode::Success.code(), 0);
        assert_eq!(ExitCode::AlreadyComplete.code(), -1);
        assert_eq!(ExitCode::UnknownTask.code(), -2);
        assert_eq!(ExitCode::NoInit.code(), -3);
        assert_eq!(ExitCode::NoConfigFile.code(), -4);
        assert_eq!(ExitCode::TaskFailed.code(), -5);
    }

    #[test]
    fn only_success_is_not_an_error() {
        assert!(!ExitCode::Success.is_error());
        for code in [
            ExitCode::AlreadyComplete,
            ExitCode::UnknownTask,
            ExitCode::NoInit,
            ExitCode::NoConfigFile,
            ExitCode::TaskFailed,
        ] {
            assert!(code.is_error());
        }
    }

    #[test]
    fn init_loads_project_and_core_module() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gantry.toml");
        std::fs::write(&path, "[init]\n\n[tasks.build]\nrun = \"make\"\n").unwrap();

        let session = init(Some(path)).unwrap();
        assert!(session.registry.contains("build"));
        assert!(session.registry.contains("lint"), "core module is implicit");
    }

    #[test]
    fn init_missing_file_maps_to_no_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = init(Some(dir.path().join("gantry.toml"))).unwrap_err();
        assert_eq!(init_error_code(&err), ExitCode::NoConfigFile);
    }

    #[test]
    fn init_without_init_table_maps_to_no_init() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gantry.toml");
        std::fs::write(&path, "[tasks.build]\nrun = \"make\"\n").unwrap();

        let err = init(Some(path)).unwrap_err();
        assert_eq!(init_error_code(&err), ExitCode::NoInit);
    }
}
