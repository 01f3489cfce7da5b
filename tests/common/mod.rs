// Shared helpers for integration tests.
//
// Provides a temporary-directory-backed project so each integration test can
// set up an isolated gantry.toml (with its own builder directory) without
// repeating filesystem boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use gantry_cli::commands::{self, Session};

/// An isolated gantry project backed by a [`tempfile::TempDir`].
///
/// The directory is deleted automatically when the project is dropped.
pub struct TestProject {
    dir: tempfile::TempDir,
}

impl TestProject {
    /// Create a project whose `gantry.toml` starts from `body`, prefixed
    /// with an `[init]` table and a `[config]` table that pins `BUILDER`
    /// (and a `WORK` key) inside the temp directory.
    ///
    /// `body` may contain the `@WORK@` placeholder; it is substituted here,
    /// at fixture-build time, with the temp directory path. `{WORK}` config
    /// templates pass through untouched and resolve at run time.
    #[allow(clippy::expect_used)]
    pub fn new(body: &str) -> Self {
        let dir = tempfile::tempdir().expect("create temp project dir");
        // Forward slashes keep the path valid inside TOML basic strings on
        // every platform.
        let work = dir.path().display().to_string().replace('\\', "/");
        let toml = format!(
            "[init]\nmodules = []\n\n[config]\nBUILDER = \"{work}/.builder\"\nWORK = \"{work}\"\n\n{}",
            body.replace("@WORK@", &work),
        );
        std::fs::write(dir.path().join("gantry.toml"), toml).expect("write gantry.toml");
        Self { dir }
    }

    /// The project root directory.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Path of the project's `gantry.toml`.
    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("gantry.toml")
    }

    /// Load the project into a fresh session.
    #[allow(clippy::expect_used)]
    pub fn session(&self) -> Session {
        commands::init(Some(self.config_path())).expect("project should load")
    }

    /// Read a marker file written by a task body, if it exists.
    pub fn read(&self, name: &str) -> Option<String> {
        std::fs::read_to_string(self.dir.path().join(name)).ok()
    }

    /// Lines of a marker file written by a task body.
    pub fn lines(&self, name: &str) -> Vec<String> {
        self.read(name)
            .map(|contents| contents.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Write a file inside the project (for checker fixtures).
    #[allow(clippy::expect_used)]
    pub fn write(&self, name: &str, contents: &str) {
        std::fs::write(self.dir.path().join(name), contents).expect("write project file");
    }
}

/// A TOML `run` array that appends `marker` to `file` inside the project.
///
/// Written per-platform so the integration scenarios run everywhere the
/// crate builds.
pub fn append_cmd(file: &str, marker: &str) -> String {
    #[cfg(windows)]
    {
        format!("[\"cmd\", \"/C\", \"echo {marker}>> @WORK@/{file}\"]")
    }
    #[cfg(not(windows))]
    {
        format!("[\"sh\", \"-c\", \"echo {marker} >> @WORK@/{file}\"]")
    }
}
