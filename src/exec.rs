//! Process spawning for task bodies and clean hooks.
//!
//! Task commands run with inherited stdio so their output streams straight to
//! the console; the engine only observes the exit status. The [`Executor`]
//! trait exists so tests can substitute a mock and assert on the commands a
//! task would have run.

use anyhow::{Context, Result, bail};
use std::process::Command;

/// Spawn a command with inherited stdio and wait for it, returning the exit
/// status code.
///
/// A status of `-1` is reported when the process was terminated by a signal.
///
/// # Errors
///
/// Returns an error if the program cannot be found on `PATH` or fails to
/// spawn. A non-zero exit is not an error here; interpreting the status is
/// the caller's job.
pub fn call(program: &str, args: &[String]) -> Result<i32> {
    if !which(program) {
        bail!("{program} not found on PATH");
    }
    let status = Command::new(program)
        .args(args)
        .status()
        .with_context(|| format!("failed to execute: {program}"))?;
    Ok(status.code().unwrap_or(-1))
}

/// Check if a program is available on PATH.
#[must_use]
pub fn which(program: &str) -> bool {
    which::which(program).is_ok()
}

/// Trait for executing system commands, enabling test injection.
///
/// Implement this trait to provide mock executors for unit tests.
/// The [`SystemExecutor`] implementation delegates to the real free
/// functions.
pub trait Executor: std::fmt::Debug + Send + Sync {
    /// Spawn a command with inherited stdio and return its exit status code.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be found or fails to spawn.
    /// Non-zero exit codes are returned in the `Ok` value.
    fn call(&self, program: &str, args: &[String]) -> Result<i32>;

    /// Check if a program is available on PATH.
    fn which(&self, program: &str) -> bool;
}

/// The real system executor that delegates to process spawning.
#[derive(Debug)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn call(&self, program: &str, args: &[String]) -> Result<i32> {
        call(program, args)
    }

    fn which(&self, program: &str) -> bool {
        which(program)
    }
}
