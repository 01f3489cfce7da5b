//! Resolve and execute the requested task, mapping outcomes to exit codes.

use std::sync::Arc;

use tracing::{error, warn};

use crate::cli::Invocation;
use crate::error::{GantryError, TaskError};
use crate::exec::SystemExecutor;
use crate::task::{self, ExecutionFlags, RunContext};

use super::{ExitCode, Session, help};

/// Execute the invocation against a loaded session.
///
/// Task arguments are expanded through the configuration here, at the CLI
/// boundary, before the engine sees them.
#[must_use]
pub fn run(session: &Session, invocation: &Invocation, flags: ExecutionFlags) -> ExitCode {
    if invocation.task == "help" {
        return help::run(session, &invocation.args);
    }

    if session.registry.lookup(&invocation.task).is_none() {
        error!(
            "Unknown task \"{}\", run with --help for list of commands",
            invocation.task
        );
        return ExitCode::UnknownTask;
    }

    let mut args = Vec::with_capacity(invocation.args.len());
    for raw in &invocation.args {
        match session.config.format(raw) {
            Ok(formatted) => args.push(formatted),
            Err(e) => {
                error!("{e}");
                return ExitCode::TaskFailed;
            }
        }
    }

    let ctx = match RunContext::new(session.config.clone(), Arc::new(SystemExecutor)) {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("{e}");
            return ExitCode::TaskFailed;
        }
    };

    match task::execute(&session.registry, &ctx, &invocation.task, &args, flags) {
        Ok(()) => ExitCode::Success,
        Err(GantryError::Task(TaskError::AlreadyComplete)) => {
            warn!("Already complete. Override with --force or --force-all");
            ExitCode::AlreadyComplete
        }
        Err(GantryError::Task(TaskError::UnknownTask(name))) => {
            error!("Unknown task \"{name}\", run with --help for list of commands");
            ExitCode::UnknownTask
        }
        Err(e) => {
            error!("{e}");
            ExitCode::TaskFailed
        }
    }
}
