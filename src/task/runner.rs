//! The execution engine: a strictly sequential, depth-first task walk.
//!
//! For each node the engine runs the clean hook (under `--clean`), executes
//! dependencies in declaration order, probes checkers, and then either skips
//! the body ([`TaskError::AlreadyComplete`]) or runs it and persists checker
//! state. Only the `*_all` flag variants propagate to dependencies; the
//! plain variants are re-derived from them at each level, which is what
//! keeps `--force` scoped to the root while `--force-all` cascades.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use crate::checker::Checker;
use crate::config::Config;
use crate::error::{GantryError, TaskError};
use crate::exec::Executor;

use super::graph;
use super::registry::Registry;
use super::{CleanHook, Task, TaskBody};

/// Execution flags for one top-level invocation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExecutionFlags {
    /// Run the root task's clean hook before its body.
    pub clean: bool,
    /// Run every reachable task's clean hook; implies `clean` and
    /// `force_all`.
    pub clean_all: bool,
    /// Bypass checker probing on the root task.
    pub force: bool,
    /// Bypass checker probing on the entire subtree; implies `force`.
    pub force_all: bool,
}

impl ExecutionFlags {
    /// Apply the flag implications: `clean_all` ⇒ `clean` + `force_all`,
    /// `clean` ⇒ `force`, `force_all` ⇒ `force`.
    #[must_use]
    pub const fn normalized(mut self) -> Self {
        if self.clean_all {
            self.clean = true;
            self.force_all = true;
        }
        if self.clean {
            self.force = true;
        }
        if self.force_all {
            self.force = true;
        }
        self
    }

    /// Flags handed to dependencies: only the `*_all` variants propagate,
    /// and the non-all variants are re-derived from them.
    #[must_use]
    pub const fn for_dependencies(self) -> Self {
        Self {
            clean: self.clean_all,
            clean_all: self.clean_all,
            force: self.force_all,
            force_all: self.force_all,
        }
    }
}

/// Shared, read-only state for one top-level invocation.
#[derive(Debug)]
pub struct RunContext {
    /// Root configuration; command argv elements are substituted against it.
    pub config: Config,
    /// Process spawner for command bodies and clean hooks.
    pub executor: Arc<dyn Executor>,
    /// Directory holding persisted checker state.
    pub state_dir: PathBuf,
}

impl RunContext {
    /// Build a context, deriving the state directory from the `BUILDER`
    /// config key.
    ///
    /// # Errors
    ///
    /// Returns an error if `BUILDER` is missing or fails substitution.
    pub fn new(config: Config, executor: Arc<dyn Executor>) -> Result<Self, GantryError> {
        let state_dir = PathBuf::from(config.get_str("BUILDER").map_err(GantryError::Config)?);
        Ok(Self {
            config,
            executor,
            state_dir,
        })
    }
}

/// Execute `name` and its transitive dependencies.
///
/// `args` are passed to the root task's body only; dependencies receive an
/// empty argument list. The dependency graph is validated (unknown names,
/// cycles) before any side effects.
///
/// # Errors
///
/// Returns [`TaskError::AlreadyComplete`] when the root's checkers pass and
/// no dependency ran, [`TaskError::ExecuteFailed`] when a body or hook
/// fails, and graph errors for unknown or cyclic dependencies.
pub fn execute(
    registry: &Registry,
    ctx: &RunContext,
    name: &str,
    args: &[String],
    flags: ExecutionFlags,
) -> Result<(), GantryError> {
    let flags = flags.normalized();

    // Validate the whole graph up front so a cycle or dangling name cannot
    // abort a run halfway through its side effects.
    graph::tree(registry, name, true, false)?;

    let task = registry
        .lookup(name)
        .ok_or_else(|| TaskError::UnknownTask(name.to_string()))?;
    execute_node(registry, ctx, task, args, flags)
}

fn execute_node(
    registry: &Registry,
    ctx: &RunContext,
    task: &Task,
    args: &[String],
    flags: ExecutionFlags,
) -> Result<(), GantryError> {
    debug!(
        "[exec] {}({}) force={} clean={}",
        task.name,
        args.join(" "),
        flags.force,
        flags.clean
    );

    if flags.clean
        && let Some(hook) = &task.clean
    {
        debug!("Cleaning task: {}", task.name);
        run_clean(ctx, task, hook)?;
    }

    // Execute dependencies. AlreadyComplete is absorbed: it means the child
    // did not run, not that something went wrong.
    let dep_flags = flags.for_dependencies().normalized();
    let mut dependency_ran = false;
    for dep_name in &task.depends {
        let dep = registry
            .lookup(dep_name)
            .ok_or_else(|| TaskError::UnknownTask(dep_name.clone()))?;
        match execute_node(registry, ctx, dep, &[], dep_flags) {
            Ok(()) => dependency_ran = true,
            Err(GantryError::Task(TaskError::AlreadyComplete)) => {}
            Err(e) => return Err(e),
        }
    }

    // Virtual targets aggregate dependencies and nothing else.
    let Some(body) = &task.body else {
        return Ok(());
    };

    let (passes, snapshots) = probe(ctx, task, flags.force)?;
    if passes && !dependency_ran {
        debug!("[skip] {}, already complete.", task.name);
        return Err(TaskError::AlreadyComplete.into());
    }

    run_body(ctx, task, body, args)?;

    // Persist exactly the fingerprints that were probed, not a re-read: the
    // body may have mutated the files the checkers watch.
    for checker in &snapshots {
        checker
            .save(&ctx.state_dir)
            .map_err(|e| TaskError::ExecuteFailed {
                task: task.name.clone(),
                reason: format!("failed to save checker state: {e:#}"),
            })?;
    }
    debug!("[fini] {}", task.name);
    Ok(())
}

/// Probe a task's checkers.
///
/// Clones every checker so the fingerprint is snapshotted at decision time,
/// then invokes `check()` on each clone unless `force` is set, in which case
/// no checker is consulted and the task reports as not complete. Returns
/// `(false, [])` for tasks with no checkers.
fn probe(
    ctx: &RunContext,
    task: &Task,
    force: bool,
) -> Result<(bool, Vec<Box<dyn Checker>>), GantryError> {
    if task.checkers.is_empty() {
        return Ok((false, Vec::new()));
    }

    let snapshots: Vec<Box<dyn Checker>> =
        task.checkers.iter().map(|c| c.clone_box()).collect();
    if force {
        return Ok((false, snapshots));
    }

    let mut passes = true;
    for checker in &snapshots {
        let ok = checker
            .check(&ctx.state_dir)
            .map_err(|e| TaskError::ExecuteFailed {
                task: task.name.clone(),
                reason: format!("checker failed: {e:#}"),
            })?;
        passes = passes && ok;
    }
    Ok((passes, snapshots))
}

fn run_body(
    ctx: &RunContext,
    task: &Task,
    body: &TaskBody,
    args: &[String],
) -> Result<(), GantryError> {
    let status = match body {
        TaskBody::Command(argv) => run_command(ctx, task, argv, args)?,
        TaskBody::Func(f) => f(args).map_err(|e| TaskError::ExecuteFailed {
            task: task.name.clone(),
            reason: format!("{e:#}"),
        })?,
    };
    if status != 0 {
        return Err(TaskError::ExecuteFailed {
            task: task.name.clone(),
            reason: format!("Process returned a non-zero code: {status}"),
        }
        .into());
    }
    Ok(())
}

fn run_command(
    ctx: &RunContext,
    task: &Task,
    argv: &[String],
    args: &[String],
) -> Result<i32, GantryError> {
    let mut expanded = Vec::with_capacity(argv.len() + args.len());
    for part in argv {
        expanded.push(ctx.config.format(part).map_err(GantryError::Config)?);
    }
    expanded.extend(args.iter().cloned());

    let Some((program, rest)) = expanded.split_first() else {
        return Err(TaskError::ExecuteFailed {
            task: task.name.clone(),
            reason: "empty command".to_string(),
        }
        .into());
    };

    info!("{}", expanded.join(" "));
    ctx.executor
        .call(program, rest)
        .map_err(|e| {
            TaskError::ExecuteFailed {
                task: task.name.clone(),
                reason: format!("{e:#}"),
            }
            .into()
        })
}

fn run_clean(ctx: &RunContext, task: &Task, hook: &CleanHook) -> Result<(), GantryError> {
    match hook {
        CleanHook::Command(argv) => {
            let status = run_command(ctx, task, argv, &[])?;
            if status != 0 {
                return Err(TaskError::ExecuteFailed {
                    task: task.name.clone(),
                    reason: format!("clean returned a non-zero code: {status}"),
                }
                .into());
            }
            Ok(())
        }
        CleanHook::Func(f) => f().map_err(|e| {
            TaskError::ExecuteFailed {
                task: task.name.clone(),
                reason: format!("clean failed: {e:#}"),
            }
            .into()
        }),
    }
}
