//! The `help` task: general task listing and per-task help pages.

use tracing::error;

use crate::error::{GantryError, TaskError};
use crate::task::{Registry, status};
use crate::term;

use super::{ExitCode, Session};

/// Run the help command: `help` lists every task by category, `help <task>`
/// renders the task's help page.
#[must_use]
pub fn run(session: &Session, args: &[String]) -> ExitCode {
    match args.first() {
        None => {
            println!("{}", general_help(&session.registry));
            ExitCode::Success
        }
        Some(task) => match task_help(session, task) {
            Ok(page) => {
                println!("{page}");
                ExitCode::Success
            }
            Err(GantryError::Task(TaskError::UnknownTask(name))) => {
                error!("Unknown task \"{name}\", run with --help for list of commands");
                ExitCode::UnknownTask
            }
            Err(e) => {
                error!("{e}");
                ExitCode::TaskFailed
            }
        },
    }
}

/// Render the general help: usage line plus every registered task grouped
/// by category.
#[must_use]
pub fn general_help(registry: &Registry) -> String {
    let mut out = String::new();
    out.push_str("Usage: gantry [--help] [--log LEVEL] [--force] [--force-all] [--clean] [--clean-all] <task> [task-args...]\n\n");
    if registry.is_empty() {
        return out;
    }

    out.push_str("Type 'gantry help <subcommand>' for help on a specific subcommand.\n\n");
    out.push_str("Available subcommands:\n\n");

    let padding = registry.all().map(|t| t.name.len()).max().unwrap_or(0);

    // Group by category. Categories appear in the order they were first
    // registered; uncategorised tasks render under "Misc".
    let mut category_order: Vec<String> = Vec::new();
    let mut categories: std::collections::HashMap<String, Vec<&crate::task::Task>> =
        std::collections::HashMap::new();
    for task in registry.all() {
        let key = task.category.clone().unwrap_or_default();
        if !categories.contains_key(&key) {
            category_order.push(key.clone());
        }
        categories.entry(key).or_default().push(task);
    }

    for key in category_order {
        let Some(mut tasks) = categories.remove(&key) else {
            continue;
        };
        let heading = if key.is_empty() {
            "Misc".to_string()
        } else {
            capitalize(&key)
        };
        out.push_str(&term::paint(term::RED, &format!("[ {heading} ]")));
        out.push('\n');
        tasks.sort_by_key(|t| t.name.to_uppercase());
        for task in tasks {
            out.push_str(&format!(
                "  {:padding$}    {}\n",
                task.name, task.short_description
            ));
        }
        out.push('\n');
    }
    out
}

/// Render the help page for one task.
///
/// # Errors
///
/// Returns [`TaskError::UnknownTask`] for an unregistered name, or a
/// substitution error from the task's description or config table.
pub fn task_help(session: &Session, name: &str) -> Result<String, GantryError> {
    let state_dir = std::path::PathBuf::from(
        session
            .config
            .get_str("BUILDER")
            .map_err(GantryError::Config)?,
    );
    status::render_help(&session.registry, &session.config, &state_dir, name)
}

/// `TESTING` -> `Testing`.
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
    })
}
