//! Status trees and per-task help rendering.
//!
//! Uses the same graph builder as execution but probes checkers in
//! read-only mode: clones are checked, never saved. A node's aggregate
//! `passes` is true iff its own checkers pass and every child passes, so
//! incomplete work anywhere in the subtree surfaces at the root.

use std::path::Path;

use serde::Serialize;

use crate::config::Config;
use crate::error::{GantryError, TaskError};
use crate::term;

use super::graph::{self, TreeNode};
use super::registry::Registry;

/// A dependency tree node augmented with checker results.
#[derive(Debug, Serialize)]
pub struct StatusNode {
    /// Task name, or `None` for a synthetic root.
    pub name: Option<String>,
    /// Whether this node's checkers and every child's pass.
    pub passes: bool,
    /// Dependency subtrees.
    pub dependencies: Vec<StatusNode>,
}

/// Build the status tree rooted at `root`.
///
/// # Errors
///
/// Returns graph errors for unknown or cyclic dependencies.
pub fn status(
    registry: &Registry,
    state_dir: &Path,
    root: &str,
    dedupe: bool,
    flatten: bool,
) -> Result<StatusNode, GantryError> {
    let tree = graph::tree(registry, root, dedupe, flatten)?;
    Ok(annotate(registry, state_dir, tree))
}

fn annotate(registry: &Registry, state_dir: &Path, node: TreeNode) -> StatusNode {
    let dependencies: Vec<StatusNode> = node
        .dependencies
        .into_iter()
        .map(|dep| annotate(registry, state_dir, dep))
        .collect();
    let children_pass = dependencies.iter().all(|dep| dep.passes);

    let passes = node.name.as_ref().map_or(children_pass, |name| {
        own_check(registry, state_dir, name) && children_pass
    });

    StatusNode {
        name: node.name,
        passes,
        dependencies,
    }
}

/// Read-only probe of a single task's checkers.
///
/// A task with no checkers never reads as complete. Checker errors read as
/// "not complete" rather than aborting the render.
fn own_check(registry: &Registry, state_dir: &Path, name: &str) -> bool {
    let Some(task) = registry.lookup(name) else {
        return false;
    };
    if task.checkers.is_empty() {
        return false;
    }
    task.checkers
        .iter()
        .all(|checker| checker.clone_box().check(state_dir).unwrap_or(false))
}

/// Render a status tree, one line per node, indented by depth.
///
/// Passing nodes get a green check, pending nodes a gray circle. Synthetic
/// roots are elided; their children render at the same indent.
#[must_use]
pub fn render_status(node: &StatusNode) -> String {
    let mut out = String::new();
    render_node(&mut out, node, 2);
    out
}

fn render_node(out: &mut String, node: &StatusNode, indent: usize) {
    let mut next = indent;
    if let Some(name) = &node.name {
        let icon = if node.passes {
            term::green("✔")
        } else {
            term::gray("○")
        };
        let spacer = "  ".repeat(indent);
        out.push_str(&format!("{spacer}{icon} {name}\n"));
        next += 1;
    }
    for dep in &node.dependencies {
        render_node(out, dep, next);
    }
}

/// Render the help page for a task: name, descriptions, configuration
/// table, and status tree.
///
/// # Errors
///
/// Returns [`TaskError::UnknownTask`] if the task is not registered, or a
/// substitution error from rendering the description or config table.
pub fn render_help(
    registry: &Registry,
    config: &Config,
    state_dir: &Path,
    name: &str,
) -> Result<String, GantryError> {
    let task = registry
        .lookup(name)
        .ok_or_else(|| TaskError::UnknownTask(name.to_string()))?;

    let mut out = String::new();
    out.push_str(&term::bold("NAME\n"));
    out.push_str(&format!("    {} -- {}\n", task.name, task.short_description));

    out.push_str(&term::bold("\nDESCRIPTION\n"));
    if !task.description.is_empty() {
        out.push_str(&config.format(&task.description).map_err(GantryError::Config)?);
        out.push('\n');
    }

    if !task.config_refs.is_empty() {
        out.push_str(&term::bold("\nCONFIGURATION\n"));
        let padding = task
            .config_refs
            .iter()
            .map(|r| r.len())
            .max()
            .unwrap_or(0)
            .saturating_sub(1);
        for reference in &task.config_refs {
            let key = reference
                .get(1..reference.len().saturating_sub(1))
                .unwrap_or(reference);
            let value = config.format(reference).map_err(GantryError::Config)?;
            out.push_str(&format!(
                "    - {:padding$}  {value}\n",
                format!("{key}:"),
                padding = padding
            ));
        }
    }

    out.push_str(&term::bold("\n\nSTATUS\n"));
    let tree = status(registry, state_dir, name, true, true)?;
    out.push_str(&render_status(&tree));
    Ok(out)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::task::Task;
    use crate::task::testing::MockChecker;

    fn state_dir() -> tempfile::TempDir {
        tempfile::tempdir().unwrap()
    }

    fn checked(name: &str, passes: bool) -> Task {
        let checker = if passes {
            MockChecker::passing(name)
        } else {
            MockChecker::failing(name)
        };
        Task::new(name).func(|_| Ok(0)).checker(Box::new(checker))
    }

    // -----------------------------------------------------------------------
    // status aggregation
    // -----------------------------------------------------------------------

    #[test]
    fn passing_chain_aggregates_to_passing_root() {
        let dir = state_dir();
        let mut registry = Registry::new();
        registry.register(checked("root", true).depends(["child"]));
        registry.register(checked("child", true));

        let tree = status(&registry, dir.path(), "root", true, false).unwrap();
        assert!(tree.passes);
    }

    #[test]
    fn failing_leaf_fails_every_ancestor() {
        let dir = state_dir();
        let mut registry = Registry::new();
        registry.register(checked("root", true).depends(["child"]));
        registry.register(checked("child", true).depends(["grandchild"]));
        registry.register(checked("grandchild", false));

        let tree = status(&registry, dir.path(), "root", true, false).unwrap();
        assert!(!tree.passes, "root inherits the failing leaf");
        let child = tree.dependencies.first().unwrap();
        assert!(!child.passes);
        let grandchild = child.dependencies.first().unwrap();
        assert!(!grandchild.passes);
    }

    #[test]
    fn own_check_still_runs_when_children_fail() {
        // The root's own checkers are probed even under a failing child, so
        // their state is available to the renderer.
        let dir = state_dir();
        let mut registry = Registry::new();
        let root_checker = MockChecker::passing("root");
        let (checks, _saves) = root_checker.counters();
        registry.register(
            Task::new("root")
                .func(|_| Ok(0))
                .checker(Box::new(root_checker))
                .depends(["child"]),
        );
        registry.register(checked("child", false));

        let tree = status(&registry, dir.path(), "root", true, false).unwrap();
        assert!(!tree.passes);
        assert_eq!(checks.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[test]
    fn task_without_checkers_never_passes() {
        let dir = state_dir();
        let mut registry = Registry::new();
        registry.register(Task::new("plain").func(|_| Ok(0)));

        let tree = status(&registry, dir.path(), "plain", true, false).unwrap();
        assert!(!tree.passes);
    }

    #[test]
    fn synthetic_root_passes_iff_children_pass() {
        let dir = state_dir();
        let mut registry = Registry::new();
        // Single chain flattens into a synthetic root.
        registry.register(checked("root", true).depends(["child"]));
        registry.register(checked("child", true));

        let tree = status(&registry, dir.path(), "root", true, true).unwrap();
        assert!(tree.name.is_none(), "chain should flatten to synthetic root");
        assert!(tree.passes);
    }

    // -----------------------------------------------------------------------
    // render_status
    // -----------------------------------------------------------------------

    #[test]
    fn renders_one_line_per_node_with_depth_indent() {
        let dir = state_dir();
        let mut registry = Registry::new();
        registry.register(checked("root", true).depends(["a", "b"]));
        registry.register(checked("a", true));
        registry.register(checked("b", false));

        let tree = status(&registry, dir.path(), "root", true, false).unwrap();
        let rendered = render_status(&tree);

        let expected = format!(
            "{spacer}{root_icon} root\n{deeper}{a_icon} a\n{deeper}{b_icon} b\n",
            spacer = "  ".repeat(2),
            deeper = "  ".repeat(3),
            root_icon = term::gray("○"),
            a_icon = term::green("✔"),
            b_icon = term::gray("○"),
        );
        assert_eq!(rendered, expected);
    }

    #[test]
    fn synthetic_root_is_elided_from_rendering() {
        let dir = state_dir();
        let mut registry = Registry::new();
        registry.register(checked("root", true).depends(["child"]));
        registry.register(checked("child", true));

        let tree = status(&registry, dir.path(), "root", true, true).unwrap();
        let rendered = render_status(&tree);

        // Flattened chain: child then root, both at the base indent.
        let expected = format!(
            "{spacer}{check} child\n{spacer}{check} root\n",
            spacer = "  ".repeat(2),
            check = term::green("✔"),
        );
        assert_eq!(rendered, expected);
    }

    // -----------------------------------------------------------------------
    // render_help
    // -----------------------------------------------------------------------

    fn help_task() -> Task {
        Task::new("compose")
            .func(|_| Ok(0))
            .short_description("Run docker compose.")
            .description("Proxy to docker compose in {PROJECT}.")
            .config_refs(["{PROJECT}"])
    }

    fn help_config() -> Config {
        let mut config = Config::new();
        config.set("PROJECT", "webapp");
        config
    }

    #[test]
    fn help_includes_name_and_short_description() {
        let dir = state_dir();
        let mut registry = Registry::new();
        registry.register(help_task());

        let help = render_help(&registry, &help_config(), dir.path(), "compose").unwrap();
        assert!(help.contains("NAME"));
        assert!(help.contains("compose -- Run docker compose."));
    }

    #[test]
    fn help_substitutes_description_and_config_table() {
        let dir = state_dir();
        let mut registry = Registry::new();
        registry.register(help_task());

        let help = render_help(&registry, &help_config(), dir.path(), "compose").unwrap();
        assert!(help.contains("Proxy to docker compose in webapp."));
        assert!(help.contains("- PROJECT:"));
        assert!(help.contains("webapp"));
    }

    #[test]
    fn help_renders_without_description_or_config() {
        let dir = state_dir();
        let mut registry = Registry::new();
        registry.register(Task::new("bare").func(|_| Ok(0)));

        let help = render_help(&registry, &Config::new(), dir.path(), "bare").unwrap();
        assert!(help.contains("NAME"));
        assert!(help.contains("STATUS"));
        assert!(!help.contains("CONFIGURATION"));
    }

    #[test]
    fn help_includes_status_tree() {
        let dir = state_dir();
        let mut registry = Registry::new();
        registry.register(help_task().depends(["setup"]));
        registry.register(Task::new("setup").func(|_| Ok(0)));

        let help = render_help(&registry, &help_config(), dir.path(), "compose").unwrap();
        assert!(help.contains("setup"));
        assert!(help.contains("compose"));
    }

    #[test]
    fn help_for_unknown_task_is_error() {
        let dir = state_dir();
        let registry = Registry::new();
        let err = render_help(&registry, &Config::new(), dir.path(), "ghost").unwrap_err();
        assert!(matches!(
            err,
            GantryError::Task(TaskError::UnknownTask(name)) if name == "ghost"
        ));
    }

    #[test]
    fn help_missing_config_reference_is_error() {
        let dir = state_dir();
        let mut registry = Registry::new();
        registry.register(Task::new("broken").func(|_| Ok(0)).config_refs(["{ABSENT}"]));

        let err = render_help(&registry, &Config::new(), dir.path(), "broken").unwrap_err();
        assert!(matches!(err, GantryError::Config(_)));
    }
}
