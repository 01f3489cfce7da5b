//! Dependency graph construction: rooted trees, deduplication, and
//! single-chain flattening.
//!
//! Dependency names resolve here, at build time, not at registration. That
//! allows forward references between modules, and makes this the single
//! failure site for unknown-dependency and cycle errors.

use std::collections::HashSet;

use serde::Serialize;

use crate::error::TaskError;

use super::registry::Registry;

/// A node in a rooted dependency tree.
///
/// `name` is `None` only for the synthetic root produced by flattening.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    /// Task name, or `None` for a synthetic root.
    pub name: Option<String>,
    /// Dependency subtrees in declaration order.
    pub dependencies: Vec<TreeNode>,
}

impl TreeNode {
    /// Names of every task reachable from this node, in walk order.
    #[must_use]
    pub fn reachable_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names(&self, names: &mut Vec<String>) {
        if let Some(name) = &self.name {
            names.push(name.clone());
        }
        for dep in &self.dependencies {
            dep.collect_names(names);
        }
    }
}

/// Build the dependency tree rooted at `root`.
///
/// With `dedupe`, a task visited once is not expanded again: its subtree is
/// omitted from later occurrences. With `flatten`, single-child chains are
/// collapsed for display (see [`flatten_tree`]); execution always uses
/// unflattened trees.
///
/// # Errors
///
/// Returns [`TaskError::UnknownTask`] if `root` or any dependency name is
/// not registered, or [`TaskError::DependencyCycle`] if the declarations
/// form a cycle.
pub fn tree(
    registry: &Registry,
    root: &str,
    dedupe: bool,
    flatten: bool,
) -> Result<TreeNode, TaskError> {
    let mut seen = if dedupe { Some(HashSet::new()) } else { None };
    let mut path = Vec::new();
    let node = build(registry, root, &mut seen, &mut path)?;
    Ok(if flatten { flatten_tree(node) } else { node })
}

fn build(
    registry: &Registry,
    name: &str,
    seen: &mut Option<HashSet<String>>,
    path: &mut Vec<String>,
) -> Result<TreeNode, TaskError> {
    let task = registry
        .lookup(name)
        .ok_or_else(|| TaskError::UnknownTask(name.to_string()))?;

    path.push(name.to_string());
    let mut dependencies = Vec::new();
    for dep in &task.depends {
        if path.iter().any(|p| p == dep) {
            let cycle = format!("{} -> {dep}", path.join(" -> "));
            return Err(TaskError::DependencyCycle(cycle));
        }
        if let Some(seen) = seen.as_mut() {
            if seen.contains(dep) {
                continue;
            }
            seen.insert(dep.clone());
        }
        dependencies.push(build(registry, dep, seen, path)?);
    }
    path.pop();

    Ok(TreeNode {
        name: Some(name.to_string()),
        dependencies,
    })
}

/// Collapse single-child dependency chains for display.
///
/// Chains flatten into a sibling list ordered child-first-then-parent, so
/// the list reads in execution order:
///
/// ```text
/// - foo            - xoo
///   - bar     =>   - bar
///     - xoo        - foo
/// ```
///
/// Nodes with two or more dependencies keep their nested structure, but any
/// dependency that is itself a single chain flattens upward into the
/// parent's sibling list. If the root itself flattens into a list, a
/// synthetic root with `name: None` wraps it so consumers always see a
/// single node.
#[must_use]
pub fn flatten_tree(node: TreeNode) -> TreeNode {
    let mut flattened = flatten_node(node);
    if flattened.len() > 1 {
        TreeNode {
            name: None,
            dependencies: flattened,
        }
    } else {
        flattened.pop().unwrap_or_else(|| TreeNode {
            name: None,
            dependencies: Vec::new(),
        })
    }
}

fn flatten_node(mut node: TreeNode) -> Vec<TreeNode> {
    if node.dependencies.is_empty() {
        return vec![node];
    }

    if node.dependencies.len() == 1 {
        // Single chain: the child's flattening becomes our sibling list,
        // with this node appended last since it runs after its dependency.
        let Some(child) = node.dependencies.pop() else {
            return vec![node];
        };
        let mut flattened = flatten_node(child);
        node.dependencies = Vec::new();
        flattened.push(node);
        return flattened;
    }

    // Multiple dependencies: keep the nesting, but splice any flattened
    // chains into the dependency list as siblings.
    let dependencies = std::mem::take(&mut node.dependencies);
    node.dependencies = dependencies.into_iter().flat_map(flatten_node).collect();
    vec![node]
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::task::Task;

    fn leaf(name: &str) -> TreeNode {
        TreeNode {
            name: Some(name.to_string()),
            dependencies: Vec::new(),
        }
    }

    fn node(name: &str, dependencies: Vec<TreeNode>) -> TreeNode {
        TreeNode {
            name: Some(name.to_string()),
            dependencies,
        }
    }

    fn synthetic(dependencies: Vec<TreeNode>) -> TreeNode {
        TreeNode {
            name: None,
            dependencies,
        }
    }

    /// root -> child -> grandchild
    fn chain_registry() -> Registry {
        let mut registry = Registry::new();
        registry.register(Task::new("root").depends(["child"]));
        registry.register(Task::new("child").depends(["grandchild"]));
        registry.register(Task::new("grandchild"));
        registry
    }

    /// root -> {child_a, child_b -> grandchild_b1}
    fn branch_registry() -> Registry {
        let mut registry = Registry::new();
        registry.register(Task::new("root").depends(["child_a", "child_b"]));
        registry.register(Task::new("child_a"));
        registry.register(Task::new("child_b").depends(["grandchild_b1"]));
        registry.register(Task::new("grandchild_b1"));
        registry
    }

    /// root -> {common, a -> common, b -> common}
    fn diamond_registry() -> Registry {
        let mut registry = Registry::new();
        registry.register(Task::new("root").depends(["common", "a", "b"]));
        registry.register(Task::new("common"));
        registry.register(Task::new("a").depends(["common"]));
        registry.register(Task::new("b").depends(["common"]));
        registry
    }

    // -----------------------------------------------------------------------
    // tree: plain builds
    // -----------------------------------------------------------------------

    #[test]
    fn builds_nested_chain() {
        let registry = chain_registry();
        let tree = tree(&registry, "root", false, false).unwrap();
        assert_eq!(
            tree,
            node("root", vec![node("child", vec![leaf("grandchild")])])
        );
    }

    #[test]
    fn unknown_root_is_error() {
        let registry = chain_registry();
        let err = tree(&registry, "nope", false, false).unwrap_err();
        assert!(matches!(err, TaskError::UnknownTask(name) if name == "nope"));
    }

    #[test]
    fn unknown_dependency_is_error() {
        let mut registry = Registry::new();
        registry.register(Task::new("root").depends(["ghost"]));
        let err = tree(&registry, "root", false, false).unwrap_err();
        assert!(matches!(err, TaskError::UnknownTask(name) if name == "ghost"));
    }

    // -----------------------------------------------------------------------
    // tree: dedupe
    // -----------------------------------------------------------------------

    #[test]
    fn dedupe_expands_shared_dependency_once() {
        let registry = diamond_registry();
        let tree = tree(&registry, "root", true, false).unwrap();
        assert_eq!(
            tree,
            node("root", vec![leaf("common"), leaf("a"), leaf("b")])
        );
    }

    #[test]
    fn without_dedupe_shared_dependency_repeats() {
        let registry = diamond_registry();
        let tree = tree(&registry, "root", false, false).unwrap();
        assert_eq!(
            tree,
            node(
                "root",
                vec![
                    leaf("common"),
                    node("a", vec![leaf("common")]),
                    node("b", vec![leaf("common")]),
                ]
            )
        );
    }

    #[test]
    fn dedupe_and_flatten_reach_the_same_names() {
        let registry = diamond_registry();
        let nested = tree(&registry, "root", true, false).unwrap();
        let flat = tree(&registry, "root", true, true).unwrap();
        let mut nested_names = nested.reachable_names();
        let mut flat_names = flat.reachable_names();
        nested_names.sort_unstable();
        flat_names.sort_unstable();
        assert_eq!(nested_names, flat_names);
    }

    // -----------------------------------------------------------------------
    // flatten
    // -----------------------------------------------------------------------

    #[test]
    fn flatten_collapses_single_chain_under_synthetic_root() {
        let registry = chain_registry();
        let tree = tree(&registry, "root", true, true).unwrap();
        assert_eq!(
            tree,
            synthetic(vec![leaf("grandchild"), leaf("child"), leaf("root")])
        );
    }

    #[test]
    fn flatten_splices_chain_at_end_of_branch() {
        let registry = branch_registry();
        let tree = tree(&registry, "root", true, true).unwrap();
        assert_eq!(
            tree,
            node(
                "root",
                vec![leaf("child_a"), leaf("grandchild_b1"), leaf("child_b")]
            )
        );
    }

    #[test]
    fn flatten_keeps_multi_dependency_nodes_nested() {
        let mut registry = Registry::new();
        registry.register(Task::new("root").depends(["child_a", "child_b"]));
        registry.register(Task::new("child_a").depends(["a1", "a2"]));
        registry.register(Task::new("child_b").depends(["b1", "b2"]));
        for name in ["a1", "a2", "b1", "b2"] {
            registry.register(Task::new(name));
        }

        let tree = tree(&registry, "root", true, true).unwrap();
        assert_eq!(
            tree,
            node(
                "root",
                vec![
                    node("child_a", vec![leaf("a1"), leaf("a2")]),
                    node("child_b", vec![leaf("b1"), leaf("b2")]),
                ]
            )
        );
    }

    #[test]
    fn flatten_wraps_root_with_multi_dep_child_in_synthetic_root() {
        let mut registry = Registry::new();
        registry.register(Task::new("root").depends(["child_a"]));
        registry.register(Task::new("child_a").depends(["a1", "a2"]));
        registry.register(Task::new("a1"));
        registry.register(Task::new("a2"));

        let tree = tree(&registry, "root", true, true).unwrap();
        assert_eq!(
            tree,
            synthetic(vec![
                node("child_a", vec![leaf("a1"), leaf("a2")]),
                leaf("root"),
            ])
        );
    }

    #[test]
    fn flatten_leaf_is_identity() {
        let mut registry = Registry::new();
        registry.register(Task::new("solo"));
        let tree = tree(&registry, "solo", true, true).unwrap();
        assert_eq!(tree, leaf("solo"));
    }

    // -----------------------------------------------------------------------
    // Cycle detection
    // -----------------------------------------------------------------------

    #[test]
    fn two_node_cycle_is_detected() {
        let mut registry = Registry::new();
        registry.register(Task::new("a").depends(["b"]));
        registry.register(Task::new("b").depends(["a"]));

        let err = tree(&registry, "a", true, false).unwrap_err();
        let TaskError::DependencyCycle(path) = err else {
            panic!("expected cycle error, got {err:?}");
        };
        assert_eq!(path, "a -> b -> a");
    }

    #[test]
    fn self_cycle_is_detected() {
        let mut registry = Registry::new();
        registry.register(Task::new("a").depends(["a"]));
        let err = tree(&registry, "a", false, false).unwrap_err();
        assert!(matches!(err, TaskError::DependencyCycle(_)));
    }

    #[test]
    fn cycle_detected_even_with_dedupe() {
        let mut registry = Registry::new();
        registry.register(Task::new("root").depends(["a"]));
        registry.register(Task::new("a").depends(["root"]));
        let err = tree(&registry, "root", true, false).unwrap_err();
        assert!(matches!(err, TaskError::DependencyCycle(_)));
    }

    #[test]
    fn diamond_is_not_a_cycle() {
        let registry = diamond_registry();
        assert!(tree(&registry, "root", false, false).is_ok());
    }
}
