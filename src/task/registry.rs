//! Task registry: the mapping from task name to task record.
//!
//! The registry owns every registered [`Task`] and implements the
//! virtual-target merge rules: a concrete task registered over a virtual
//! target adopts its dependencies, while duplicate concrete definitions are
//! reported and ignored. Parents that do not exist yet are created as
//! virtual targets, so modules can contribute to common targets like `test`
//! without coupling to whichever module defines them.

use std::collections::HashMap;

use tracing::warn;

use super::Task;

/// Ordered collection of task records, keyed by name.
#[derive(Debug, Default)]
pub struct Registry {
    order: Vec<String>,
    tasks: HashMap<String, Task>,
}

impl Registry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a task, applying the virtual-target merge rules.
    ///
    /// - If a task with the same name exists and is virtual, the new task
    ///   adopts the virtual target's dependencies (prepended before its own)
    ///   and replaces it.
    /// - If both are concrete, the duplicate definition is logged and the
    ///   existing task wins.
    /// - If the new task is virtual and the existing one is concrete, the
    ///   new task's dependencies are contributed to the existing record.
    pub fn register(&mut self, task: Task) {
        let name = task.name.clone();
        let Some(existing) = self.tasks.get(&name) else {
            self.order.push(name.clone());
            self.tasks.insert(name, task);
            return;
        };

        if existing.is_virtual() {
            let mut merged = task;
            let mut depends = existing.depends.clone();
            depends.append(&mut merged.depends);
            merged.depends = depends;
            self.tasks.insert(name, merged);
        } else if task.body.is_some() {
            warn!("Duplicate task definition: {name}");
        } else {
            let extra = task.depends;
            if let Some(existing) = self.tasks.get_mut(&name) {
                existing.depends.extend(extra);
            }
        }
    }

    /// Insert a task and attach it as a dependency of each parent.
    ///
    /// Parents that are not registered yet are created as virtual targets; a
    /// concrete task registered later under a parent's name adopts the
    /// children accumulated so far.
    pub fn register_with_parents(&mut self, task: Task, parents: &[String]) {
        let name = task.name.clone();
        self.register(task);
        for parent in parents {
            self.add_to_parent(parent, &name);
        }
    }

    /// Add `child` as a dependency of `parent`, creating the parent as a
    /// virtual target if it does not exist.
    pub fn add_to_parent(&mut self, parent: &str, child: &str) {
        if !self.tasks.contains_key(parent) {
            self.register(Task::new(parent));
        }
        if let Some(parent) = self.tasks.get_mut(parent) {
            parent.depends.push(child.to_string());
        }
    }

    /// Look up a task by name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&Task> {
        self.tasks.get(name)
    }

    /// Whether a task with this name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    /// All tasks in registration order.
    pub fn all(&self) -> impl Iterator<Item = &Task> {
        self.order.iter().filter_map(|name| self.tasks.get(name))
    }

    /// Number of registered tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Remove every task.
    pub fn clear(&mut self) {
        self.order.clear();
        self.tasks.clear();
    }
}
