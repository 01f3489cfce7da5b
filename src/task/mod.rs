//! Task records: named units of work with dependencies, checkers, and
//! cleanup hooks.
//!
//! A [`Task`] is declarative: it describes what to run, what must run first,
//! how to tell the work is already done, and how to undo it. The submodules
//! hold everything that consumes the records — the [`registry`], the
//! dependency [`graph`] builder, the execution engine in [`runner`], and the
//! [`status`] renderers.

pub mod graph;
pub mod registry;
pub mod runner;
pub mod status;

pub use registry::Registry;
pub use runner::{ExecutionFlags, RunContext, execute};

use std::sync::Arc;

use crate::checker::Checker;

/// Signature for programmatic task bodies: arguments in, status code out.
pub type BodyFn = dyn Fn(&[String]) -> anyhow::Result<i32> + Send + Sync;

/// Signature for programmatic clean hooks.
pub type HookFn = dyn Fn() -> anyhow::Result<()> + Send + Sync;

/// What a task runs when its turn comes.
#[derive(Clone)]
pub enum TaskBody {
    /// An argv vector executed through the [`Executor`](crate::exec::Executor).
    ///
    /// Each element passes through config substitution at execution time;
    /// top-level task arguments are appended.
    Command(Vec<String>),
    /// A callable, used by built-in tasks and tests.
    Func(Arc<BodyFn>),
}

impl std::fmt::Debug for TaskBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Command(argv) => f.debug_tuple("Command").field(argv).finish(),
            Self::Func(_) => f.debug_tuple("Func").field(&"<fn>").finish(),
        }
    }
}

/// A cleanup action invoked by `--clean` before the body runs.
#[derive(Clone)]
pub enum CleanHook {
    /// An argv vector executed through the executor.
    Command(Vec<String>),
    /// A callable.
    Func(Arc<HookFn>),
}

impl std::fmt::Debug for CleanHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Command(argv) => f.debug_tuple("Command").field(argv).finish(),
            Self::Func(_) => f.debug_tuple("Func").field(&"<fn>").finish(),
        }
    }
}

/// The declarative description of a task.
///
/// A task with no body is a *virtual target*: it exists only to aggregate
/// dependencies, and other tasks attach to it by naming it as a
/// [`parent`](Registry::register_with_parents).
#[derive(Debug)]
pub struct Task {
    /// Unique task name, lowercase by convention.
    pub name: String,
    /// What to run; `None` makes this a virtual target.
    pub body: Option<TaskBody>,
    /// Names of tasks that must run before this one, in order.
    ///
    /// Stored as names so references bind late: resolution happens at
    /// graph-build time, allowing forward references between modules.
    pub depends: Vec<String>,
    /// Completion checkers; empty means the task is unconditional.
    pub checkers: Vec<Box<dyn Checker>>,
    /// Optional cleanup hook for `--clean`.
    pub clean: Option<CleanHook>,
    /// Category for help grouping, uppercased.
    pub category: Option<String>,
    /// One-line description shown in the task listing.
    pub short_description: String,
    /// Long description shown on the task's help page, config-substituted.
    pub description: String,
    /// `{KEY}` templates displayed (with values) on the help page.
    pub config_refs: Vec<String>,
}

impl Task {
    /// Create a virtual task with the given name and no body.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            body: None,
            depends: Vec::new(),
            checkers: Vec::new(),
            clean: None,
            category: None,
            short_description: String::new(),
            description: String::new(),
            config_refs: Vec::new(),
        }
    }

    /// Set the task body.
    #[must_use]
    pub fn body(mut self, body: TaskBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Set the body to a command argv.
    #[must_use]
    pub fn command<I, S>(self, argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.body(TaskBody::Command(argv.into_iter().map(Into::into).collect()))
    }

    /// Set the body to a callable.
    #[must_use]
    pub fn func(
        self,
        f: impl Fn(&[String]) -> anyhow::Result<i32> + Send + Sync + 'static,
    ) -> Self {
        self.body(TaskBody::Func(Arc::new(f)))
    }

    /// Append dependency names.
    #[must_use]
    pub fn depends<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends.extend(deps.into_iter().map(Into::into));
        self
    }

    /// Append a dependency by direct reference, normalised to its name.
    #[must_use]
    pub fn depends_on(mut self, task: &Self) -> Self {
        self.depends.push(task.name.clone());
        self
    }

    /// Append a completion checker.
    #[must_use]
    pub fn checker(mut self, checker: Box<dyn Checker>) -> Self {
        self.checkers.push(checker);
        self
    }

    /// Set the clean hook.
    #[must_use]
    pub fn clean(mut self, hook: CleanHook) -> Self {
        self.clean = Some(hook);
        self
    }

    /// Set the clean hook to a callable.
    #[must_use]
    pub fn clean_func(self, f: impl Fn() -> anyhow::Result<()> + Send + Sync + 'static) -> Self {
        self.clean(CleanHook::Func(Arc::new(f)))
    }

    /// Set the help category (stored uppercased).
    #[must_use]
    pub fn category(mut self, category: &str) -> Self {
        self.category = Some(category.to_uppercase());
        self
    }

    /// Set the one-line description.
    #[must_use]
    pub fn short_description(mut self, text: impl Into<String>) -> Self {
        self.short_description = text.into();
        self
    }

    /// Set the long description.
    #[must_use]
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = text.into();
        self
    }

    /// Set the `{KEY}` templates displayed on the help page.
    #[must_use]
    pub fn config_refs<I, S>(mut self, refs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config_refs.extend(refs.into_iter().map(Into::into));
        self
    }

    /// A task is virtual iff it has no body.
    #[must_use]
    pub const fn is_virtual(&self) -> bool {
        self.body.is_none()
    }
}
