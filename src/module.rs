//! Built-in module registry.
//!
//! A module bundles an optional configuration group and an optional set of
//! task registrations under a name. Projects opt in with
//! `[init] modules = [...]` in `gantry.toml`; the `core` module is always
//! loaded first so its common targets exist before any project task
//! attaches to them.

use tracing::debug;

use crate::config::Config;
use crate::error::LoadError;
use crate::task::{Registry, Task};

/// What a loadable module exposes.
#[derive(Debug)]
pub struct ModuleOptions {
    /// Module name; its config group installs as `NAME.to_uppercase()`.
    pub name: &'static str,
    /// Builds the module's configuration group, if it has one.
    pub config: Option<fn() -> Config>,
    /// Registers the module's tasks, if it has any.
    pub tasks: Option<fn(&mut Registry)>,
}

/// Modules that ship with gantry.
const BUILTIN_MODULES: &[ModuleOptions] = &[ModuleOptions {
    name: "core",
    config: None,
    tasks: Some(core_tasks),
}];

/// Common virtual targets every project shares.
///
/// Modules and project tasks attach to these by declaring them as parents,
/// so build tooling can rely on generic `lint`/`test` targets regardless of
/// which languages a project uses.
fn core_tasks(registry: &mut Registry) {
    registry.register(
        Task::new("help")
            .category("core")
            .short_description("Show help for gantry or a task"),
    );
    registry.register(
        Task::new("lint")
            .category("testing")
            .short_description("Run all linting tasks."),
    );
    registry.register(
        Task::new("test")
            .category("testing")
            .short_description("Run all testing tasks."),
    );
}

/// Load a module by name: install its config group and register its tasks.
///
/// # Errors
///
/// Returns [`LoadError::UnknownModule`] if the name is not a built-in
/// module.
pub fn load_module(
    name: &str,
    config: &mut Config,
    registry: &mut Registry,
) -> Result<(), LoadError> {
    let module = BUILTIN_MODULES
        .iter()
        .find(|m| m.name == name)
        .ok_or_else(|| LoadError::UnknownModule(name.to_string()))?;

    if let Some(build_config) = module.config {
        config.add(&module.name.to_uppercase(), build_config());
    }
    if let Some(register_tasks) = module.tasks {
        register_tasks(registry);
    }
    debug!("loaded module: {name}");
    Ok(())
}

/// Load several modules in order.
///
/// # Errors
///
/// Returns the first [`LoadError::UnknownModule`] encountered.
pub fn load_modules(
    names: &[String],
    config: &mut Config,
    registry: &mut Registry,
) -> Result<(), LoadError> {
    for name in names {
        load_module(name, config, registry)?;
    }
    Ok(())
}
