//! Project file loading: `gantry.toml` into config values and task
//! registrations.
//!
//! The `[init]` table is the project's entry point; a file without one is
//! rejected so a stray `gantry.toml` cannot silently load as an empty
//! project. `[config]` values land in the root config (nested tables become
//! child groups), environment variables with the `ENV_PREFIX` prefix
//! override top-level keys, and each `[tasks.NAME]` table registers one
//! task.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::checks::FileHash;
use crate::config::{Config, ConfigValue};
use crate::error::LoadError;
use crate::module;
use crate::task::{CleanHook, Registry, Task};

/// Path of the project file: `GANTRY_CONFIG` override or `gantry.toml` in
/// the working directory.
#[must_use]
pub fn default_path() -> PathBuf {
    std::env::var_os("GANTRY_CONFIG")
        .map_or_else(|| PathBuf::from("gantry.toml"), PathBuf::from)
}

#[derive(Debug, Deserialize)]
struct ProjectFile {
    init: Option<InitSection>,
    #[serde(default)]
    config: toml::Table,
    #[serde(default)]
    tasks: BTreeMap<String, TaskSection>,
}

#[derive(Debug, Default, Deserialize)]
struct InitSection {
    #[serde(default)]
    modules: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TaskSection {
    run: Option<CommandSpec>,
    #[serde(default)]
    deps: Vec<String>,
    clean: Option<CommandSpec>,
    parent: Option<OneOrMany>,
    category: Option<String>,
    #[serde(default)]
    short_description: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    config: Vec<String>,
    #[serde(default)]
    check: Vec<CheckSpec>,
}

/// A command written either as one whitespace-split string or as an argv
/// array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CommandSpec {
    Line(String),
    Argv(Vec<String>),
}

impl CommandSpec {
    fn into_argv(self) -> Vec<String> {
        match self {
            Self::Line(line) => line.split_whitespace().map(str::to_string).collect(),
            Self::Argv(argv) => argv,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(value) => vec![value],
            Self::Many(values) => values,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CheckSpec {
    files: Vec<PathBuf>,
}

/// Load a project file, installing its config and registering its tasks.
///
/// # Errors
///
/// - [`LoadError::NotFound`] if the file does not exist.
/// - [`LoadError::Parse`] for invalid TOML.
/// - [`LoadError::MissingInit`] if the file has no `[init]` table.
/// - [`LoadError::UnknownModule`] for an unknown `[init] modules` entry.
pub fn load_project(
    path: &Path,
    config: &mut Config,
    registry: &mut Registry,
) -> Result<(), LoadError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(LoadError::NotFound {
                path: path.to_path_buf(),
            });
        }
        Err(source) => {
            return Err(LoadError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let project: ProjectFile = toml::from_str(&contents).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let Some(init) = project.init else {
        return Err(LoadError::MissingInit {
            path: path.to_path_buf(),
        });
    };

    module::load_modules(&init.modules, config, registry)?;

    install_config(config, project.config);
    apply_env_overrides(config, std::env::vars());

    let task_count = project.tasks.len();
    for (name, section) in project.tasks {
        register_task(registry, &name, section);
    }
    debug!("loaded {} task(s) from {}", task_count, path.display());
    Ok(())
}

/// Install a `[config]` table into the root config. Nested tables become
/// child groups.
fn install_config(config: &mut Config, table: toml::Table) {
    for (key, value) in table {
        match value {
            toml::Value::Table(table) => config.add(&key, config_from_table(table)),
            other => config.set(&key, toml_value(other)),
        }
    }
}

fn config_from_table(table: toml::Table) -> Config {
    let mut child = Config::new();
    install_config(&mut child, table);
    child
}

fn toml_value(value: toml::Value) -> ConfigValue {
    match value {
        toml::Value::String(s) => ConfigValue::Str(s),
        toml::Value::Integer(i) => ConfigValue::Int(i),
        toml::Value::Boolean(b) => ConfigValue::Bool(b),
        toml::Value::Array(items) => {
            ConfigValue::List(items.into_iter().map(toml_value).collect())
        }
        other => ConfigValue::Str(other.to_string()),
    }
}

/// Override top-level keys from `PREFIX`-prefixed environment variables
/// (`GANTRY_FOO=x` sets `FOO = "x"`).
fn apply_env_overrides(config: &mut Config, vars: impl Iterator<Item = (String, String)>) {
    let prefix = config
        .get_str("ENV_PREFIX")
        .unwrap_or_else(|_| "GANTRY_".to_string());
    for (key, value) in vars {
        if let Some(stripped) = key.strip_prefix(&prefix)
            && !stripped.is_empty()
        {
            debug!("config override from environment: {stripped}");
            config.set(stripped, value.as_str());
        }
    }
}

fn register_task(registry: &mut Registry, name: &str, section: TaskSection) {
    let mut task = Task::new(name)
        .depends(section.deps)
        .short_description(section.short_description)
        .description(section.description)
        .config_refs(section.config);
    if let Some(run) = section.run {
        task = task.command(run.into_argv());
    }
    if let Some(clean) = section.clean {
        task = task.clean(CleanHook::Command(clean.into_argv()));
    }
    if let Some(category) = section.category {
        task = task.category(&category);
    }
    for check in section.check {
        task = task.checker(Box::new(FileHash::new(check.files)));
    }

    let parents = section.parent.map(OneOrMany::into_vec).unwrap_or_default();
    registry.register_with_parents(task, &parents);
}
