//! Hierarchical configuration store with recursive `{KEY}` substitution.
//!
//! Configuration is a tree of UPPERCASE keys to values with a distinguished
//! root. String values pass through substitution on access: `{KEY}` and
//! `{GROUP.KEY}` tokens are expanded recursively against the root namespace,
//! so cross-group references resolve uniformly no matter where they appear.
//! Values may reference other values, which is why evaluation is lazy: task
//! definitions see a consistent view regardless of registration order.

pub mod loader;

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::ConfigError;

/// Matches `{KEY}` and `{GROUP.KEY}` substitution tokens.
fn token_pattern() -> &'static Regex {
    #[allow(clippy::expect_used)] // the pattern is a compile-time constant
    fn compile() -> Regex {
        Regex::new(r"\{(?P<var>[A-Za-z0-9_.]+)\}").expect("invalid token pattern")
    }
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(compile)
}

/// A single configuration value.
///
/// `Dynamic` values are computed on every access, so keys like `PWD` stay
/// current without the store having to know when they change.
#[derive(Clone, Debug)]
pub enum ConfigValue {
    /// A string, substituted on access.
    Str(String),
    /// An integer, returned verbatim.
    Int(i64),
    /// A boolean, returned verbatim.
    Bool(bool),
    /// An ordered list of values.
    List(Vec<ConfigValue>),
    /// A lazily-computed value, evaluated on access and then substituted.
    Dynamic(fn() -> String),
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Hierarchical mapping of uppercase keys to configuration values.
///
/// A `Config` acting as the root holds both its own values and any child
/// groups installed with [`add`](Self::add); lookups and substitution always
/// run against the root so that `{GROUP.KEY}` references work from anywhere.
#[derive(Clone, Debug, Default)]
pub struct Config {
    values: BTreeMap<String, ConfigValue>,
    children: BTreeMap<String, Config>,
}

/// Current working directory, canonicalized.
fn pwd() -> String {
    std::env::current_dir()
        .ok()
        .and_then(|p| dunce::canonicalize(&p).ok())
        .map_or_else(|| ".".to_string(), |p| p.display().to_string())
}

impl Config {
    /// Create an empty config with no values or children.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a root config seeded with the base keys every project sees.
    ///
    /// - `PWD` — directory gantry was run from (dynamic)
    /// - `ENV` — build environment, `DEV` by default
    /// - `ENV_PREFIX` — prefix for environment-variable overrides
    /// - `RUN_CONTEXT` — `cli`
    /// - `BUILDER_DIR` / `BUILDER` — local store for checker state
    /// - `LOG_LEVEL` — default console log level
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut config = Self::new();
        config.set("PWD", ConfigValue::Dynamic(pwd));
        config.set("ENV", "DEV");
        config.set("ENV_PREFIX", "GANTRY_");
        config.set("RUN_CONTEXT", "cli");
        config.set("BUILDER_DIR", ".builder");
        config.set("BUILDER", "{PWD}/{BUILDER_DIR}");
        config.set("LOG_LEVEL", "DEBUG");
        config
    }

    /// Set a value on this config.
    pub fn set(&mut self, key: &str, value: impl Into<ConfigValue>) {
        self.values.insert(key.to_string(), value.into());
    }

    /// Install a child namespace accessible as `GROUP.KEY`.
    pub fn add(&mut self, group: &str, child: Self) {
        self.children.insert(group.to_string(), child);
    }

    /// Whether a top-level key or group with this name exists.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key) || self.children.contains_key(key)
    }

    /// Look up a top-level key, substituting string values.
    ///
    /// Non-string values are returned unchanged; dynamic values are computed
    /// and then substituted.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingKey`] if the key does not exist, or a
    /// substitution error from expanding the value.
    pub fn get(&self, key: &str) -> Result<ConfigValue, ConfigError> {
        let value = self.values.get(key).ok_or_else(|| ConfigError::MissingKey {
            parent: None,
            key: key.to_string(),
        })?;
        self.substituted(value, key)
    }

    /// Look up a top-level key and render it as a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the key does not exist or substitution fails.
    pub fn get_str(&self, key: &str) -> Result<String, ConfigError> {
        let value = self.values.get(key).ok_or_else(|| ConfigError::MissingKey {
            parent: None,
            key: key.to_string(),
        })?;
        self.value_to_string(value, key, &BTreeMap::new())
    }

    /// Dotted lookup, e.g. `"PYTHON.BIN"`.
    ///
    /// Walks child groups for every segment but the last, then returns the
    /// substituted leaf value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingKey`] if any segment does not exist, or
    /// [`ConfigError::NotAGroup`] if an intermediate segment is a plain value
    /// or the final segment names a group.
    pub fn resolve(&self, path: &str) -> Result<ConfigValue, ConfigError> {
        let mut node = self;
        let mut segments = path.split('.').peekable();
        while let Some(segment) = segments.next() {
            if segments.peek().is_none() {
                // Final segment: must be a value.
                if node.children.contains_key(segment) {
                    return Err(ConfigError::NotAGroup {
                        path: path.to_string(),
                        key: segment.to_string(),
                    });
                }
                let value = node
                    .values
                    .get(segment)
                    .ok_or_else(|| ConfigError::MissingKey {
                        parent: None,
                        key: path.to_string(),
                    })?;
                return self.substituted(value, path);
            }
            if let Some(child) = node.children.get(segment) {
                node = child;
            } else if node.values.contains_key(segment) {
                return Err(ConfigError::NotAGroup {
                    path: path.to_string(),
                    key: segment.to_string(),
                });
            } else {
                return Err(ConfigError::MissingKey {
                    parent: None,
                    key: path.to_string(),
                });
            }
        }
        Err(ConfigError::MissingKey {
            parent: None,
            key: path.to_string(),
        })
    }

    /// Expand `{KEY}` and `{GROUP.KEY}` tokens in `template`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingKey`] if a token references an unknown
    /// key.
    pub fn format(&self, template: &str) -> Result<String, ConfigError> {
        self.expand(template, None, &BTreeMap::new())
    }

    /// Expand `template` with call-site overrides taking precedence over
    /// config keys.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingKey`] if a token is neither an override
    /// nor a config key.
    pub fn format_with(
        &self,
        template: &str,
        overrides: &BTreeMap<String, String>,
    ) -> Result<String, ConfigError> {
        self.expand(template, None, overrides)
    }

    /// Substitute a value for return from `get`/`resolve`.
    fn substituted(&self, value: &ConfigValue, key: &str) -> Result<ConfigValue, ConfigError> {
        match value {
            ConfigValue::Str(s) => Ok(ConfigValue::Str(self.expand(
                s,
                Some(key),
                &BTreeMap::new(),
            )?)),
            ConfigValue::Dynamic(f) => Ok(ConfigValue::Str(self.expand(
                &f(),
                Some(key),
                &BTreeMap::new(),
            )?)),
            other => Ok(other.clone()),
        }
    }

    /// Render a value to the string form used inside substitutions.
    fn value_to_string(
        &self,
        value: &ConfigValue,
        parent: &str,
        overrides: &BTreeMap<String, String>,
    ) -> Result<String, ConfigError> {
        match value {
            ConfigValue::Str(s) => self.expand(s, Some(parent), overrides),
            ConfigValue::Dynamic(f) => self.expand(&f(), Some(parent), overrides),
            ConfigValue::Int(i) => Ok(i.to_string()),
            ConfigValue::Bool(b) => Ok(b.to_string()),
            ConfigValue::List(items) => {
                let rendered: Result<Vec<String>, ConfigError> = items
                    .iter()
                    .map(|item| self.value_to_string(item, parent, overrides))
                    .collect();
                Ok(rendered?.join(" "))
            }
        }
    }

    /// Core substitution loop: replace every token in `template`, expanding
    /// referenced values recursively. `parent` is the key being rendered,
    /// used for error context.
    fn expand(
        &self,
        template: &str,
        parent: Option<&str>,
        overrides: &BTreeMap<String, String>,
    ) -> Result<String, ConfigError> {
        let pattern = token_pattern();
        let mut out = String::with_capacity(template.len());
        let mut last = 0;
        for caps in pattern.captures_iter(template) {
            let Some(whole) = caps.get(0) else { continue };
            let Some(token) = caps.name("var") else {
                continue;
            };
            out.push_str(template.get(last..whole.start()).unwrap_or_default());
            let token = token.as_str();
            if let Some(value) = overrides.get(token) {
                out.push_str(value);
            } else {
                out.push_str(&self.lookup_token(token, parent, overrides)?);
            }
            last = whole.end();
        }
        out.push_str(template.get(last..).unwrap_or_default());
        Ok(out)
    }

    /// Resolve a single `{…}` token against the root namespace.
    fn lookup_token(
        &self,
        token: &str,
        parent: Option<&str>,
        overrides: &BTreeMap<String, String>,
    ) -> Result<String, ConfigError> {
        let missing = || ConfigError::MissingKey {
            parent: parent.map(str::to_string),
            key: token.to_string(),
        };
        let mut node = self;
        let mut segments = token.split('.').peekable();
        while let Some(segment) = segments.next() {
            if segments.peek().is_none() {
                let value = node.values.get(segment).ok_or_else(missing)?;
                return self.value_to_string(value, token, overrides);
            }
            node = node.children.get(segment).ok_or_else(missing)?;
        }
        Err(missing())
    }
}
