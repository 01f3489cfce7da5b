//! Concrete checkers shipped with gantry.
//!
//! The execution engine only knows the [`Checker`] contract; these are the
//! implementations a project file can declare directly.

use std::path::PathBuf;

use anyhow::Result;
use sha2::{Digest, Sha256};

use crate::checker::Checker;

/// Marks a task complete while the contents of a set of files are unchanged.
///
/// The fingerprint maps each path to the hex SHA-256 of its contents, with
/// `null` for files that do not exist (so creating or deleting a file also
/// invalidates the task).
#[derive(Debug)]
pub struct FileHash {
    paths: Vec<PathBuf>,
    /// Fingerprint captured at clone time; `None` on the task-owned instance.
    snapshot: Option<serde_json::Value>,
}

impl FileHash {
    /// Create a checker over the given file paths.
    #[must_use]
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            paths,
            snapshot: None,
        }
    }

    /// Hash every tracked file right now.
    fn compute(&self) -> serde_json::Value {
        let mut files = serde_json::Map::new();
        for path in &self.paths {
            let digest = std::fs::read(path).ok().map(|bytes| {
                let mut hasher = Sha256::new();
                hasher.update(&bytes);
                format!("{:x}", hasher.finalize())
            });
            let value = digest.map_or(serde_json::Value::Null, serde_json::Value::String);
            files.insert(path.display().to_string(), value);
        }
        serde_json::Value::Object(files)
    }
}

impl Checker for FileHash {
    fn key(&self) -> String {
        let joined = self
            .paths
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(";");
        format!("file_hash:{joined}")
    }

    fn fingerprint(&self) -> Result<serde_json::Value> {
        Ok(self
            .snapshot
            .clone()
            .unwrap_or_else(|| self.compute()))
    }

    fn clone_box(&self) -> Box<dyn Checker> {
        let snapshot = self.snapshot.clone().unwrap_or_else(|| self.compute());
        Box::new(Self {
            paths: self.paths.clone(),
            snapshot: Some(snapshot),
        })
    }
}
