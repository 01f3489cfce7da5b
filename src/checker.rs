//! Checker contract: completion fingerprints for incremental execution.
//!
//! A checker decides whether a task's work is already done by comparing a
//! live fingerprint of the world against one persisted under the builder
//! directory. The engine owns invocation policy: it clones every checker
//! before probing so that `save()` writes exactly the state that was
//! checked, even if the task body mutates files while it runs.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

/// A completion fingerprint for a task.
///
/// Implementations provide a stable [`key`](Checker::key), a live
/// [`fingerprint`](Checker::fingerprint), and a snapshotting
/// [`clone_box`](Checker::clone_box); persistence is shared default
/// behaviour. Checkers are owned by their task record; clones are ephemeral
/// and scoped to a single execution.
pub trait Checker: std::fmt::Debug + Send + Sync {
    /// Stable identifier for this checker's persisted state.
    ///
    /// Two checkers with the same key share a state file.
    fn key(&self) -> String;

    /// Compute the live fingerprint.
    ///
    /// Snapshotted clones return the fingerprint captured at clone time.
    ///
    /// # Errors
    ///
    /// Returns an error if the fingerprint cannot be computed.
    fn fingerprint(&self) -> Result<serde_json::Value>;

    /// Snapshot this checker for a single execution.
    ///
    /// The clone captures the fingerprint at call time and is independent of
    /// the source: mutations made by the task body must not change what the
    /// clone's [`save`](Checker::save) writes.
    fn clone_box(&self) -> Box<dyn Checker>;

    /// State filename: hex SHA-256 of the checker key.
    fn filename(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.key().as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Full path of this checker's state file under `state_dir`.
    fn state_path(&self, state_dir: &Path) -> PathBuf {
        state_dir.join(self.filename())
    }

    /// Whether the persisted fingerprint matches the live one.
    ///
    /// A missing or unparseable state file reads as "not complete".
    ///
    /// # Errors
    ///
    /// Returns an error if the fingerprint cannot be computed or the state
    /// file exists but cannot be read.
    fn check(&self, state_dir: &Path) -> Result<bool> {
        let live = self.fingerprint()?;
        let path = self.state_path(state_dir);
        let saved = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("failed to read checker state {}", path.display())
                });
            }
        };
        Ok(serde_json::from_str::<serde_json::Value>(&saved)
            .map(|saved| saved == live)
            .unwrap_or(false))
    }

    /// Persist the fingerprint, creating `state_dir` if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the fingerprint cannot be computed or the state
    /// file cannot be written.
    fn save(&self, state_dir: &Path) -> Result<()> {
        let live = self.fingerprint()?;
        std::fs::create_dir_all(state_dir)
            .with_context(|| format!("failed to create state dir {}", state_dir.display()))?;
        let path = self.state_path(state_dir);
        let contents = serde_json::to_string(&live)?;
        std::fs::write(&path, contents)
            .with_context(|| format!("failed to write checker state {}", path.display()))
    }
}
