//! Home-based storage paths for triage persistence.
//!
//! Everything lives under `~/.appointment-triage/` unless `TRIAGE_HOME` or the
//! configured `data_dir` points elsewhere:
//! - `appointments/` - one JSON document per appointment
//! - `pending/` - one JSON document per pending decision
//! - `events.jsonl` - the event log
//! - `logs/` - structured logs

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// The name of the triage directory under the home directory.
const TRIAGE_DIR: &str = ".appointment-triage";

/// Environment variable that overrides the storage root.
pub const TRIAGE_HOME_ENV: &str = "TRIAGE_HOME";

/// Resolved storage layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriagePaths {
    root: PathBuf,
}

impl TriagePaths {
    /// Uses `configured` if given, else `$TRIAGE_HOME`, else `~/.appointment-triage/`.
    ///
    /// Creates the root directory if it doesn't exist.
    pub fn resolve(configured: Option<&Path>) -> Result<Self> {
        let root = match configured {
            Some(dir) => dir.to_path_buf(),
            None => match std::env::var_os(TRIAGE_HOME_ENV) {
                Some(dir) if !dir.is_empty() => PathBuf::from(dir),
                _ => dirs::home_dir()
                    .context("Could not determine home directory for triage storage")?
                    .join(TRIAGE_DIR),
            },
        };
        fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create triage directory: {}", root.display()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `appointments/`, created on demand.
    pub fn appointments_dir(&self) -> Result<PathBuf> {
        self.subdir("appointments")
    }

    /// `pending/`, created on demand.
    pub fn pending_dir(&self) -> Result<PathBuf> {
        self.subdir("pending")
    }

    /// `logs/`, created on demand.
    pub fn logs_dir(&self) -> Result<PathBuf> {
        self.subdir("logs")
    }

    pub fn event_log_path(&self) -> PathBuf {
        self.root.join("events.jsonl")
    }

    pub fn structured_log_path(&self) -> Result<PathBuf> {
        Ok(self.logs_dir()?.join("triage.jsonl"))
    }

    fn subdir(&self, name: &str) -> Result<PathBuf> {
        let dir = self.root.join(name);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {} directory: {}", name, dir.display()))?;
        Ok(dir)
    }
}

#[cfg(test)]
#[path = "triage_paths_tests.rs"]
mod tests;
