//! Structured JSONL audit log.
//!
//! Every line carries:
//! - A monotonic sequence number for ordering
//! - An ISO 8601 timestamp with microsecond precision
//! - The run ID of the CLI invocation that wrote it
//! - A component name and a JSON payload

use crate::decision::{DecisionContext, DecisionResult};
use crate::domain::AppointmentEvent;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

pub struct StructuredLogger {
    run_id: String,
    seq: AtomicU64,
    log_file: Mutex<File>,
    log_path: PathBuf,
}

/// A single log entry in JSONL format.
#[derive(Debug, Serialize, Deserialize)]
pub struct LogEntry {
    pub seq: u64,
    pub ts: String,
    pub run_id: String,
    pub component: String,
    pub event: Value,
}

impl StructuredLogger {
    /// Opens (or creates) the log at `log_path` for appending.
    pub fn open(log_path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        Ok(Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            seq: AtomicU64::new(0),
            log_file: Mutex::new(file),
            log_path: log_path.to_path_buf(),
        })
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Writes one entry. Failures to write are dropped; logging never fails
    /// the operation being logged.
    pub fn log(&self, component: &str, event: impl Serialize) {
        let entry = LogEntry {
            seq: self.next_seq(),
            ts: Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string(),
            run_id: self.run_id.clone(),
            component: component.to_string(),
            event: serde_json::to_value(event).unwrap_or(Value::Null),
        };

        if let Ok(mut file) = self.log_file.lock() {
            if let Ok(line) = serde_json::to_string(&entry) {
                let _ = writeln!(file, "{}", line);
                let _ = file.flush();
            }
        }
    }

    pub fn log_decision(&self, context: &DecisionContext, result: &DecisionResult) {
        self.log(
            "Decision",
            serde_json::json!({
                "type": "Evaluated",
                "kind": context.kind,
                "weight": context.effective_weight().label(),
                "autonomy_level": result.autonomy_level,
                "requires_human_review": result.requires_human_review,
                "review_reason": result.review_reason,
                "recommendation": result.primary_recommendation.as_ref().map(|o| &o.value),
            }),
        );
    }

    pub fn log_domain_event(&self, event: &AppointmentEvent) {
        self.log(
            "Appointment",
            serde_json::json!({
                "type": "DomainEvent",
                "event": event
            }),
        );
    }

    /// Logs the result of a CLI command.
    pub fn log_outcome(&self, command: &str, ok: bool, tag: Option<&str>) {
        self.log(
            "UseCase",
            serde_json::json!({
                "type": "Outcome",
                "command": command,
                "ok": ok,
                "tag": tag
            }),
        );
    }

    pub fn path(&self) -> &Path {
        &self.log_path
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }
}

#[cfg(test)]
#[path = "tests/structured_logger_tests.rs"]
mod tests;
