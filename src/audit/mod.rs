use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::PanelError;

// ---------------------------------------------------------------------------
// Audit entry (JSONL)
// ---------------------------------------------------------------------------

/// A single entry in the admin audit log (`~/.smartsni/panel-audit.jsonl`).
///
/// One entry per attempted panel action, successful or not. Read back by
/// `smartsni-panel history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: String,
    /// Action name, e.g. `"domain.add"` or `"user.delete"`.
    pub action: String,
    /// What the action was applied to (domain, user id, username).
    #[serde(default)]
    pub target: String,
    #[serde(default = "default_true")]
    pub success: bool,
    /// HTTP status of a failed server answer.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub status: Option<u16>,
    /// Error message of a failed attempt.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub message: Option<String>,
}

fn default_true() -> bool {
    true
}

impl AuditEntry {
    /// Build an entry stamped with the current time.
    pub fn new(action: &str, target: &str, outcome: Result<(), &PanelError>) -> Self {
        let (success, status, message) = match outcome {
            Ok(()) => (true, None, None),
            Err(err) => (false, err.status(), Some(err.to_string())),
        };
        Self {
            timestamp: Utc::now().to_rfc3339(),
            action: action.to_string(),
            target: target.to_string(),
            success,
            status,
            message,
        }
    }
}

// ---------------------------------------------------------------------------
// Log file
// ---------------------------------------------------------------------------

/// Append-only JSONL audit log.
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append an entry. Best-effort: failures are logged, never returned.
    pub fn record(&self, entry: &AuditEntry) {
        if let Err(e) = self.append(entry) {
            tracing::warn!(path = %self.path.display(), error = %e, "could not write audit entry");
        }
    }

    fn append(&self, entry: &AuditEntry) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let json = serde_json::to_string(entry)?;
        writeln!(file, "{json}")?;

        Ok(())
    }

    /// Read all entries. Malformed lines are skipped; a missing file reads
    /// as empty.
    pub fn read_all(&self) -> Vec<AuditEntry> {
        let Ok(file) = fs::File::open(&self.path) else {
            return Vec::new();
        };

        BufReader::new(file)
            .lines()
            .map_while(std::io::Result::ok)
            .filter_map(|line| serde_json::from_str::<AuditEntry>(&line).ok())
            .collect()
    }

    /// Read entries from the last N days, or all entries when `days` is
    /// `None`.
    pub fn read_since_days(&self, days: Option<u32>) -> Vec<AuditEntry> {
        let entries = self.read_all();

        let Some(days) = days else {
            return entries;
        };

        let cutoff = Utc::now() - chrono::Duration::days(i64::from(days));
        entries
            .into_iter()
            .filter(|e| {
                chrono::DateTime::parse_from_rfc3339(&e.timestamp)
                    .map(|ts| ts.with_timezone(&Utc) >= cutoff)
                    .unwrap_or(false)
            })
            .collect()
    }
}
