/// Configuration schema and defaults for smartsni-panel.
///
/// Defines the TOML-serializable configuration with sections `[panel]`,
/// `[session]`, `[poll]`, and `[logging]`. Every field has a built-in
/// default; users only set the values they want to override.
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default panel endpoint.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8088";

/// Default request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Default dashboard refresh interval in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5_000;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level configuration.
///
/// Maps directly to `~/.smartsni/config.toml` and `.smartsni.toml`. All
/// sections and fields are optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub panel: PanelSection,
    pub session: SessionSection,
    pub poll: PollSection,
    pub logging: LoggingSection,
}

// ---------------------------------------------------------------------------
// [panel]
// ---------------------------------------------------------------------------

/// Where the panel API lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelSection {
    /// Panel origin, e.g. `http://proxy.example.com:8088`. Register links
    /// are built from this origin.
    pub base_url: String,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for PanelSection {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl PanelSection {
    /// The origin used for register links: the base URL without a trailing
    /// slash.
    pub fn origin(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

// ---------------------------------------------------------------------------
// [session]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    /// Session state file. `~` is expanded to the home directory.
    pub path: String,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            path: "~/.smartsni/session.json".to_string(),
        }
    }
}

impl SessionSection {
    pub fn resolved_path(&self) -> Option<PathBuf> {
        expand_home(&self.path)
    }
}

// ---------------------------------------------------------------------------
// [poll]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollSection {
    /// Milliseconds between scheduled dashboard refresh ticks.
    pub interval_ms: u64,
}

impl Default for PollSection {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Diagnostic log level: `"error"`, `"warn"`, `"info"`, `"debug"`,
    /// `"trace"`. `RUST_LOG` takes precedence when set.
    pub level: String,
    /// Whether admin actions are appended to the audit log.
    pub audit_enabled: bool,
    /// Audit log file. `~` is expanded to the home directory.
    pub audit_path: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            audit_enabled: true,
            audit_path: "~/.smartsni/panel-audit.jsonl".to_string(),
        }
    }
}

impl LoggingSection {
    pub fn resolved_audit_path(&self) -> Option<PathBuf> {
        expand_home(&self.audit_path)
    }
}

// ---------------------------------------------------------------------------
// Annotated default file
// ---------------------------------------------------------------------------

impl PanelConfig {
    /// The annotated default config written by `config init`.
    pub fn default_toml() -> String {
        r#"# smartsni-panel configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (SMARTSNI_*)
#   2. Project config (.smartsni.toml in current directory)
#   3. User global config (~/.smartsni/config.toml)
#   4. Built-in defaults

[panel]
base_url = "http://127.0.0.1:8088"   # panel origin; register links use it
timeout_ms = 10000

[session]
path = "~/.smartsni/session.json"

[poll]
interval_ms = 5000                  # dashboard refresh cadence for `watch`

[logging]
level = "warn"                      # error | warn | info | debug | trace
audit_enabled = true
audit_path = "~/.smartsni/panel-audit.jsonl"
"#
        .to_string()
    }
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &str) -> Option<PathBuf> {
    if path == "~" {
        return dirs::home_dir();
    }
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir().map(|home| home.join(rest)),
        None => Some(PathBuf::from(path)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
