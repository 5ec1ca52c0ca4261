//! CLI command implementations for the SmartSNI panel.
//!
//! Provides subcommand handlers for:
//! - `smartsni-panel login | logout | status | watch`: session and live dashboard
//! - `smartsni-panel domains list | add | remove`: SNI domain mappings
//! - `smartsni-panel users list | create | extend | deactivate | delete`
//! - `smartsni-panel reload | password | username`: proxy and account settings
//! - `smartsni-panel history`: local audit log of admin actions
//! - `smartsni-panel config show | init | set | reset`: configuration management
//!
//! Panel handlers drive a [`Dashboard`], which reports outcomes through the
//! terminal renderer itself. A failure it has already shown comes back as
//! [`Reported`] so `main` only has to set the exit code.

use std::io::{self, BufRead, Write};
use std::thread;
use std::time::Instant;

use anyhow::{Context, Result, anyhow};
use colored::Colorize;
use thiserror::Error;

use crate::api::{HttpPanelClient, NewUser};
use crate::audit::{AuditEntry, AuditLog};
use crate::config::{self, schema::PanelConfig};
use crate::dashboard::{Dashboard, DashboardOptions, PasswordChange};
use crate::error::PanelError;
use crate::render::{TerminalRenderer, truncate};
use crate::session::FileSessionStore;

type PanelDashboard = Dashboard<HttpPanelClient, FileSessionStore, TerminalRenderer>;

/// A panel failure the renderer has already shown to the operator.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct Reported(#[from] pub PanelError);

/// Output format for `history`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

// ---------------------------------------------------------------------------
// Dashboard wiring
// ---------------------------------------------------------------------------

/// Build the controller from config. With `autoload` the full dashboard is
/// rendered once a session is established.
fn open_dashboard(config: &PanelConfig, autoload: bool) -> Result<PanelDashboard> {
    let session_path = config
        .session
        .resolved_path()
        .ok_or_else(|| anyhow!("could not determine the session file location"))?;

    let api = HttpPanelClient::from_config(&config.panel);
    let store = FileSessionStore::open(session_path);
    let options = DashboardOptions {
        autoload,
        ..DashboardOptions::from_config(config)
    };

    let mut dashboard = Dashboard::new(api, store, TerminalRenderer::new(), options);
    if config.logging.audit_enabled
        && let Some(path) = config.logging.resolved_audit_path()
    {
        dashboard = dashboard.with_audit(AuditLog::new(path));
    }
    Ok(dashboard)
}

/// Open the dashboard and require a valid stored session.
fn resume(config: &PanelConfig, autoload: bool) -> Result<PanelDashboard> {
    let mut dashboard = open_dashboard(config, autoload)?;
    dashboard.start();
    if !dashboard.is_authenticated() {
        return Err(Reported(PanelError::Auth("not logged in".to_string())).into());
    }
    Ok(dashboard)
}

fn reported<T>(result: Result<T, PanelError>) -> Result<T> {
    result.map_err(|e| Reported(e).into())
}

// ---------------------------------------------------------------------------
// smartsni-panel login | logout | status | watch
// ---------------------------------------------------------------------------

/// Log in, prompting for whatever was not given on the command line.
pub fn run_login(config: &PanelConfig, username: Option<String>, password: Option<String>) -> Result<()> {
    let username = match username {
        Some(u) => u,
        None => prompt("Username: ")?,
    };
    let password = match password {
        Some(p) => p,
        None => prompt("Password: ")?,
    };

    let mut dashboard = open_dashboard(config, true)?;
    reported(dashboard.submit_login(&username, &password))
}

pub fn run_logout(config: &PanelConfig) -> Result<()> {
    let mut dashboard = open_dashboard(config, false)?;
    dashboard.logout();
    Ok(())
}

/// Validate the stored session and show the full dashboard once.
pub fn run_status(config: &PanelConfig) -> Result<()> {
    resume(config, true).map(|_| ())
}

/// Show the dashboard and keep refreshing metrics and health until
/// interrupted, the session ends, or `ticks` refreshes have run.
pub fn run_watch(config: &PanelConfig, ticks: Option<u32>) -> Result<()> {
    let mut dashboard = resume(config, true)?;
    let mut done = 0u32;

    while dashboard.is_authenticated() {
        if ticks.is_some_and(|limit| done >= limit) {
            break;
        }

        let now = Instant::now();
        if let Some(report) = dashboard.poll(now) {
            done += 1;
            if !report.is_ok() {
                tracing::debug!(tick = done, "refresh tick had failures");
            }
            continue;
        }

        match dashboard.timer().remaining(now) {
            Some(wait) => thread::sleep(wait),
            None => break,
        }
    }

    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    eprint!("{label}");
    io::stderr().flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

// ---------------------------------------------------------------------------
// smartsni-panel domains
// ---------------------------------------------------------------------------

pub fn run_domains_list(config: &PanelConfig) -> Result<()> {
    let mut dashboard = resume(config, false)?;
    reported(dashboard.load_domains())
}

pub fn run_domains_add(config: &PanelConfig, domain: &str) -> Result<()> {
    let mut dashboard = resume(config, false)?;
    reported(dashboard.add_domain(domain))
}

pub fn run_domains_remove(config: &PanelConfig, domain: &str) -> Result<()> {
    let mut dashboard = resume(config, false)?;
    reported(dashboard.remove_domain(domain))
}

/// Ask the proxy to reload its configuration.
pub fn run_reload(config: &PanelConfig) -> Result<()> {
    let mut dashboard = resume(config, false)?;
    reported(dashboard.reload_config())
}

// ---------------------------------------------------------------------------
// smartsni-panel users
// ---------------------------------------------------------------------------

pub fn run_users_list(config: &PanelConfig) -> Result<()> {
    let mut dashboard = resume(config, false)?;
    reported(dashboard.load_users())
}

pub fn run_users_create(config: &PanelConfig, user: &NewUser) -> Result<()> {
    let mut dashboard = resume(config, false)?;
    reported(dashboard.create_user(user)).map(|_| ())
}

pub fn run_users_extend(config: &PanelConfig, user_id: &str, days: u32) -> Result<()> {
    let mut dashboard = resume(config, false)?;
    reported(dashboard.extend_user(user_id, days))
}

pub fn run_users_deactivate(config: &PanelConfig, user_id: &str) -> Result<()> {
    let mut dashboard = resume(config, false)?;
    reported(dashboard.deactivate_user(user_id))
}

pub fn run_users_delete(config: &PanelConfig, user_id: &str) -> Result<()> {
    let mut dashboard = resume(config, false)?;
    reported(dashboard.delete_user(user_id))
}

// ---------------------------------------------------------------------------
// smartsni-panel password | username
// ---------------------------------------------------------------------------

pub fn run_change_password(config: &PanelConfig, change: &PasswordChange) -> Result<()> {
    let mut dashboard = resume(config, false)?;
    reported(dashboard.change_password(change))
}

pub fn run_change_username(config: &PanelConfig, password: &str, new_username: &str) -> Result<()> {
    let mut dashboard = resume(config, false)?;
    reported(dashboard.change_username(password, new_username))
}

// ---------------------------------------------------------------------------
// smartsni-panel history
// ---------------------------------------------------------------------------

/// Show admin actions recorded in the audit log.
pub fn run_history(config: &PanelConfig, format: OutputFormat, days: Option<u32>) -> Result<()> {
    let path = config
        .logging
        .resolved_audit_path()
        .ok_or_else(|| anyhow!("could not determine the audit log location"))?;
    let entries = AuditLog::new(path).read_since_days(days);

    if entries.is_empty() {
        println!("{}", "No admin actions recorded yet.".yellow());
        return Ok(());
    }

    match format {
        OutputFormat::Json => print_history_json(&entries)?,
        OutputFormat::Csv => print_history_csv(&entries),
        OutputFormat::Table => print_history_table(&entries),
    }

    Ok(())
}

fn print_history_table(entries: &[AuditEntry]) {
    println!("{}", "Panel Admin History".bold().cyan());
    println!("{}", "=".repeat(78));
    println!(
        "  {:<20} {:<18} {:<26} Result",
        "Time", "Action", "Target"
    );
    println!("  {}", "-".repeat(76));

    for (i, entry) in entries.iter().enumerate() {
        let outcome = if entry.success {
            "ok".green()
        } else {
            entry.message.as_deref().unwrap_or("failed").red()
        };
        let line = format!(
            "  {:<20} {:<18} {:<26}",
            short_timestamp(&entry.timestamp),
            entry.action,
            truncate(&entry.target, 26),
        );

        if i % 2 == 0 {
            println!("{line} {outcome}");
        } else {
            println!("{} {outcome}", line.dimmed());
        }
    }
}

fn print_history_json(entries: &[AuditEntry]) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(entries)?);
    Ok(())
}

fn print_history_csv(entries: &[AuditEntry]) {
    println!("timestamp,action,target,success,status,message");
    for entry in entries {
        println!(
            "{},{},{},{},{},{}",
            entry.timestamp,
            entry.action,
            csv_field(&entry.target),
            entry.success,
            entry.status.map(|s| s.to_string()).unwrap_or_default(),
            csv_field(entry.message.as_deref().unwrap_or_default()),
        );
    }
}

/// `2026-06-01T12:34:56.789+00:00` -> `2026-06-01 12:34:56`.
fn short_timestamp(ts: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(ts)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|_| ts.to_string())
}

/// Quote a CSV field when it contains a separator, quote, or newline.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

// ---------------------------------------------------------------------------
// smartsni-panel config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective SmartSNI Panel Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    print_source(global_exists, "~/.smartsni/config.toml");
    print_source(project_exists, ".smartsni.toml");
    println!(
        "  {} {}",
        "·".dimmed(),
        "SMARTSNI_* environment variables".dimmed()
    );

    Ok(())
}

fn print_source(exists: bool, name: &str) {
    if exists {
        println!("  {} {}", "✓".green(), name.dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), format!("{name} (not found)").dimmed());
    }
}

/// Initialize a default config file at `~/.smartsni/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    println!(
        "  {}",
        "Set panel.base_url to the address of your panel.".dimmed()
    );
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
