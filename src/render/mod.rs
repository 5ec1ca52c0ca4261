//! View layer: panel data in, display-ready descriptors out.
//!
//! The functions here are pure. They decide *what* the dashboard shows
//! (formatted counters, Active/Inactive, register links) but not *how*;
//! that is the job of a [`Renderer`]. The dashboard controller only ever
//! talks to the `Renderer` trait, so it can be driven without a terminal.

mod terminal;

pub use terminal::TerminalRenderer;

use chrono::{DateTime, Utc};

use crate::api::{CreatedUser, DomainMap, Health, HealthStatus, Metrics, User};

// ---------------------------------------------------------------------------
// Descriptors
// ---------------------------------------------------------------------------

/// Counter tiles of the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsView {
    pub doh_queries: String,
    pub dot_queries: String,
    pub sni_connections: String,
    pub cache_hit_rate: String,
}

/// System status tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthView {
    pub version: String,
    pub uptime: String,
    pub status: HealthStatus,
    /// Capitalized status, e.g. `"Healthy"`.
    pub status_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainRow {
    pub domain: String,
    pub ip: String,
}

/// One line of the users table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub register_link: String,
    pub ips: Vec<String>,
    /// `"<registered> / <max>"`.
    pub ip_count: String,
    /// Expiry date, `YYYY-MM-DD` (UTC).
    pub expires: String,
    pub active: bool,
    pub usage_count: u64,
}

impl UserRow {
    pub fn status_text(&self) -> &'static str {
        if self.active { "Active" } else { "Inactive" }
    }
}

/// Result card shown after creating a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedUserView {
    pub id: String,
    pub name: String,
    pub max_ips: u32,
    pub valid_days: u32,
    pub expires: String,
    pub register_link: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Info,
    Error,
}

/// A transient message for the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Renderer sink
// ---------------------------------------------------------------------------

/// Presentation collaborator of the dashboard controller.
pub trait Renderer {
    /// Show the login view, with an inline error after a failed attempt.
    fn login(&mut self, error: Option<&str>);
    /// Show the dashboard frame for the signed-in admin.
    fn dashboard(&mut self, username: &str);
    fn metrics(&mut self, view: &MetricsView);
    fn health(&mut self, view: &HealthView);
    fn domains(&mut self, rows: &[DomainRow]);
    fn users(&mut self, rows: &[UserRow]);
    fn user_created(&mut self, view: &CreatedUserView);
    fn notice(&mut self, notice: &Notice);
}

// ---------------------------------------------------------------------------
// Pure view functions
// ---------------------------------------------------------------------------

pub fn metrics_view(metrics: &Metrics) -> MetricsView {
    MetricsView {
        doh_queries: format_number(metrics.doh_queries),
        dot_queries: format_number(metrics.dot_queries),
        sni_connections: format_number(metrics.sni_connections),
        cache_hit_rate: metrics.hit_rate_display(),
    }
}

pub fn health_view(health: &Health) -> HealthView {
    let status_text = match health.status {
        HealthStatus::Healthy => "Healthy",
        HealthStatus::Unhealthy => "Unhealthy",
    };
    HealthView {
        version: health.version.clone(),
        uptime: format_uptime(health.uptime_seconds),
        status: health.status,
        status_text: status_text.to_string(),
    }
}

/// Domain rows sorted by domain name.
pub fn domain_rows(domains: &DomainMap) -> Vec<DomainRow> {
    domains
        .iter()
        .map(|(domain, ip)| DomainRow {
            domain: domain.clone(),
            ip: ip.clone(),
        })
        .collect()
}

/// User rows in the order the server returned them.
pub fn user_rows(users: &[User], origin: &str, now: DateTime<Utc>) -> Vec<UserRow> {
    users
        .iter()
        .map(|user| UserRow {
            id: user.id.clone(),
            name: user.name.clone(),
            description: user.description().map(str::to_string),
            register_link: register_link(origin, &user.id),
            ips: user.ips.clone(),
            ip_count: format!("{} / {}", user.ips.len(), user.max_ips),
            expires: format_date(user.expires_at),
            active: user.is_effectively_active(now),
            usage_count: user.usage_count,
        })
        .collect()
}

pub fn created_user_view(created: &CreatedUser, origin: &str, valid_days: u32) -> CreatedUserView {
    CreatedUserView {
        id: created.user.id.clone(),
        name: created.user.name.clone(),
        max_ips: created.user.max_ips,
        valid_days,
        expires: format_date(created.user.expires_at),
        register_link: register_link(origin, &created.user.id),
    }
}

/// Self-service registration URL for a user: `<origin>/register?token=<id>`.
pub fn register_link(origin: &str, user_id: &str) -> String {
    format!("{}/register?token={}", origin.trim_end_matches('/'), user_id)
}

/// Format an uptime as `Xd Yh Zm`, `Yh Zm`, or `Zm`.
pub fn format_uptime(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let mins = (total % 3_600) / 60;

    if days > 0 {
        format!("{days}d {hours}h {mins}m")
    } else if hours > 0 {
        format!("{hours}h {mins}m")
    } else {
        format!("{mins}m")
    }
}

/// Format a number with comma separators for readability.
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}

/// Truncate a string to `max_len` characters, appending "…" if truncated.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

fn format_date(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
