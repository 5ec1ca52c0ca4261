/// Request and response bodies of the SmartSNI panel API.
///
/// Field names follow the backend's JSON exactly. The backend serializes
/// empty Go slices and maps as `null`, so list-valued fields accept `null`
/// and read it as empty.
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Response body of `POST /panel/api/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub session_id: String,
    #[serde(default)]
    pub username: Option<String>,
}

/// Response body of `GET /panel/api/validate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub username: String,
}

// ---------------------------------------------------------------------------
// Metrics / health
// ---------------------------------------------------------------------------

/// Counter snapshot from `GET /panel/api/metrics`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metrics {
    pub doh_queries: u64,
    pub dot_queries: u64,
    pub sni_connections: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub errors: u64,
}

impl Metrics {
    /// Cache hit rate in percent. Zero when there were no lookups at all.
    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits as f64 + self.cache_misses as f64;
        if total == 0.0 {
            0.0
        } else {
            (self.cache_hits as f64 / total) * 100.0
        }
    }

    /// Hit rate with one decimal place, e.g. `"75.0%"`, or `"0%"` when
    /// there were no lookups.
    pub fn hit_rate_display(&self) -> String {
        if self.cache_hits == 0 && self.cache_misses == 0 {
            return "0%".to_string();
        }
        format!("{:.1}%", self.hit_rate())
    }
}

/// Overall service status reported by the health endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

impl From<String> for HealthStatus {
    fn from(value: String) -> Self {
        if value.eq_ignore_ascii_case("healthy") {
            Self::Healthy
        } else {
            Self::Unhealthy
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Snapshot from `GET /panel/api/health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub version: String,
    #[serde(rename = "uptime")]
    pub uptime_seconds: f64,
    pub status: HealthStatus,
}

// ---------------------------------------------------------------------------
// Domains
// ---------------------------------------------------------------------------

/// Domain pattern → IP address.
pub type DomainMap = BTreeMap<String, String>;

/// Response body of `GET /panel/api/domains`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainList {
    #[serde(default, deserialize_with = "null_as_default")]
    pub domains: DomainMap,
    #[serde(default)]
    pub host: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct DomainRequest<'a> {
    pub domain: &'a str,
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// A registered proxy user, as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Registered client IPs, oldest first.
    #[serde(default, deserialize_with = "null_as_default")]
    pub ips: Vec<String>,
    pub max_ips: u32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub usage_count: u64,
    #[serde(default)]
    pub last_used: Option<DateTime<Utc>>,
}

impl User {
    /// Active means enabled by the admin and not past its expiry.
    pub fn is_effectively_active(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at >= now
    }

    /// Non-empty description, if any.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref().filter(|d| !d.trim().is_empty())
    }
}

/// Response body of `GET /panel/api/users`.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct UserList {
    #[serde(default, deserialize_with = "null_as_default")]
    pub users: Vec<User>,
}

/// Input for `POST /panel/api/users/create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewUser {
    pub name: String,
    pub description: String,
    pub max_ips: u32,
    pub valid_days: u32,
}

/// Response body of `POST /panel/api/users/create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedUser {
    pub user: User,
    #[serde(default)]
    pub register_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExtendRequest<'a> {
    pub user_id: &'a str,
    pub days: u32,
}

#[derive(Debug, Serialize)]
pub(crate) struct UserIdRequest<'a> {
    pub user_id: &'a str,
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(crate) struct ChangePasswordRequest<'a> {
    pub current_password: &'a str,
    pub new_password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChangeUsernameRequest<'a> {
    pub password: &'a str,
    pub new_username: &'a str,
}

/// `{"error": "..."}` body the backend sends with non-2xx answers.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
