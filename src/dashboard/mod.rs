//! Dashboard controller: session lifecycle, data loading, polling and admin
//! actions.
//!
//! [`Dashboard`] is a state machine over [`DashboardState`]:
//!
//! ```text
//!             stored session            validate ok
//!  (start) ───────────────────▶ Validating ───────────▶ Authenticated
//!     │                             │ any failure            │
//!     │ no session                  ▼                        │ logout /
//!     └──────────────────────▶ LoggedOut ◀───────────────────┘ username change
//!                                │    ▲
//!                          login │    │ login fails
//!                                ▼    │
//!                            Validating ───────────────────▶ Authenticated
//!                                            login ok
//! ```
//!
//! The login call holds `Validating` only while it is in flight, so callers
//! never observe it between calls.
//!
//! Entering `Authenticated` arms the [`PollTimer`] and, unless
//! [`DashboardOptions::autoload`] is off, renders and loads every panel.
//! While authenticated, [`Dashboard::poll`] runs a refresh tick (metrics +
//! health) whenever the timer is due. Leaving
//! `Authenticated` stops the timer before anything else happens, so no tick
//! can run against a cleared session.
//!
//! Every admin action validates its input locally, refuses to run without an
//! authenticated session, and on success reloads exactly the one list it
//! changed. Failures are reported through the [`Renderer`] and returned.

pub mod timer;
pub mod validate;

pub use timer::PollTimer;
pub use validate::PasswordChange;

use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::api::{CreatedUser, Health, Metrics, NewUser, PanelApi};
use crate::audit::{AuditEntry, AuditLog};
use crate::config::schema::{DEFAULT_BASE_URL, PanelConfig};
use crate::error::{ApiResult, PanelError};
use crate::render::{self, Notice, Renderer};
use crate::session::{Session, SessionStore};

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardState {
    LoggedOut,
    /// A stored credential is being checked with the server.
    Validating,
    Authenticated { username: String },
}

impl DashboardState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }
}

/// Result of one refresh tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub metrics: Result<Metrics, PanelError>,
    pub health: Result<Health, PanelError>,
}

impl TickReport {
    pub fn is_ok(&self) -> bool {
        self.metrics.is_ok() && self.health.is_ok()
    }
}

/// Construction options for [`Dashboard`].
#[derive(Debug, Clone)]
pub struct DashboardOptions {
    /// Panel origin used for register links.
    pub origin: String,
    pub poll_interval: Duration,
    /// Render and load the full dashboard when a session is established.
    /// Single-action callers turn this off and load only what they need.
    pub autoload: bool,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            origin: DEFAULT_BASE_URL.to_string(),
            poll_interval: timer::DEFAULT_POLL_INTERVAL,
            autoload: true,
        }
    }
}

impl DashboardOptions {
    pub fn from_config(config: &PanelConfig) -> Self {
        Self {
            origin: config.panel.origin().to_string(),
            poll_interval: Duration::from_millis(config.poll.interval_ms),
            autoload: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

pub struct Dashboard<A: PanelApi, S: SessionStore, R: Renderer> {
    api: A,
    store: S,
    renderer: R,
    state: DashboardState,
    timer: PollTimer,
    origin: String,
    autoload: bool,
    audit: Option<AuditLog>,
}

impl<A: PanelApi, S: SessionStore, R: Renderer> Dashboard<A, S, R> {
    /// Build a controller. It starts in `Validating` when the store already
    /// holds a session, `LoggedOut` otherwise; call [`start`](Self::start)
    /// to resolve that.
    pub fn new(api: A, store: S, renderer: R, options: DashboardOptions) -> Self {
        let state = if store.get().is_some() {
            DashboardState::Validating
        } else {
            DashboardState::LoggedOut
        };
        Self {
            api,
            store,
            renderer,
            state,
            timer: PollTimer::new(options.poll_interval),
            origin: options.origin,
            autoload: options.autoload,
            audit: None,
        }
    }

    /// Record admin actions to `audit`.
    pub fn with_audit(mut self, audit: AuditLog) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.is_authenticated()
    }

    pub fn username(&self) -> Option<&str> {
        match &self.state {
            DashboardState::Authenticated { username } => Some(username),
            _ => None,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn timer(&self) -> &PollTimer {
        &self.timer
    }

    /// When the next refresh tick is due, if polling.
    pub fn next_tick(&self) -> Option<Instant> {
        self.timer.next_due()
    }

    // -----------------------------------------------------------------------
    // Session lifecycle
    // -----------------------------------------------------------------------

    /// Resolve the initial state: validate a stored session, or show the
    /// login view when there is none.
    pub fn start(&mut self) -> &DashboardState {
        match self.state {
            DashboardState::Validating => {
                let _ = self.validate();
            }
            DashboardState::LoggedOut => self.renderer.login(None),
            DashboardState::Authenticated { .. } => {}
        }
        &self.state
    }

    /// Check the stored credential with the server.
    ///
    /// Success enters `Authenticated`. Any failure, including an
    /// unreachable server, clears the stored session and lands in
    /// `LoggedOut`.
    pub fn validate(&mut self) -> Result<(), PanelError> {
        let Some(session) = self.store.get() else {
            self.end_session();
            return Err(PanelError::Auth("no stored session".to_string()));
        };

        self.state = DashboardState::Validating;
        match self.api.validate(Some(&session.credential)) {
            Ok(resp) => {
                debug!(username = %resp.username, "stored session is valid");
                self.store
                    .set(Session::new(session.credential, resp.username.clone()));
                self.enter_dashboard(resp.username);
                Ok(())
            }
            Err(e) => {
                let err = PanelError::auth_from(e);
                info!(error = %err, "stored session rejected");
                self.end_session();
                Err(err)
            }
        }
    }

    /// Log in with credentials. On failure the state stays `LoggedOut` and
    /// the login view shows the server's message.
    pub fn submit_login(&mut self, username: &str, password: &str) -> Result<(), PanelError> {
        if let Err(err) = validate::login(username, password) {
            self.renderer.login(Some(&err.to_string()));
            return Err(err);
        }
        let username = username.trim();

        self.state = DashboardState::Validating;
        match self.api.login(username, password) {
            Ok(resp) => {
                let name = resp
                    .username
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| username.to_string());
                info!(username = %name, "logged in");
                self.store.set(Session::new(resp.session_id, name.clone()));
                self.record("login", &name, Ok(()));
                self.enter_dashboard(name);
                Ok(())
            }
            Err(e) => {
                let err = PanelError::auth_from(e);
                warn!(username, error = %err, "login failed");
                self.record("login", username, Err(&err));
                self.timer.stop();
                self.state = DashboardState::LoggedOut;
                self.renderer.login(Some(&login_message(&err)));
                Err(err)
            }
        }
    }

    /// End the session: best-effort server logout, then clear local state
    /// whatever the server said.
    pub fn logout(&mut self) {
        self.timer.stop();
        if let Some(session) = self.store.get() {
            if let Err(e) = self.api.logout(Some(&session.credential)) {
                warn!(error = %e, "logout request failed; clearing local session anyway");
            }
            self.record("logout", &session.username, Ok(()));
        }
        self.end_session();
        self.renderer.notice(&Notice::info("Logged out"));
    }

    fn enter_dashboard(&mut self, username: String) {
        self.state = DashboardState::Authenticated {
            username: username.clone(),
        };
        self.timer.start(Instant::now());
        debug!(
            interval_ms = self.timer.interval().as_millis() as u64,
            "poll timer armed"
        );
        if self.autoload {
            self.renderer.dashboard(&username);
            self.refresh_all();
        }
    }

    fn end_session(&mut self) {
        self.timer.stop();
        self.store.clear();
        self.state = DashboardState::LoggedOut;
        self.renderer.login(None);
    }

    /// Credential for an authenticated request, or `Auth` without a network
    /// call when there is no authenticated session.
    fn credential(&self) -> Result<String, PanelError> {
        if !self.state.is_authenticated() {
            return Err(PanelError::Auth("not logged in".to_string()));
        }
        self.store
            .get()
            .map(|s| s.credential)
            .ok_or_else(|| PanelError::Auth("not logged in".to_string()))
    }

    // -----------------------------------------------------------------------
    // Polling
    // -----------------------------------------------------------------------

    /// Run a refresh tick if one is due at `now`.
    pub fn poll(&mut self, now: Instant) -> Option<TickReport> {
        if !self.state.is_authenticated() {
            return None;
        }
        if !self.timer.fire(now) {
            return None;
        }
        Some(self.tick())
    }

    /// Refresh metrics and health. Failures are logged and leave the
    /// session alone; the next tick tries again.
    pub fn tick(&mut self) -> TickReport {
        TickReport {
            metrics: self.load_metrics(),
            health: self.load_health(),
        }
    }

    // -----------------------------------------------------------------------
    // Loaders
    // -----------------------------------------------------------------------

    /// Load every panel. Each panel fails independently.
    pub fn refresh_all(&mut self) {
        let _ = self.load_metrics();
        let _ = self.load_domains();
        let _ = self.load_health();
        let _ = self.load_users();
    }

    pub fn load_metrics(&mut self) -> Result<Metrics, PanelError> {
        let session = self.credential()?;
        match self.api.metrics(Some(&session)) {
            Ok(metrics) => {
                self.renderer.metrics(&render::metrics_view(&metrics));
                Ok(metrics)
            }
            Err(e) => {
                let err = PanelError::from(e);
                warn!(error = %err, "failed to load metrics");
                Err(err)
            }
        }
    }

    pub fn load_health(&mut self) -> Result<Health, PanelError> {
        let session = self.credential()?;
        match self.api.health(Some(&session)) {
            Ok(health) => {
                self.renderer.health(&render::health_view(&health));
                Ok(health)
            }
            Err(e) => {
                let err = PanelError::from(e);
                warn!(error = %err, "failed to load health");
                Err(err)
            }
        }
    }

    pub fn load_domains(&mut self) -> Result<(), PanelError> {
        let session = self.credential()?;
        match self.api.domains(Some(&session)) {
            Ok(list) => {
                self.renderer.domains(&render::domain_rows(&list.domains));
                Ok(())
            }
            Err(e) => {
                let err = PanelError::from(e);
                warn!(error = %err, "failed to load domains");
                self.renderer
                    .notice(&Notice::error(format!("Failed to load domains: {err}")));
                Err(err)
            }
        }
    }

    pub fn load_users(&mut self) -> Result<(), PanelError> {
        let session = self.credential()?;
        match self.api.users(Some(&session)) {
            Ok(users) => {
                let rows = render::user_rows(&users, &self.origin, Utc::now());
                self.renderer.users(&rows);
                Ok(())
            }
            Err(e) => {
                let err = PanelError::from(e);
                warn!(error = %err, "failed to load users");
                self.renderer
                    .notice(&Notice::error(format!("Failed to load users: {err}")));
                Err(err)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Domains
    // -----------------------------------------------------------------------

    pub fn add_domain(&mut self, input: &str) -> Result<(), PanelError> {
        let domain = self.checked(validate::domain(input))?;
        self.mutate("domain.add", &domain, Some("Domain added"), |api, s| {
            api.add_domain(s, &domain)
        })?;
        let _ = self.load_domains();
        Ok(())
    }

    pub fn remove_domain(&mut self, input: &str) -> Result<(), PanelError> {
        let domain = self.checked(validate::domain(input))?;
        self.mutate("domain.remove", &domain, Some("Domain removed"), |api, s| {
            api.remove_domain(s, &domain)
        })?;
        let _ = self.load_domains();
        Ok(())
    }

    /// Ask the proxy to reload its configuration, then reload every panel.
    pub fn reload_config(&mut self) -> Result<(), PanelError> {
        self.mutate(
            "config.reload",
            "",
            Some("Configuration reloaded successfully"),
            |api, s| api.reload(s),
        )?;
        self.refresh_all();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    /// Create a user and show its register link.
    pub fn create_user(&mut self, input: &NewUser) -> Result<CreatedUser, PanelError> {
        let user = self.checked(validate::new_user(input))?;
        let created = self.mutate("user.create", &user.name, None, |api, s| {
            api.create_user(s, &user)
        })?;
        let view = render::created_user_view(&created, &self.origin, user.valid_days);
        self.renderer.user_created(&view);
        let _ = self.load_users();
        Ok(created)
    }

    pub fn extend_user(&mut self, user_id: &str, days: u32) -> Result<(), PanelError> {
        let id = self.checked(validate::user_id(user_id))?;
        let days = self.checked(validate::extend_days(days))?;
        let message = format!("User extended by {days} days");
        self.mutate("user.extend", &id, Some(&message), |api, s| {
            api.extend_user(s, &id, days)
        })?;
        let _ = self.load_users();
        Ok(())
    }

    pub fn deactivate_user(&mut self, user_id: &str) -> Result<(), PanelError> {
        let id = self.checked(validate::user_id(user_id))?;
        self.mutate("user.deactivate", &id, Some("User deactivated"), |api, s| {
            api.deactivate_user(s, &id)
        })?;
        let _ = self.load_users();
        Ok(())
    }

    pub fn delete_user(&mut self, user_id: &str) -> Result<(), PanelError> {
        let id = self.checked(validate::user_id(user_id))?;
        self.mutate("user.delete", &id, Some("User deleted"), |api, s| {
            api.delete_user(s, &id)
        })?;
        let _ = self.load_users();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Account settings
    // -----------------------------------------------------------------------

    pub fn change_password(&mut self, change: &PasswordChange) -> Result<(), PanelError> {
        self.checked(validate::password_change(change))?;
        let target = self.username().unwrap_or_default().to_string();
        self.mutate(
            "settings.password",
            &target,
            Some("Password changed successfully"),
            |api, s| api.change_password(s, &change.current, &change.new),
        )
    }

    /// Rename the admin account. On success the session is ended and the
    /// admin has to log in again under the new name.
    pub fn change_username(&mut self, password: &str, new_username: &str) -> Result<(), PanelError> {
        let new_username = self.checked(validate::username_change(password, new_username))?;
        self.mutate(
            "settings.username",
            &new_username,
            Some("Username changed successfully. Logging out..."),
            |api, s| api.change_username(s, password, &new_username),
        )?;
        self.logout();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Action plumbing
    // -----------------------------------------------------------------------

    /// Surface a local validation failure.
    fn checked<T>(&mut self, result: Result<T, PanelError>) -> Result<T, PanelError> {
        if let Err(ref err) = result {
            self.renderer.notice(&Notice::error(err.to_string()));
        }
        result
    }

    /// Run one authenticated request, then notify and audit its outcome.
    fn mutate<T>(
        &mut self,
        action: &str,
        target: &str,
        success: Option<&str>,
        call: impl FnOnce(&A, Option<&str>) -> ApiResult<T>,
    ) -> Result<T, PanelError> {
        let outcome = self
            .credential()
            .and_then(|session| call(&self.api, Some(&session)).map_err(PanelError::from));

        match &outcome {
            Ok(_) => {
                info!(action, target, "panel action succeeded");
                self.record(action, target, Ok(()));
                if let Some(message) = success {
                    self.renderer.notice(&Notice::success(message));
                }
            }
            Err(err) => {
                warn!(action, target, error = %err, "panel action failed");
                if !matches!(err, PanelError::Auth(_)) {
                    self.record(action, target, Err(err));
                }
                self.renderer.notice(&Notice::error(err.to_string()));
            }
        }
        outcome
    }

    fn record(&self, action: &str, target: &str, outcome: Result<(), &PanelError>) {
        if let Some(ref audit) = self.audit {
            audit.record(&AuditEntry::new(action, target, outcome));
        }
    }
}

fn login_message(err: &PanelError) -> String {
    match err {
        PanelError::Auth(message) => message.clone(),
        other => other.to_string(),
    }
}
