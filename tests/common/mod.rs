//! Test doubles for driving the dashboard controller without a panel or a
//! terminal.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use chrono::{Duration, Utc};

use smartsni_panel::api::{
    CreatedUser, DomainList, DomainMap, Health, HealthStatus, LoginResponse, Metrics, NewUser,
    PanelApi, User, ValidateResponse,
};
use smartsni_panel::dashboard::{Dashboard, DashboardOptions};
use smartsni_panel::error::{ApiError, ApiResult};
use smartsni_panel::render::{
    CreatedUserView, DomainRow, HealthView, MetricsView, Notice, NoticeKind, Renderer, UserRow,
};
use smartsni_panel::session::{MemorySessionStore, Session};

pub const ADMIN: &str = "admin";
pub const PASSWORD: &str = "s3cret";
pub const SESSION_ID: &str = "sess-1";
pub const ORIGIN: &str = "http://panel.test";

// ---------------------------------------------------------------------------
// Fake panel backend
// ---------------------------------------------------------------------------

/// One request seen by [`FakeApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub endpoint: &'static str,
    pub session: Option<String>,
}

/// In-memory panel backend with one admin account.
///
/// Accepts `SESSION_ID` only; any other credential gets a 401, like the real
/// auth middleware. Failures can be queued per endpoint with
/// [`fail_next`](FakeApi::fail_next).
pub struct FakeApi {
    calls: RefCell<Vec<Call>>,
    failures: RefCell<HashMap<&'static str, VecDeque<ApiError>>>,
    domains: RefCell<DomainMap>,
    users: RefCell<Vec<User>>,
    password: RefCell<String>,
    next_user_id: RefCell<u32>,
}

impl Default for FakeApi {
    fn default() -> Self {
        let mut domains = DomainMap::new();
        domains.insert("example.com".to_string(), "10.0.0.1".to_string());
        Self {
            calls: RefCell::new(Vec::new()),
            failures: RefCell::new(HashMap::new()),
            domains: RefCell::new(domains),
            users: RefCell::new(Vec::new()),
            password: RefCell::new(PASSWORD.to_string()),
            next_user_id: RefCell::new(1),
        }
    }
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next request to `endpoint` fail with `err`.
    pub fn fail_next(&self, endpoint: &'static str, err: ApiError) {
        self.failures
            .borrow_mut()
            .entry(endpoint)
            .or_default()
            .push_back(err);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, endpoint: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.endpoint == endpoint)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn domain_map(&self) -> DomainMap {
        self.domains.borrow().clone()
    }

    pub fn user_list(&self) -> Vec<User> {
        self.users.borrow().clone()
    }

    pub fn add_user(&self, user: User) {
        self.users.borrow_mut().push(user);
    }

    fn enter(&self, endpoint: &'static str, session: Option<&str>) -> ApiResult<()> {
        self.calls.borrow_mut().push(Call {
            endpoint,
            session: session.map(str::to_string),
        });
        if let Some(err) = self
            .failures
            .borrow_mut()
            .get_mut(endpoint)
            .and_then(VecDeque::pop_front)
        {
            return Err(err);
        }
        Ok(())
    }

    fn authed(&self, endpoint: &'static str, session: Option<&str>) -> ApiResult<()> {
        self.enter(endpoint, session)?;
        if session != Some(SESSION_ID) {
            return Err(status(401, "Unauthorized"));
        }
        Ok(())
    }

    fn update_user(&self, user_id: &str, f: impl FnOnce(&mut User)) -> ApiResult<()> {
        let mut users = self.users.borrow_mut();
        match users.iter_mut().find(|u| u.id == user_id) {
            Some(user) => {
                f(user);
                Ok(())
            }
            None => Err(status(404, "User not found")),
        }
    }
}

pub fn status(code: u16, message: &str) -> ApiError {
    ApiError::Status {
        status: code,
        message: message.to_string(),
    }
}

pub fn transport() -> ApiError {
    ApiError::Transport("connection refused".to_string())
}

pub fn user(id: &str, name: &str) -> User {
    User {
        id: id.to_string(),
        name: name.to_string(),
        description: None,
        ips: Vec::new(),
        max_ips: 1,
        created_at: Some(Utc::now()),
        expires_at: Utc::now() + Duration::days(30),
        is_active: true,
        usage_count: 0,
        last_used: None,
    }
}

impl PanelApi for FakeApi {
    fn login(&self, username: &str, password: &str) -> ApiResult<LoginResponse> {
        self.enter("login", None)?;
        if username != ADMIN || password != *self.password.borrow() {
            return Err(status(401, "Invalid credentials"));
        }
        Ok(LoginResponse {
            session_id: SESSION_ID.to_string(),
            username: Some(ADMIN.to_string()),
        })
    }

    fn validate(&self, session: Option<&str>) -> ApiResult<ValidateResponse> {
        self.enter("validate", session)?;
        if session != Some(SESSION_ID) {
            return Err(status(401, "Invalid session"));
        }
        Ok(ValidateResponse {
            username: ADMIN.to_string(),
        })
    }

    fn logout(&self, session: Option<&str>) -> ApiResult<()> {
        self.enter("logout", session)
    }

    fn metrics(&self, session: Option<&str>) -> ApiResult<Metrics> {
        self.authed("metrics", session)?;
        Ok(Metrics {
            doh_queries: 1_200,
            dot_queries: 30,
            sni_connections: 450,
            cache_hits: 3,
            cache_misses: 1,
            errors: 0,
        })
    }

    fn health(&self, session: Option<&str>) -> ApiResult<Health> {
        self.authed("health", session)?;
        Ok(Health {
            version: "1.4.0".to_string(),
            uptime_seconds: 3_725.0,
            status: HealthStatus::Healthy,
        })
    }

    fn domains(&self, session: Option<&str>) -> ApiResult<DomainList> {
        self.authed("domains", session)?;
        Ok(DomainList {
            domains: self.domains.borrow().clone(),
            host: Some("10.0.0.1".to_string()),
        })
    }

    fn add_domain(&self, session: Option<&str>, domain: &str) -> ApiResult<()> {
        self.authed("domains/add", session)?;
        self.domains
            .borrow_mut()
            .insert(domain.to_string(), "10.0.0.1".to_string());
        Ok(())
    }

    fn remove_domain(&self, session: Option<&str>, domain: &str) -> ApiResult<()> {
        self.authed("domains/remove", session)?;
        match self.domains.borrow_mut().remove(domain) {
            Some(_) => Ok(()),
            None => Err(status(404, "Domain not found")),
        }
    }

    fn reload(&self, session: Option<&str>) -> ApiResult<()> {
        self.authed("reload", session)
    }

    fn users(&self, session: Option<&str>) -> ApiResult<Vec<User>> {
        self.authed("users", session)?;
        Ok(self.users.borrow().clone())
    }

    fn create_user(&self, session: Option<&str>, new: &NewUser) -> ApiResult<CreatedUser> {
        self.authed("users/create", session)?;
        let id = {
            let mut next = self.next_user_id.borrow_mut();
            let id = format!("u{next}");
            *next += 1;
            id
        };
        let mut created = user(&id, &new.name);
        created.description = Some(new.description.clone());
        created.max_ips = new.max_ips;
        created.expires_at = Utc::now() + Duration::days(i64::from(new.valid_days));
        self.users.borrow_mut().push(created.clone());
        Ok(CreatedUser {
            register_url: Some(format!("/register?token={id}")),
            user: created,
        })
    }

    fn extend_user(&self, session: Option<&str>, user_id: &str, days: u32) -> ApiResult<()> {
        self.authed("users/extend", session)?;
        self.update_user(user_id, |u| {
            u.expires_at += Duration::days(i64::from(days));
            u.is_active = true;
        })
    }

    fn deactivate_user(&self, session: Option<&str>, user_id: &str) -> ApiResult<()> {
        self.authed("users/deactivate", session)?;
        self.update_user(user_id, |u| u.is_active = false)
    }

    fn delete_user(&self, session: Option<&str>, user_id: &str) -> ApiResult<()> {
        self.authed("users/delete", session)?;
        let mut users = self.users.borrow_mut();
        let before = users.len();
        users.retain(|u| u.id != user_id);
        if users.len() == before {
            return Err(status(404, "User not found"));
        }
        Ok(())
    }

    fn change_password(&self, session: Option<&str>, current: &str, new: &str) -> ApiResult<()> {
        self.authed("settings/change-password", session)?;
        if current != *self.password.borrow() {
            return Err(status(401, "Current password is incorrect"));
        }
        *self.password.borrow_mut() = new.to_string();
        Ok(())
    }

    fn change_username(
        &self,
        session: Option<&str>,
        password: &str,
        _new_username: &str,
    ) -> ApiResult<()> {
        self.authed("settings/change-username", session)?;
        if password != *self.password.borrow() {
            return Err(status(401, "Password is incorrect"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Recording renderer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    Login(Option<String>),
    Dashboard(String),
    Metrics(MetricsView),
    Health(HealthView),
    Domains(Vec<DomainRow>),
    Users(Vec<UserRow>),
    UserCreated(CreatedUserView),
    Notice(Notice),
}

#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub events: Vec<Rendered>,
}

impl RecordingRenderer {
    pub fn notices(&self, kind: NoticeKind) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Rendered::Notice(n) if n.kind == kind => Some(n.message.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn last_domains(&self) -> Option<&[DomainRow]> {
        self.events.iter().rev().find_map(|e| match e {
            Rendered::Domains(rows) => Some(rows.as_slice()),
            _ => None,
        })
    }

    pub fn last_users(&self) -> Option<&[UserRow]> {
        self.events.iter().rev().find_map(|e| match e {
            Rendered::Users(rows) => Some(rows.as_slice()),
            _ => None,
        })
    }

    pub fn created(&self) -> Option<&CreatedUserView> {
        self.events.iter().rev().find_map(|e| match e {
            Rendered::UserCreated(view) => Some(view),
            _ => None,
        })
    }

    pub fn last_login(&self) -> Option<&Option<String>> {
        self.events.iter().rev().find_map(|e| match e {
            Rendered::Login(err) => Some(err),
            _ => None,
        })
    }
}

impl Renderer for RecordingRenderer {
    fn login(&mut self, error: Option<&str>) {
        self.events.push(Rendered::Login(error.map(str::to_string)));
    }

    fn dashboard(&mut self, username: &str) {
        self.events.push(Rendered::Dashboard(username.to_string()));
    }

    fn metrics(&mut self, view: &MetricsView) {
        self.events.push(Rendered::Metrics(view.clone()));
    }

    fn health(&mut self, view: &HealthView) {
        self.events.push(Rendered::Health(view.clone()));
    }

    fn domains(&mut self, rows: &[DomainRow]) {
        self.events.push(Rendered::Domains(rows.to_vec()));
    }

    fn users(&mut self, rows: &[UserRow]) {
        self.events.push(Rendered::Users(rows.to_vec()));
    }

    fn user_created(&mut self, view: &CreatedUserView) {
        self.events.push(Rendered::UserCreated(view.clone()));
    }

    fn notice(&mut self, notice: &Notice) {
        self.events.push(Rendered::Notice(notice.clone()));
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

pub type TestDashboard = Dashboard<FakeApi, MemorySessionStore, RecordingRenderer>;

pub fn options() -> DashboardOptions {
    DashboardOptions {
        origin: ORIGIN.to_string(),
        poll_interval: std::time::Duration::from_millis(5_000),
        autoload: true,
    }
}

/// A controller with no stored session.
pub fn logged_out(api: FakeApi) -> TestDashboard {
    Dashboard::new(
        api,
        MemorySessionStore::new(),
        RecordingRenderer::default(),
        options(),
    )
}

/// A controller with `credential` in its store, not yet validated.
pub fn with_stored(api: FakeApi, credential: &str) -> TestDashboard {
    Dashboard::new(
        api,
        MemorySessionStore::with_session(Session::new(credential, "")),
        RecordingRenderer::default(),
        options(),
    )
}

/// A controller that has validated `SESSION_ID` and finished its initial
/// load.
pub fn signed_in(api: FakeApi) -> TestDashboard {
    let mut dashboard = with_stored(api, SESSION_ID);
    dashboard.start();
    assert!(dashboard.is_authenticated());
    dashboard
}
