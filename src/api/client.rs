/// Blocking HTTP client for the SmartSNI panel API.
///
/// Uses a shared `ureq` agent with a per-request timeout. Every request for
/// an authenticated endpoint carries the session credential in the
/// `X-Session-ID` header. HTTP-level failures (4xx/5xx) come back as
/// [`ApiError::Status`] with the message the backend put in its
/// `{"error": ...}` body; network-level failures come back as
/// [`ApiError::Transport`].
use std::time::Duration;

use serde::Serialize;
use serde::de::{DeserializeOwned, IgnoredAny};

use super::PanelApi;
use super::types::{
    ChangePasswordRequest, ChangeUsernameRequest, CreatedUser, DomainList, DomainRequest,
    ErrorBody, ExtendRequest, Health, LoginRequest, LoginResponse, Metrics, NewUser,
    UserIdRequest, UserList, ValidateResponse,
};
use crate::config::schema::PanelSection;
use crate::error::{ApiError, ApiResult};

/// Header carrying the opaque session credential.
pub const SESSION_HEADER: &str = "X-Session-ID";

/// `ureq`-backed [`PanelApi`] implementation.
#[derive(Debug)]
pub struct HttpPanelClient {
    agent: ureq::Agent,
    base_url: String,
    timeout: Duration,
}

impl HttpPanelClient {
    /// Build a client for the panel at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        // "localhost" may resolve to ::1 first while the panel only binds
        // IPv4, which stalls every request until the connect timeout.
        let base_url = base_url
            .trim_end_matches('/')
            .replace("://localhost", "://127.0.0.1");
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            base_url,
            timeout,
        }
    }

    /// Build a client from the `[panel]` config section.
    pub fn from_config(panel: &PanelSection) -> Self {
        Self::new(&panel.base_url, Duration::from_millis(panel.timeout_ms))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn request(&self, method: &str, path: &str, session: Option<&str>) -> ureq::Request {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%method, %url, "panel request");
        let request = self.agent.request(method, &url);
        match session.filter(|id| !id.is_empty()) {
            Some(id) => request.set(SESSION_HEADER, id),
            None => request,
        }
    }

    fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        session: Option<&str>,
        fallback: &str,
    ) -> ApiResult<T> {
        finish(self.request("GET", path, session).call(), fallback)
    }

    fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        session: Option<&str>,
        body: Option<&B>,
        fallback: &str,
    ) -> ApiResult<T> {
        let request = self.request("POST", path, session);
        let result = match body {
            Some(body) => request.send_json(body),
            None => request.call(),
        };
        finish(result, fallback)
    }

    /// POST whose success body carries nothing the caller needs.
    fn post_ack<B: Serialize>(
        &self,
        path: &str,
        session: Option<&str>,
        body: Option<&B>,
        fallback: &str,
    ) -> ApiResult<()> {
        self.post::<B, IgnoredAny>(path, session, body, fallback)
            .map(|_| ())
    }
}

impl PanelApi for HttpPanelClient {
    fn login(&self, username: &str, password: &str) -> ApiResult<LoginResponse> {
        let body = LoginRequest { username, password };
        self.post("/panel/api/login", None, Some(&body), "Login failed")
    }

    fn validate(&self, session: Option<&str>) -> ApiResult<ValidateResponse> {
        self.get("/panel/api/validate", session, "Invalid session")
    }

    fn logout(&self, session: Option<&str>) -> ApiResult<()> {
        self.post_ack::<()>("/panel/api/logout", session, None, "Logout failed")
    }

    fn metrics(&self, session: Option<&str>) -> ApiResult<Metrics> {
        self.get("/panel/api/metrics", session, "Failed to load metrics")
    }

    fn health(&self, session: Option<&str>) -> ApiResult<Health> {
        self.get("/panel/api/health", session, "Failed to load health")
    }

    fn domains(&self, session: Option<&str>) -> ApiResult<DomainList> {
        self.get("/panel/api/domains", session, "Failed to load domains")
    }

    fn add_domain(&self, session: Option<&str>, domain: &str) -> ApiResult<()> {
        let body = DomainRequest { domain };
        self.post_ack(
            "/panel/api/domains/add",
            session,
            Some(&body),
            "Failed to add domain",
        )
    }

    fn remove_domain(&self, session: Option<&str>, domain: &str) -> ApiResult<()> {
        let body = DomainRequest { domain };
        self.post_ack(
            "/panel/api/domains/remove",
            session,
            Some(&body),
            "Failed to remove domain",
        )
    }

    fn reload(&self, session: Option<&str>) -> ApiResult<()> {
        self.post_ack::<()>(
            "/panel/api/reload",
            session,
            None,
            "Failed to reload configuration",
        )
    }

    fn users(&self, session: Option<&str>) -> ApiResult<Vec<super::User>> {
        self.get::<UserList>("/panel/api/users", session, "Failed to load users")
            .map(|list| list.users)
    }

    fn create_user(&self, session: Option<&str>, user: &NewUser) -> ApiResult<CreatedUser> {
        self.post(
            "/panel/api/users/create",
            session,
            Some(user),
            "Failed to create user",
        )
    }

    fn extend_user(&self, session: Option<&str>, user_id: &str, days: u32) -> ApiResult<()> {
        let body = ExtendRequest { user_id, days };
        self.post_ack(
            "/panel/api/users/extend",
            session,
            Some(&body),
            "Failed to extend user",
        )
    }

    fn deactivate_user(&self, session: Option<&str>, user_id: &str) -> ApiResult<()> {
        let body = UserIdRequest { user_id };
        self.post_ack(
            "/panel/api/users/deactivate",
            session,
            Some(&body),
            "Failed to deactivate user",
        )
    }

    fn delete_user(&self, session: Option<&str>, user_id: &str) -> ApiResult<()> {
        let body = UserIdRequest { user_id };
        self.post_ack(
            "/panel/api/users/delete",
            session,
            Some(&body),
            "Failed to delete user",
        )
    }

    fn change_password(
        &self,
        session: Option<&str>,
        current_password: &str,
        new_password: &str,
    ) -> ApiResult<()> {
        let body = ChangePasswordRequest {
            current_password,
            new_password,
        };
        self.post_ack(
            "/panel/api/settings/change-password",
            session,
            Some(&body),
            "Failed to change password",
        )
    }

    fn change_username(
        &self,
        session: Option<&str>,
        password: &str,
        new_username: &str,
    ) -> ApiResult<()> {
        let body = ChangeUsernameRequest {
            password,
            new_username,
        };
        self.post_ack(
            "/panel/api/settings/change-username",
            session,
            Some(&body),
            "Failed to change username",
        )
    }
}

// ---------------------------------------------------------------------------
// Response handling
// ---------------------------------------------------------------------------

/// Turn a `ureq` outcome into an [`ApiResult`].
fn finish<T: DeserializeOwned>(
    result: Result<ureq::Response, ureq::Error>,
    fallback: &str,
) -> ApiResult<T> {
    match result {
        Ok(resp) => {
            let body = resp
                .into_string()
                .map_err(|e| ApiError::Transport(format!("failed to read response: {e}")))?;
            decode_body(&body)
        }
        Err(ureq::Error::Status(status, resp)) => {
            let body = resp.into_string().unwrap_or_default();
            Err(ApiError::Status {
                status,
                message: error_message(&body, fallback),
            })
        }
        Err(ureq::Error::Transport(transport)) => Err(ApiError::Transport(transport.to_string())),
    }
}

/// Decode a success body. An empty body decodes as JSON `null`.
fn decode_body<T: DeserializeOwned>(body: &str) -> ApiResult<T> {
    let text = if body.trim().is_empty() { "null" } else { body };
    serde_json::from_str(text).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Extract the human-readable message from an error body.
///
/// Prefers the JSON `error` field, then the raw body text, then `fallback`.
fn error_message(body: &str, fallback: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return fallback.to_string();
    }

    match serde_json::from_str::<ErrorBody>(trimmed) {
        Ok(ErrorBody { error: Some(msg) }) if !msg.trim().is_empty() => msg,
        Ok(_) => fallback.to_string(),
        Err(_) => trimmed.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
