//! Client side of the SmartSNI panel REST API.
//!
//! [`PanelApi`] has one method per backend endpoint. Every method that talks
//! to an authenticated endpoint takes the session credential; implementations
//! attach it as the `X-Session-ID` header when present. Methods never panic
//! on HTTP failures; see [`ApiError`](crate::error::ApiError).

pub mod client;
pub mod types;

pub use client::{HttpPanelClient, SESSION_HEADER};
pub use types::{
    CreatedUser, DomainList, DomainMap, Health, HealthStatus, LoginResponse, Metrics, NewUser,
    User, ValidateResponse,
};

use crate::error::ApiResult;

/// Operations exposed by the panel backend.
pub trait PanelApi {
    /// `POST /panel/api/login`
    fn login(&self, username: &str, password: &str) -> ApiResult<LoginResponse>;
    /// `GET /panel/api/validate`
    fn validate(&self, session: Option<&str>) -> ApiResult<ValidateResponse>;
    /// `POST /panel/api/logout`
    fn logout(&self, session: Option<&str>) -> ApiResult<()>;

    /// `GET /panel/api/metrics`
    fn metrics(&self, session: Option<&str>) -> ApiResult<Metrics>;
    /// `GET /panel/api/health`
    fn health(&self, session: Option<&str>) -> ApiResult<Health>;

    /// `GET /panel/api/domains`
    fn domains(&self, session: Option<&str>) -> ApiResult<DomainList>;
    /// `POST /panel/api/domains/add`
    fn add_domain(&self, session: Option<&str>, domain: &str) -> ApiResult<()>;
    /// `POST /panel/api/domains/remove`
    fn remove_domain(&self, session: Option<&str>, domain: &str) -> ApiResult<()>;
    /// `POST /panel/api/reload`
    fn reload(&self, session: Option<&str>) -> ApiResult<()>;

    /// `GET /panel/api/users`
    fn users(&self, session: Option<&str>) -> ApiResult<Vec<User>>;
    /// `POST /panel/api/users/create`
    fn create_user(&self, session: Option<&str>, user: &NewUser) -> ApiResult<CreatedUser>;
    /// `POST /panel/api/users/extend`
    fn extend_user(&self, session: Option<&str>, user_id: &str, days: u32) -> ApiResult<()>;
    /// `POST /panel/api/users/deactivate`
    fn deactivate_user(&self, session: Option<&str>, user_id: &str) -> ApiResult<()>;
    /// `POST /panel/api/users/delete`
    fn delete_user(&self, session: Option<&str>, user_id: &str) -> ApiResult<()>;

    /// `POST /panel/api/settings/change-password`
    fn change_password(
        &self,
        session: Option<&str>,
        current_password: &str,
        new_password: &str,
    ) -> ApiResult<()>;
    /// `POST /panel/api/settings/change-username`
    fn change_username(
        &self,
        session: Option<&str>,
        password: &str,
        new_username: &str,
    ) -> ApiResult<()>;
}
