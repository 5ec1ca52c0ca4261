/// Local input checks run before any request is sent.
use crate::api::NewUser;
use crate::error::PanelError;

pub const MAX_IPS_RANGE: std::ops::RangeInclusive<u32> = 1..=100;
pub const VALID_DAYS_RANGE: std::ops::RangeInclusive<u32> = 1..=365;
pub const MIN_PASSWORD_LEN: usize = 4;
pub const MIN_USERNAME_LEN: usize = 3;

/// Input of the change-password form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordChange {
    pub current: String,
    pub new: String,
    pub confirm: String,
}

pub fn login(username: &str, password: &str) -> Result<(), PanelError> {
    if username.trim().is_empty() || password.is_empty() {
        return Err(PanelError::validation("Username and password are required"));
    }
    Ok(())
}

/// Trimmed domain, or an error when nothing is left.
pub fn domain(input: &str) -> Result<String, PanelError> {
    let domain = input.trim();
    if domain.is_empty() {
        return Err(PanelError::validation("Please enter a domain"));
    }
    Ok(domain.to_string())
}

/// Normalized user creation request.
pub fn new_user(input: &NewUser) -> Result<NewUser, PanelError> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(PanelError::validation("Please enter a name"));
    }
    if !MAX_IPS_RANGE.contains(&input.max_ips) {
        return Err(PanelError::validation(format!(
            "Please enter valid max IPs ({}-{})",
            MAX_IPS_RANGE.start(),
            MAX_IPS_RANGE.end()
        )));
    }
    if !VALID_DAYS_RANGE.contains(&input.valid_days) {
        return Err(PanelError::validation(format!(
            "Please enter valid days ({}-{})",
            VALID_DAYS_RANGE.start(),
            VALID_DAYS_RANGE.end()
        )));
    }

    Ok(NewUser {
        name: name.to_string(),
        description: input.description.trim().to_string(),
        max_ips: input.max_ips,
        valid_days: input.valid_days,
    })
}

pub fn user_id(user_id: &str) -> Result<String, PanelError> {
    let id = user_id.trim();
    if id.is_empty() {
        return Err(PanelError::validation("User id is required"));
    }
    Ok(id.to_string())
}

pub fn extend_days(days: u32) -> Result<u32, PanelError> {
    if days == 0 {
        return Err(PanelError::validation("Extend by at least one day"));
    }
    Ok(days)
}

pub fn password_change(change: &PasswordChange) -> Result<(), PanelError> {
    if change.current.is_empty() || change.new.is_empty() || change.confirm.is_empty() {
        return Err(PanelError::validation("All fields are required"));
    }
    if change.new != change.confirm {
        return Err(PanelError::validation("New passwords do not match"));
    }
    if change.new.chars().count() < MIN_PASSWORD_LEN {
        return Err(PanelError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub fn username_change(password: &str, new_username: &str) -> Result<String, PanelError> {
    let new_username = new_username.trim();
    if password.is_empty() || new_username.is_empty() {
        return Err(PanelError::validation("All fields are required"));
    }
    if new_username.chars().count() < MIN_USERNAME_LEN {
        return Err(PanelError::validation(format!(
            "Username must be at least {MIN_USERNAME_LEN} characters"
        )));
    }
    Ok(new_username.to_string())
}
