//! Form validation run before any request leaves the client.
//!
//! Each check returns the first failing rule as a [`ClientError::Validation`].

use super::error::ClientError;
use super::session::LoginKind;
use crate::auth::models::Role;
use crate::users::api::{CreateUserRequest, UpdateUserRequest};
use crate::users::images::parse_data_uri;
use lazy_static::lazy_static;
use regex::Regex;

const PASSWORD_SPECIALS: &str = "!@#$%^&*";
pub const MIN_PASSWORD_LEN: usize = 8;
pub const MIN_ADMIN_CREATE_PASSWORD_LEN: usize = 6;
pub const MIN_USERNAME_LEN: usize = 3;
pub const MIN_SEARCH_LEN: usize = 3;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
    static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9_]+$").unwrap();
}

type Checked<T> = Result<T, ClientError>;

fn fail<T>(message: &str) -> Checked<T> {
    Err(ClientError::validation(message))
}

pub fn email(value: &str) -> Checked<()> {
    let value = value.trim();
    if value.is_empty() {
        return fail("Email is required");
    }
    if !EMAIL_RE.is_match(value) {
        return fail("Please enter a valid email address");
    }
    Ok(())
}

/// At least 8 characters with lowercase, uppercase, digit and one of `!@#$%^&*`
pub fn strong_password(value: &str) -> Checked<()> {
    if value.is_empty() {
        return fail("Password is required");
    }
    if value.chars().count() < MIN_PASSWORD_LEN {
        return fail("Password must be at least 8 characters");
    }
    let has_lower = value.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = value.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = value.chars().any(|c| c.is_ascii_digit());
    let has_special = value.chars().any(|c| PASSWORD_SPECIALS.contains(c));
    if !(has_lower && has_upper && has_digit && has_special) {
        return fail(
            "Password must contain uppercase, lowercase, number and special character (!@#$%^&*)",
        );
    }
    Ok(())
}

pub fn username(value: &str) -> Checked<()> {
    let value = value.trim();
    if value.is_empty() {
        return fail("Username is required");
    }
    if value.chars().count() < MIN_USERNAME_LEN {
        return fail("Username must be at least 3 characters");
    }
    if !USERNAME_RE.is_match(value) {
        return fail("Username can only contain letters, numbers and underscores");
    }
    Ok(())
}

/// Admin sign-in only needs a non-empty password; the admin secret is not
/// subject to the strength policy.
pub fn login_form(kind: LoginKind, email_value: &str, password: &str) -> Checked<()> {
    email(email_value)?;
    match kind {
        LoginKind::User => strong_password(password),
        LoginKind::Admin if password.is_empty() => fail("Password is required"),
        LoginKind::Admin => Ok(()),
    }
}

pub fn register_form(
    username_value: &str,
    email_value: &str,
    password: &str,
    confirm: &str,
) -> Checked<()> {
    username(username_value)?;
    email(email_value)?;
    strong_password(password)?;
    if confirm.is_empty() {
        return fail("Please confirm your password");
    }
    if password != confirm {
        return fail("Passwords do not match");
    }
    Ok(())
}

pub fn new_user_form(request: &CreateUserRequest) -> Checked<()> {
    if request.username.trim().is_empty() {
        return fail("Username is required");
    }
    email(&request.email)?;
    if request.password.chars().count() < MIN_ADMIN_CREATE_PASSWORD_LEN {
        return fail("Password must be at least 6 characters");
    }
    Ok(())
}

/// Build the update patch from the edit form. An empty password means "keep".
pub fn edit_user_form(
    username_value: &str,
    email_value: &str,
    role: &str,
    password: &str,
) -> Checked<UpdateUserRequest> {
    username(username_value)?;
    email(email_value)?;
    let role = match Role::parse(role.trim()) {
        Some(role) => role,
        None => return fail("Please select a valid role"),
    };
    if !password.is_empty() {
        strong_password(password)?;
    }

    Ok(UpdateUserRequest {
        username: Some(username_value.trim().to_string()),
        email: Some(email_value.trim().to_string()),
        role: Some(role),
        password: (!password.is_empty()).then(|| password.to_string()),
    })
}

/// Check every field present in an update patch. Absent or empty fields
/// keep their stored value and are not checked.
pub fn user_patch(patch: &UpdateUserRequest) -> Checked<()> {
    let present = |field: &Option<String>| {
        field
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .map(str::to_string)
    };

    if let Some(value) = present(&patch.username) {
        username(&value)?;
    }
    if let Some(value) = present(&patch.email) {
        email(&value)?;
    }
    if let Some(value) = present(&patch.password) {
        strong_password(&value)?;
    }
    Ok(())
}

/// `None` means "list everything"; 1-2 characters are rejected.
pub fn search_query(query: &str) -> Checked<Option<String>> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(None);
    }
    if query.chars().count() < MIN_SEARCH_LEN {
        return fail("Search query must be at least 3 characters");
    }
    Ok(Some(query.to_string()))
}

/// Only JPEG, PNG and GIF data URIs
pub fn image_data_uri(data_uri: &str) -> Checked<()> {
    if data_uri.trim().is_empty() {
        return fail("Please select an image");
    }
    parse_data_uri(data_uri)
        .map(|_| ())
        .map_err(|e| ClientError::validation(e.to_string()))
}
