//! Authentication Models
//! Mission: Define principals, credential records and wire payloads

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Token subject used for the configuration-backed admin. Never a store key.
pub const ADMIN_SENTINEL: &str = "admin-id";

/// Display name of the configuration-backed admin.
pub const ADMIN_USERNAME: &str = "Admin";

/// User roles for RBAC
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Role {
    #[serde(rename = "user")]
    #[default]
    User,
    #[serde(rename = "admin")]
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// Credential record as held by the user store
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String, // bcrypt hash - never serialized
    pub role: Role,
    pub profile_image: Option<String>,
    pub created_at: String,
}

/// Principal backed by a persistent record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPrincipal {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub profile_image: Option<String>,
}

impl From<&UserRecord> for StoredPrincipal {
    fn from(record: &UserRecord) -> Self {
        Self {
            id: record.id,
            username: record.username.clone(),
            email: record.email.clone(),
            role: record.role,
            profile_image: record.profile_image.clone(),
        }
    }
}

impl From<UserRecord> for StoredPrincipal {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            username: record.username,
            email: record.email,
            role: record.role,
            profile_image: record.profile_image,
        }
    }
}

/// An authenticated identity.
///
/// `SyntheticAdmin` is materialized from configuration on every request and
/// has no row in the user store: it cannot be listed, edited or deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    Stored(StoredPrincipal),
    SyntheticAdmin { email: String },
}

impl Principal {
    pub fn synthetic_admin(email: impl Into<String>) -> Self {
        Principal::SyntheticAdmin {
            email: email.into(),
        }
    }

    /// Token subject for this principal
    pub fn subject(&self) -> String {
        match self {
            Principal::Stored(p) => p.id.to_string(),
            Principal::SyntheticAdmin { .. } => ADMIN_SENTINEL.to_string(),
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Principal::Stored(p) => p.role,
            Principal::SyntheticAdmin { .. } => Role::Admin,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Role::Admin
    }

    /// Sanitized projection sent to clients
    pub fn profile(&self) -> PrincipalProfile {
        match self {
            Principal::Stored(p) => PrincipalProfile {
                id: p.id.to_string(),
                username: p.username.clone(),
                email: p.email.clone(),
                role: p.role,
                profile_image: p.profile_image.clone(),
            },
            Principal::SyntheticAdmin { email } => PrincipalProfile {
                id: ADMIN_SENTINEL.to_string(),
                username: ADMIN_USERNAME.to_string(),
                email: email.clone(),
                role: Role::Admin,
                profile_image: None,
            },
        }
    }
}

/// Principal fields as they appear on the wire (never carries a password)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PrincipalProfile {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub profile_image: Option<String>,
}

impl From<&UserRecord> for PrincipalProfile {
    fn from(record: &UserRecord) -> Self {
        Principal::Stored(record.into()).profile()
    }
}

/// JWT Claims payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // subject (record id or ADMIN_SENTINEL)
    pub iat: i64,
    pub exp: i64,
}

/// Register request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Login request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login / register response: principal fields plus a bearer token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthResponse {
    #[serde(flatten)]
    pub profile: PrincipalProfile,
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored() -> StoredPrincipal {
        StoredPrincipal {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "a@x.com".to_string(),
            role: Role::User,
            profile_image: None,
        }
    }

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&Role::Admin).unwrap();
        assert_eq!(json, r#""admin""#);

        let user: Role = serde_json::from_str(r#""user""#).unwrap();
        assert_eq!(user, Role::User);

        assert_eq!(Role::parse("ADMIN"), Some(Role::Admin));
        assert_eq!(Role::parse("root"), None);
    }

    #[test]
    fn test_synthetic_admin_projection() {
        let admin = Principal::synthetic_admin("root@example.com");
        assert_eq!(admin.subject(), ADMIN_SENTINEL);
        assert!(admin.is_admin());

        let profile = admin.profile();
        assert_eq!(profile.id, "admin-id");
        assert_eq!(profile.username, "Admin");
        assert_eq!(profile.email, "root@example.com");
        assert!(profile.profile_image.is_none());
    }

    #[test]
    fn test_auth_response_flattens_profile() {
        let principal = Principal::Stored(stored());
        let response = AuthResponse {
            profile: principal.profile(),
            token: "tok".to_string(),
        };

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["username"], "alice");
        assert_eq!(value["role"], "user");
        assert_eq!(value["token"], "tok");
        assert!(value.get("profileImage").is_some());
        assert!(value.get("password").is_none());
        assert!(value.get("passwordHash").is_none());
    }
}
