//! Credential Verifier
//! Mission: Check login attempts and create accounts with one-way hashed passwords

use crate::auth::{
    models::{Principal, Role, UserRecord},
    user_store::{StoreError, UserRepository},
};
use bcrypt::{hash, verify, BcryptError, DEFAULT_COST};
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CredentialError {
    /// Same shape whether the email is unknown or the password is wrong
    #[error("invalid credentials")]
    Rejected,
    #[error("user already exists")]
    AlreadyExists,
    #[error("password hashing failed: {0}")]
    Hash(#[from] BcryptError),
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for CredentialError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => CredentialError::AlreadyExists,
            other => CredentialError::Store(other),
        }
    }
}

/// How the configured admin password is checked
#[derive(Debug, Clone)]
pub enum AdminSecret {
    /// Compared against the configured plaintext
    Plain(String),
    /// Compared with bcrypt against a configured hash
    Bcrypt(String),
}

#[derive(Debug, Clone)]
pub struct AdminCredentials {
    pub email: String,
    pub secret: AdminSecret,
}

impl AdminCredentials {
    fn matches(&self, email: &str, password: &str) -> bool {
        if self.email.is_empty() || email != self.email {
            return false;
        }

        match &self.secret {
            AdminSecret::Plain(expected) => {
                !expected.is_empty()
                    && constant_time_eq(
                        &Sha256::digest(password.as_bytes()),
                        &Sha256::digest(expected.as_bytes()),
                    )
            }
            AdminSecret::Bcrypt(expected) => verify(password, expected).unwrap_or(false),
        }
    }
}

pub struct CredentialVerifier {
    store: Arc<dyn UserRepository>,
    admin: AdminCredentials,
    hash_cost: u32,
    // verified against when the email is unknown so both rejections cost the same
    decoy_hash: String,
}

impl CredentialVerifier {
    pub fn new(
        store: Arc<dyn UserRepository>,
        admin: AdminCredentials,
    ) -> Result<Self, CredentialError> {
        Self::with_hash_cost(store, admin, DEFAULT_COST)
    }

    pub fn with_hash_cost(
        store: Arc<dyn UserRepository>,
        admin: AdminCredentials,
        hash_cost: u32,
    ) -> Result<Self, CredentialError> {
        let decoy_hash = hash(Uuid::new_v4().to_string(), hash_cost)?;
        Ok(Self {
            store,
            admin,
            hash_cost,
            decoy_hash,
        })
    }

    pub fn admin_email(&self) -> &str {
        &self.admin.email
    }

    pub fn verify_login(&self, email: &str, password: &str) -> Result<Principal, CredentialError> {
        if self.admin.matches(email, password) {
            info!("Configured admin authenticated");
            return Ok(Principal::synthetic_admin(self.admin.email.clone()));
        }

        let Some(record) = self.store.find_by_email(email)? else {
            let _ = verify(password, &self.decoy_hash);
            warn!(email, "Login rejected");
            return Err(CredentialError::Rejected);
        };

        if !verify(password, &record.password_hash)? {
            warn!(email, "Login rejected");
            return Err(CredentialError::Rejected);
        }

        info!(user_id = %record.id, role = record.role.as_str(), "Login accepted");
        Ok(Principal::Stored(record.into()))
    }

    /// Self-service registration; role is always `user`
    pub fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Principal, CredentialError> {
        self.create_user(username, email, password, Role::User)
    }

    /// Create a stored account, rejecting any username OR email collision
    pub fn create_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<Principal, CredentialError> {
        if self.store.find_conflicting(username, email)?.is_some() {
            debug!(username, email, "Account collision");
            return Err(CredentialError::AlreadyExists);
        }

        let record = UserRecord {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: self.hash_password(password)?,
            role,
            profile_image: None,
            created_at: Utc::now().to_rfc3339(),
        };

        // the unique constraints still catch a racing insert
        self.store.insert(&record)?;

        Ok(Principal::Stored(record.into()))
    }

    pub fn hash_password(&self, password: &str) -> Result<String, CredentialError> {
        Ok(hash(password, self.hash_cost)?)
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
