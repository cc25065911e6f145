//! Client session store
//!
//! Holds the signed-in principal and its token, mirrors them into durable
//! storage and publishes every transition on a `watch` channel. All state
//! changes go through `send_modify`, so observers never see a torn update.
//!
//! Transitions per action:
//!
//! ```text
//! idle --action--> pending --success--> authenticated
//!                          --failure--> error
//! any  --logout--> idle (storage entry removed)
//! ```

use super::api::AuthApi;
use super::error::ClientError;
use super::storage::SessionStorage;
use super::validate;
use crate::auth::models::{AuthResponse, PrincipalProfile, Role};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

pub const PRIVILEGE_ERROR: &str = "You do not have admin privileges";

/// Which sign-in form the action came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginKind {
    User,
    Admin,
}

/// What gets persisted: every principal field plus the bearer token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionPrincipal {
    #[serde(flatten)]
    pub profile: PrincipalProfile,
    pub token: String,
}

impl SessionPrincipal {
    pub fn is_admin(&self) -> bool {
        self.profile.role == Role::Admin
    }
}

impl From<AuthResponse> for SessionPrincipal {
    fn from(response: AuthResponse) -> Self {
        Self {
            profile: response.profile,
            token: response.token,
        }
    }
}

/// User-facing confirmation for a successful action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    LoginSuccessful,
    AdminLoginSuccessful,
    RegistrationSuccessful,
    ImageUploaded,
}

impl Notice {
    pub fn message(&self) -> &'static str {
        match self {
            Notice::LoginSuccessful => "Login successful",
            Notice::AdminLoginSuccessful => "Admin login successful",
            Notice::RegistrationSuccessful => "Registration successful",
            Notice::ImageUploaded => "Profile image updated successfully",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub principal: Option<SessionPrincipal>,
    pub pending: bool,
    pub last_error: Option<String>,
    /// Set when an admin sign-in yields a non-admin principal. Kept apart
    /// from `last_error`.
    pub privilege_error: Option<String>,
    pub last_success: bool,
    pub notice: Option<Notice>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionFault {
    Failed(String),
    InsufficientPrivilege,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Pending,
    Authenticated,
    Error(SessionFault),
}

impl SessionState {
    pub fn phase(&self) -> SessionPhase {
        if self.pending {
            SessionPhase::Pending
        } else if self.privilege_error.is_some() {
            SessionPhase::Error(SessionFault::InsufficientPrivilege)
        } else if let Some(message) = &self.last_error {
            SessionPhase::Error(SessionFault::Failed(message.clone()))
        } else if self.principal.is_some() {
            SessionPhase::Authenticated
        } else {
            SessionPhase::Idle
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }
}

/// Result of a sign-in that reached the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    SignedIn(Notice),
    /// Credentials were valid but the principal is not an admin
    InsufficientPrivilege,
}

pub struct ClientSessionStore {
    api: Arc<dyn AuthApi>,
    storage: Arc<dyn SessionStorage>,
    state: watch::Sender<SessionState>,
}

impl ClientSessionStore {
    /// Restore any persisted session. Absent or corrupt entries start signed out.
    pub fn new(api: Arc<dyn AuthApi>, storage: Arc<dyn SessionStorage>) -> Self {
        let principal = storage.load().and_then(|raw| {
            serde_json::from_str::<SessionPrincipal>(&raw)
                .map_err(|e| warn!("Discarding unreadable stored session: {}", e))
                .ok()
        });

        if let Some(p) = &principal {
            debug!(user_id = %p.profile.id, "Restored session");
        }

        let (state, _) = watch::channel(SessionState {
            principal,
            ..SessionState::default()
        });

        Self {
            api,
            storage,
            state,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn principal(&self) -> Option<SessionPrincipal> {
        self.state.borrow().principal.clone()
    }

    pub fn token(&self) -> Option<String> {
        self.state.borrow().principal.as_ref().map(|p| p.token.clone())
    }

    pub async fn login(
        &self,
        kind: LoginKind,
        email: &str,
        password: &str,
    ) -> Result<LoginOutcome, ClientError> {
        validate::login_form(kind, email, password)?;

        self.begin();
        let principal: SessionPrincipal = match self.api.login(email.trim(), password).await {
            Ok(response) => response.into(),
            Err(err) => return Err(self.fail(err)),
        };

        let outcome = if kind == LoginKind::Admin && !principal.is_admin() {
            warn!(user_id = %principal.profile.id, "Admin sign-in by non-admin principal");
            LoginOutcome::InsufficientPrivilege
        } else {
            info!(user_id = %principal.profile.id, "Signed in");
            LoginOutcome::SignedIn(match kind {
                LoginKind::User => Notice::LoginSuccessful,
                LoginKind::Admin => Notice::AdminLoginSuccessful,
            })
        };

        self.persist(&principal);
        self.state.send_modify(|s| {
            s.principal = Some(principal);
            s.pending = false;
            s.last_success = true;
            match &outcome {
                LoginOutcome::SignedIn(notice) => s.notice = Some(*notice),
                LoginOutcome::InsufficientPrivilege => {
                    s.privilege_error = Some(PRIVILEGE_ERROR.to_string())
                }
            }
        });

        Ok(outcome)
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        confirm: &str,
    ) -> Result<Notice, ClientError> {
        validate::register_form(username, email, password, confirm)?;

        self.begin();
        let principal: SessionPrincipal = match self
            .api
            .register(username.trim(), email.trim(), password)
            .await
        {
            Ok(response) => response.into(),
            Err(err) => return Err(self.fail(err)),
        };

        info!(user_id = %principal.profile.id, "Registered");
        self.persist(&principal);
        self.state.send_modify(|s| {
            s.principal = Some(principal);
            s.pending = false;
            s.last_success = true;
            s.notice = Some(Notice::RegistrationSuccessful);
        });

        Ok(Notice::RegistrationSuccessful)
    }

    pub fn logout(&self) {
        if let Err(e) = self.storage.remove() {
            warn!("Failed to clear stored session: {}", e);
        }
        self.state.send_modify(|s| *s = SessionState::default());
        info!("Signed out");
    }

    /// Re-fetch the principal's fields, keeping the current token
    pub async fn refresh_profile(&self) -> Result<PrincipalProfile, ClientError> {
        let token = self.token().ok_or(ClientError::NotSignedIn)?;

        self.begin();
        let profile = match self.api.profile(&token).await {
            Ok(profile) => profile,
            Err(err) => return Err(self.fail(err)),
        };

        let merged = profile.clone();
        self.update_principal(&token, move |p| p.profile = merged);
        Ok(profile)
    }

    /// Upload a data-URI image and record the returned reference
    pub async fn upload_image(&self, data_uri: &str) -> Result<String, ClientError> {
        validate::image_data_uri(data_uri)?;
        let token = self.token().ok_or(ClientError::NotSignedIn)?;

        self.begin();
        let reference = match self.api.upload_image(&token, data_uri).await {
            Ok(reference) => reference,
            Err(err) => return Err(self.fail(err)),
        };

        let image = reference.clone();
        self.update_principal(&token, move |p| p.profile.profile_image = Some(image));
        self.state.send_modify(|s| s.notice = Some(Notice::ImageUploaded));
        Ok(reference)
    }

    pub fn clear_error(&self) {
        self.state.send_modify(|s| {
            s.last_error = None;
            s.privilege_error = None;
        });
    }

    pub fn reset_success(&self) {
        self.state.send_modify(|s| {
            s.last_success = false;
            s.notice = None;
        });
    }

    /// Every new attempt clears the previous error
    fn begin(&self) {
        self.state.send_modify(|s| {
            s.pending = true;
            s.last_error = None;
            s.privilege_error = None;
            s.last_success = false;
            s.notice = None;
        });
    }

    fn fail(&self, err: ClientError) -> ClientError {
        warn!("Session action failed: {}", err);
        let message = err.to_string();
        self.state.send_modify(|s| {
            s.pending = false;
            s.last_error = Some(message);
        });
        err
    }

    /// Apply `f` to the principal if it still carries `token`, then persist.
    /// A sign-out or re-login while the request was in flight wins.
    fn update_principal(&self, token: &str, f: impl FnOnce(&mut SessionPrincipal)) {
        let mut persisted = None;
        self.state.send_modify(|s| {
            s.pending = false;
            s.last_success = true;
            if let Some(p) = s.principal.as_mut().filter(|p| p.token == token) {
                f(p);
                persisted = Some(p.clone());
            }
        });

        match persisted {
            Some(p) => self.persist(&p),
            None => debug!("Session changed while request was in flight; result dropped"),
        }
    }

    fn persist(&self, principal: &SessionPrincipal) {
        let result = serde_json::to_string(principal)
            .map_err(std::io::Error::from)
            .and_then(|raw| self.storage.save(&raw));
        if let Err(e) = result {
            warn!("Failed to persist session: {}", e);
        }
    }
}
