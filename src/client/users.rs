//! Admin-side user management state
//!
//! Mirrors the server's user list for the admin views. Same transition
//! shape as the session store: pending while a request is in flight, then
//! success or a single error message.

use super::api::UserAdminApi;
use super::error::ClientError;
use super::session::ClientSessionStore;
use super::validate;
use crate::auth::models::PrincipalProfile;
use crate::users::api::{CreateUserRequest, UpdateUserRequest};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserAdminState {
    pub users: Vec<PrincipalProfile>,
    pub selected: Option<PrincipalProfile>,
    pub pending: bool,
    pub last_error: Option<String>,
    pub last_success: bool,
}

pub struct UserAdminStore {
    api: Arc<dyn UserAdminApi>,
    session: Arc<ClientSessionStore>,
    state: watch::Sender<UserAdminState>,
}

impl UserAdminStore {
    pub fn new(api: Arc<dyn UserAdminApi>, session: Arc<ClientSessionStore>) -> Self {
        let (state, _) = watch::channel(UserAdminState::default());
        Self {
            api,
            session,
            state,
        }
    }

    pub fn state(&self) -> UserAdminState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<UserAdminState> {
        self.state.subscribe()
    }

    pub async fn list_users(&self) -> Result<Vec<PrincipalProfile>, ClientError> {
        let token = self.token()?;
        let users = self.run(self.api.list_users(&token)).await?;
        self.finish(|s| s.users = users.clone());
        Ok(users)
    }

    /// An empty query lists everyone; 1-2 characters never reach the server
    pub async fn search_users(&self, query: &str) -> Result<Vec<PrincipalProfile>, ClientError> {
        let query = match validate::search_query(query)? {
            Some(query) => query,
            None => return self.list_users().await,
        };
        let token = self.token()?;
        let users = self.run(self.api.search_users(&token, &query)).await?;
        self.finish(|s| s.users = users.clone());
        Ok(users)
    }

    pub async fn get_user(&self, id: &str) -> Result<PrincipalProfile, ClientError> {
        let token = self.token()?;
        let user = self.run(self.api.get_user(&token, id)).await?;
        self.finish(|s| s.selected = Some(user.clone()));
        Ok(user)
    }

    pub async fn create_user(
        &self,
        request: &CreateUserRequest,
    ) -> Result<PrincipalProfile, ClientError> {
        validate::new_user_form(request)?;
        let token = self.token()?;
        let user = self.run(self.api.create_user(&token, request)).await?;
        info!(user_id = %user.id, "User created");
        self.finish(|s| s.users.push(user.clone()));
        Ok(user)
    }

    /// Replaces the matching entry in `users` and the selection
    pub async fn update_user(
        &self,
        id: &str,
        patch: &UpdateUserRequest,
    ) -> Result<PrincipalProfile, ClientError> {
        validate::user_patch(patch)?;
        let token = self.token()?;
        let user = self.run(self.api.update_user(&token, id, patch)).await?;
        self.finish(|s| {
            if let Some(entry) = s.users.iter_mut().find(|u| u.id == user.id) {
                *entry = user.clone();
            }
            s.selected = Some(user.clone());
        });
        Ok(user)
    }

    pub async fn delete_user(&self, id: &str) -> Result<(), ClientError> {
        let me = self.session.principal().ok_or(ClientError::NotSignedIn)?;
        if me.profile.id == id {
            return Err(ClientError::validation("You cannot delete your own account"));
        }

        self.run(self.api.delete_user(&me.token, id)).await?;
        info!(user_id = %id, "User deleted");
        self.finish(|s| {
            s.users.retain(|u| u.id != id);
            if s.selected.as_ref().is_some_and(|u| u.id == id) {
                s.selected = None;
            }
        });
        Ok(())
    }

    pub fn reset_selected(&self) {
        self.state.send_modify(|s| s.selected = None);
    }

    pub fn clear_error(&self) {
        self.state.send_modify(|s| s.last_error = None);
    }

    pub fn reset_success(&self) {
        self.state.send_modify(|s| s.last_success = false);
    }

    fn token(&self) -> Result<String, ClientError> {
        self.session.token().ok_or(ClientError::NotSignedIn)
    }

    async fn run<T>(
        &self,
        request: impl Future<Output = Result<T, ClientError>>,
    ) -> Result<T, ClientError> {
        self.state.send_modify(|s| {
            s.pending = true;
            s.last_error = None;
            s.last_success = false;
        });

        request.await.map_err(|err| {
            warn!("User admin action failed: {}", err);
            let message = err.to_string();
            self.state.send_modify(|s| {
                s.pending = false;
                s.last_error = Some(message);
            });
            err
        })
    }

    fn finish(&self, f: impl FnOnce(&mut UserAdminState)) {
        self.state.send_modify(|s| {
            f(s);
            s.pending = false;
            s.last_success = true;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::{AuthResponse, Role};
    use crate::client::session::tests::{profile, FakeAuthApi};
    use crate::client::session::LoginKind;
    use crate::client::storage::MemorySessionStorage;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory directory standing in for the admin endpoints
    #[derive(Default)]
    struct FakeDirectory {
        users: Mutex<Vec<PrincipalProfile>>,
        calls: AtomicUsize,
    }

    impl FakeDirectory {
        fn hit(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }

        fn not_found() -> ClientError {
            ClientError::Api {
                status: 404,
                message: "User not found".to_string(),
            }
        }
    }

    #[async_trait]
    impl UserAdminApi for FakeDirectory {
        async fn list_users(&self, _: &str) -> Result<Vec<PrincipalProfile>, ClientError> {
            self.hit();
            Ok(self.users.lock().clone())
        }

        async fn search_users(
            &self,
            _: &str,
            query: &str,
        ) -> Result<Vec<PrincipalProfile>, ClientError> {
            self.hit();
            let query = query.to_lowercase();
            Ok(self
                .users
                .lock()
                .iter()
                .filter(|u| {
                    u.username.to_lowercase().contains(&query)
                        || u.email.to_lowercase().contains(&query)
                })
                .cloned()
                .collect())
        }

        async fn get_user(&self, _: &str, id: &str) -> Result<PrincipalProfile, ClientError> {
            self.hit();
            self.users
                .lock()
                .iter()
                .find(|u| u.id == id)
                .cloned()
                .ok_or_else(Self::not_found)
        }

        async fn create_user(
            &self,
            _: &str,
            request: &CreateUserRequest,
        ) -> Result<PrincipalProfile, ClientError> {
            self.hit();
            let user = PrincipalProfile {
                id: format!("id-{}", request.username),
                username: request.username.clone(),
                email: request.email.clone(),
                role: request.role.unwrap_or_default(),
                profile_image: None,
            };
            self.users.lock().push(user.clone());
            Ok(user)
        }

        async fn update_user(
            &self,
            _: &str,
            id: &str,
            patch: &UpdateUserRequest,
        ) -> Result<PrincipalProfile, ClientError> {
            self.hit();
            let mut users = self.users.lock();
            let user = users
                .iter_mut()
                .find(|u| u.id == id)
                .ok_or_else(Self::not_found)?;
            if let Some(username) = &patch.username {
                user.username = username.clone();
            }
            if let Some(role) = patch.role {
                user.role = role;
            }
            Ok(user.clone())
        }

        async fn delete_user(&self, _: &str, id: &str) -> Result<(), ClientError> {
            self.hit();
            let mut users = self.users.lock();
            let before = users.len();
            users.retain(|u| u.id != id);
            if users.len() == before {
                return Err(Self::not_found());
            }
            Ok(())
        }
    }

    async fn admin_store() -> (UserAdminStore, Arc<FakeDirectory>) {
        let auth = FakeAuthApi::answering(Ok(AuthResponse {
            profile: profile("boss", Role::Admin),
            token: "admin-token".to_string(),
        }));
        let session = Arc::new(ClientSessionStore::new(
            auth,
            Arc::new(MemorySessionStorage::new()),
        ));
        session
            .login(LoginKind::Admin, "boss@x.com", "secret")
            .await
            .unwrap();

        let directory = Arc::new(FakeDirectory::default());
        (UserAdminStore::new(directory.clone(), session), directory)
    }

    fn new_user(username: &str) -> CreateUserRequest {
        CreateUserRequest {
            username: username.to_string(),
            email: format!("{username}@x.com"),
            password: "secret1".to_string(),
            role: None,
        }
    }

    #[tokio::test]
    async fn test_create_update_delete_keep_list_in_sync() {
        let (store, _) = admin_store().await;

        let bob = store.create_user(&new_user("bob")).await.unwrap();
        store.create_user(&new_user("carol")).await.unwrap();
        assert_eq!(store.state().users.len(), 2);

        let patch = UpdateUserRequest {
            role: Some(Role::Admin),
            ..UpdateUserRequest::default()
        };
        store.update_user(&bob.id, &patch).await.unwrap();
        let state = store.state();
        assert_eq!(state.users[0].role, Role::Admin);
        assert_eq!(state.selected.as_ref().map(|u| u.id.as_str()), Some(bob.id.as_str()));
        assert!(state.last_success);

        store.delete_user(&bob.id).await.unwrap();
        let state = store.state();
        assert_eq!(state.users.len(), 1);
        assert!(state.selected.is_none());
    }

    #[tokio::test]
    async fn test_short_search_never_reaches_server() {
        let (store, directory) = admin_store().await;
        store.create_user(&new_user("alice")).await.unwrap();
        let before = directory.calls.load(Ordering::SeqCst);

        let err = store.search_users("al").await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(directory.calls.load(Ordering::SeqCst), before);

        let all = store.search_users("  ").await.unwrap();
        assert_eq!(all.len(), 1);

        let hits = store.search_users("ALI").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert!(store.search_users("zzz").await.unwrap().is_empty());
        assert!(store.state().users.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_patch_never_reaches_server() {
        let (store, directory) = admin_store().await;
        let bob = store.create_user(&new_user("bob")).await.unwrap();
        let before = directory.calls.load(Ordering::SeqCst);

        let patch = UpdateUserRequest {
            username: Some("x".to_string()),
            email: Some("not-an-email".to_string()),
            ..UpdateUserRequest::default()
        };
        let err = store.update_user(&bob.id, &patch).await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(directory.calls.load(Ordering::SeqCst), before);
        assert!(!store.state().pending);
    }

    #[tokio::test]
    async fn test_refuses_to_delete_self() {
        let (store, directory) = admin_store().await;
        let err = store.delete_user("boss").await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(directory.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_server_error_surfaces_once() {
        let (store, _) = admin_store().await;
        let err = store.get_user("missing").await.unwrap_err();
        assert_eq!(err.to_string(), "User not found");

        let state = store.state();
        assert!(!state.pending);
        assert_eq!(state.last_error.as_deref(), Some("User not found"));

        store.clear_error();
        assert!(store.state().last_error.is_none());
    }

    #[tokio::test]
    async fn test_requires_session() {
        let session = Arc::new(ClientSessionStore::new(
            FakeAuthApi::answering(Err(ClientError::NotSignedIn)),
            Arc::new(MemorySessionStorage::new()),
        ));
        let store = UserAdminStore::new(Arc::new(FakeDirectory::default()), session);
        assert_eq!(store.list_users().await.unwrap_err(), ClientError::NotSignedIn);
    }
}
