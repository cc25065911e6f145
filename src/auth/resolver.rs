//! Principal Resolver
//! Mission: Map a verified token subject to a principal

use crate::auth::{
    models::{Principal, ADMIN_SENTINEL},
    user_store::{StoreError, UserRepository},
};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("user not found")]
    NotFound,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Resolves token subjects. The admin sentinel is answered from
/// configuration before any store access.
pub struct PrincipalResolver {
    store: Arc<dyn UserRepository>,
    admin_email: String,
}

impl PrincipalResolver {
    pub fn new(store: Arc<dyn UserRepository>, admin_email: String) -> Self {
        Self { store, admin_email }
    }

    pub fn resolve(&self, subject: &str) -> Result<Principal, ResolveError> {
        if subject == ADMIN_SENTINEL {
            return Ok(Principal::synthetic_admin(self.admin_email.clone()));
        }

        // Subjects that are not record ids cannot name a stored user
        let id = Uuid::parse_str(subject).map_err(|_| ResolveError::NotFound)?;

        self.store
            .find_by_id(&id)?
            .map(|record| Principal::Stored(record.into()))
            .ok_or(ResolveError::NotFound)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::auth::{
        models::{Role, UserRecord},
        user_store::UserStore,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Wraps a store and counts every call that reaches it
    pub(crate) struct CountingStore {
        pub inner: UserStore,
        pub calls: AtomicUsize,
    }

    impl CountingStore {
        pub fn new() -> Self {
            Self {
                inner: UserStore::in_memory().unwrap(),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn tick(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl UserRepository for CountingStore {
        fn find_by_id(&self, id: &Uuid) -> Result<Option<UserRecord>, StoreError> {
            self.tick();
            self.inner.find_by_id(id)
        }
        fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
            self.tick();
            self.inner.find_by_email(email)
        }
        fn find_conflicting(
            &self,
            username: &str,
            email: &str,
        ) -> Result<Option<UserRecord>, StoreError> {
            self.tick();
            self.inner.find_conflicting(username, email)
        }
        fn insert(&self, record: &UserRecord) -> Result<(), StoreError> {
            self.tick();
            self.inner.insert(record)
        }
        fn save(&self, record: &UserRecord) -> Result<(), StoreError> {
            self.tick();
            self.inner.save(record)
        }
        fn delete(&self, id: &Uuid) -> Result<(), StoreError> {
            self.tick();
            self.inner.delete(id)
        }
        fn list(&self) -> Result<Vec<UserRecord>, StoreError> {
            self.tick();
            self.inner.list()
        }
        fn search(&self, query: &str) -> Result<Vec<UserRecord>, StoreError> {
            self.tick();
            self.inner.search(query)
        }
    }

    #[test]
    fn test_admin_sentinel_never_touches_store() {
        let store = Arc::new(CountingStore::new());
        let resolver = PrincipalResolver::new(store.clone(), "root@example.com".to_string());

        for _ in 0..3 {
            let principal = resolver.resolve(ADMIN_SENTINEL).unwrap();
            assert_eq!(principal.role(), Role::Admin);
            assert!(matches!(principal, Principal::SyntheticAdmin { .. }));
        }
        assert_eq!(store.calls(), 0);
    }

    #[test]
    fn test_resolves_stored_user() {
        let store = Arc::new(CountingStore::new());
        let record = UserRecord {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "a@x.com".to_string(),
            password_hash: "hash".to_string(),
            role: Role::User,
            profile_image: None,
            created_at: "2025-01-01T00:00:00Z".to_string(),
        };
        store.inner.insert(&record).unwrap();

        let resolver = PrincipalResolver::new(store.clone(), "root@example.com".to_string());
        let principal = resolver.resolve(&record.id.to_string()).unwrap();
        assert_eq!(principal.subject(), record.id.to_string());
        assert_eq!(principal.role(), Role::User);
        assert_eq!(store.calls(), 1);
    }

    #[test]
    fn test_unknown_subject_not_found() {
        let store = Arc::new(CountingStore::new());
        let resolver = PrincipalResolver::new(store.clone(), "root@example.com".to_string());

        assert!(matches!(
            resolver.resolve(&Uuid::new_v4().to_string()),
            Err(ResolveError::NotFound)
        ));
        // not a record id: rejected without a lookup
        assert!(matches!(
            resolver.resolve("not-a-uuid"),
            Err(ResolveError::NotFound)
        ));
        assert_eq!(store.calls(), 1);
    }
}
