//! In-process store used by tests and dry runs.

use super::{CredentialStore, REQUIRED_INDEXES, USERS};
use crate::credentials::{normalize_email, CredentialError, UserCredential};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct State {
    schema_ready: bool,
    // keyed by normalized email, which doubles as the unique index
    users: HashMap<String, UserCredential>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.users.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn ensure_schema(&self) -> Result<(), CredentialError> {
        self.state.lock().await.schema_ready = true;
        Ok(())
    }

    async fn indexes(&self) -> Result<Vec<String>, CredentialError> {
        let state = self.state.lock().await;
        if !state.schema_ready {
            return Ok(Vec::new());
        }

        // ensure_schema builds every collection and index in one step
        Ok(REQUIRED_INDEXES
            .iter()
            .map(|index| index.name.to_string())
            .collect())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserCredential>, CredentialError> {
        let state = self.state.lock().await;
        if !state.schema_ready {
            return Err(CredentialError::SchemaMissing(USERS.to_string()));
        }

        Ok(state.users.get(&normalize_email(email)).cloned())
    }

    async fn create(&self, user: &UserCredential) -> Result<(), CredentialError> {
        let mut state = self.state.lock().await;
        if !state.schema_ready {
            return Err(CredentialError::SchemaMissing(USERS.to_string()));
        }

        let key = normalize_email(&user.email);
        if state.users.contains_key(&key) {
            return Err(CredentialError::DuplicateKey(key));
        }

        let mut stored = user.clone();
        stored.email.clone_from(&key);
        state.users.insert(key, stored);

        Ok(())
    }

    async fn save(&self, user: &mut UserCredential) -> Result<(), CredentialError> {
        let mut state = self.state.lock().await;
        if !state.schema_ready {
            return Err(CredentialError::SchemaMissing(USERS.to_string()));
        }

        let Some(old_key) = state
            .users
            .iter()
            .find(|(_, stored)| stored.id == user.id)
            .map(|(key, _)| key.clone())
        else {
            return Err(CredentialError::NotFound(user.email.clone()));
        };

        let new_key = normalize_email(&user.email);
        if new_key != old_key && state.users.contains_key(&new_key) {
            return Err(CredentialError::DuplicateKey(new_key));
        }

        let Some(mut stored) = state.users.remove(&old_key) else {
            return Err(CredentialError::NotFound(user.email.clone()));
        };

        stored.name.clone_from(&user.name);
        stored.email.clone_from(&new_key);
        stored.phone.clone_from(&user.phone);
        stored.password_hash.clone_from(&user.password_hash);
        stored.role = user.role;
        stored.updated_at = Utc::now();

        user.email.clone_from(&stored.email);
        user.created_at = stored.created_at;
        user.updated_at = stored.updated_at;

        state.users.insert(new_key, stored);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::Role;

    fn user(email: &str) -> UserCredential {
        UserCredential::new("Test User", email, "+91 00000 00000", "$2b$04$hash", Role::Standard)
    }

    async fn ready_store() -> MemoryStore {
        let store = MemoryStore::new();
        store.ensure_schema().await.unwrap();
        store
    }

    #[tokio::test]
    async fn operations_fail_before_schema_exists() {
        let store = MemoryStore::new();
        assert!(store.indexes().await.unwrap().is_empty());
        assert!(matches!(
            store.find_by_email("a@example.com").await,
            Err(CredentialError::SchemaMissing(_))
        ));
        assert!(matches!(
            store.create(&user("a@example.com")).await,
            Err(CredentialError::SchemaMissing(_))
        ));
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = ready_store().await;
        store.create(&user("a@example.com")).await.unwrap();

        let result = store.create(&user("A@Example.com ")).await;
        assert!(matches!(result, Err(CredentialError::DuplicateKey(e)) if e == "a@example.com"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn create_stores_normalized_email() {
        let store = ready_store().await;
        let mut raw = user("a@example.com");
        raw.email = " A@Example.com".to_string();
        store.create(&raw).await.unwrap();

        let stored = store.find_by_email("a@example.com").await.unwrap().unwrap();
        assert_eq!(stored.email, "a@example.com");
    }

    #[tokio::test]
    async fn concurrent_creates_have_one_winner() {
        let store = std::sync::Arc::new(ready_store().await);
        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.create(&user("race@example.com")).await
            }));
        }

        let mut ok = 0;
        let mut dup = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => ok += 1,
                Err(CredentialError::DuplicateKey(_)) => dup += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!((ok, dup), (1, 7));
    }

    #[tokio::test]
    async fn save_refreshes_updated_at_and_keeps_created_at() {
        let store = ready_store().await;
        let original = user("a@example.com");
        store.create(&original).await.unwrap();

        let mut found = store.find_by_email("a@example.com").await.unwrap().unwrap();
        found.password_hash = "$2b$04$other".to_string();
        found.created_at = Utc::now() + chrono::Duration::days(1);
        store.save(&mut found).await.unwrap();

        let stored = store.find_by_email("a@example.com").await.unwrap().unwrap();
        assert_eq!(stored.password_hash, "$2b$04$other");
        assert_eq!(stored.created_at, original.created_at);
        assert_eq!(found.created_at, original.created_at);
        assert!(stored.updated_at >= original.updated_at);
        assert_eq!(found.updated_at, stored.updated_at);
    }

    #[tokio::test]
    async fn save_unknown_record_is_not_found() {
        let store = ready_store().await;
        let mut ghost = user("ghost@example.com");
        assert!(matches!(
            store.save(&mut ghost).await,
            Err(CredentialError::NotFound(_))
        ));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn save_cannot_steal_another_email() {
        let store = ready_store().await;
        store.create(&user("a@example.com")).await.unwrap();
        store.create(&user("b@example.com")).await.unwrap();

        let mut b = store.find_by_email("b@example.com").await.unwrap().unwrap();
        b.email = "a@example.com".to_string();
        assert!(matches!(
            store.save(&mut b).await,
            Err(CredentialError::DuplicateKey(_))
        ));
        assert!(store.find_by_email("b@example.com").await.unwrap().is_some());
    }
}
