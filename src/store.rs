use axum::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;

/// User record held by the credential store.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
}

/// Fields for a record about to be inserted; the id is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("email or phone already registered")]
    Duplicate,
}

/// Storage capability for user records. Injected so a real database can be
/// substituted without touching the handlers.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email_or_phone(&self, email: &str, phone: &str) -> Option<User>;
    async fn find_by_email(&self, email: &str) -> Option<User>;
    async fn find_by_phone(&self, phone: &str) -> Option<User>;

    /// Assigns the next id and inserts the record, enforcing email/phone
    /// uniqueness atomically. Callers may pre-check for a friendlier error,
    /// but correctness does not depend on it.
    async fn insert(&self, new: NewUser) -> Result<User, StoreError>;
}

/// In-memory store; stands in for a database and is not durable across
/// restarts.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<Vec<User>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Phone-provisioned records have an empty email, so email uniqueness only
/// applies to non-empty values; phone uniqueness always applies.
fn clashes(existing: &User, email: &str, phone: &str) -> bool {
    (!email.is_empty() && existing.email == email) || existing.phone == phone
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email_or_phone(&self, email: &str, phone: &str) -> Option<User> {
        let users = self.users.read().await;
        users.iter().find(|u| clashes(u, email, phone)).cloned()
    }

    async fn find_by_email(&self, email: &str) -> Option<User> {
        let users = self.users.read().await;
        users.iter().find(|u| u.email == email).cloned()
    }

    async fn find_by_phone(&self, phone: &str) -> Option<User> {
        let users = self.users.read().await;
        users.iter().find(|u| u.phone == phone).cloned()
    }

    async fn insert(&self, new: NewUser) -> Result<User, StoreError> {
        // Check and append under one write lock so two racing signups cannot
        // both pass the uniqueness check.
        let mut users = self.users.write().await;
        if users.iter().any(|u| clashes(u, &new.email, &new.phone)) {
            return Err(StoreError::Duplicate);
        }
        let user = User {
            id: users.len() as u64 + 1,
            name: new.name,
            email: new.email,
            phone: new.phone,
            password_hash: new.password_hash,
        };
        users.push(user.clone());
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str, phone: &str) -> NewUser {
        NewUser {
            name: "A".into(),
            email: email.into(),
            phone: phone.into(),
            password_hash: "hash".into(),
        }
    }

    #[tokio::test]
    async fn insert_assigns_incrementing_ids() {
        let store = MemoryStore::new();
        let first = store.insert(new_user("a@x.com", "+1555")).await.unwrap();
        let second = store.insert(new_user("b@x.com", "+1556")).await.unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_email() {
        let store = MemoryStore::new();
        store.insert(new_user("a@x.com", "+1555")).await.unwrap();
        let err = store.insert(new_user("a@x.com", "+1999")).await.unwrap_err();
        assert_eq!(err, StoreError::Duplicate);
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_phone() {
        let store = MemoryStore::new();
        store.insert(new_user("a@x.com", "+1555")).await.unwrap();
        let err = store.insert(new_user("b@x.com", "+1555")).await.unwrap_err();
        assert_eq!(err, StoreError::Duplicate);
    }

    #[tokio::test]
    async fn empty_emails_do_not_clash() {
        let store = MemoryStore::new();
        store.insert(new_user("", "+1555")).await.unwrap();
        let second = store.insert(new_user("", "+1556")).await.unwrap();
        assert_eq!(second.id, 2);
    }

    #[tokio::test]
    async fn find_by_phone_returns_record() {
        let store = MemoryStore::new();
        store.insert(new_user("a@x.com", "+1555")).await.unwrap();
        let found = store.find_by_phone("+1555").await.expect("record present");
        assert_eq!(found.email, "a@x.com");
        assert!(store.find_by_phone("+1999").await.is_none());
    }

    #[tokio::test]
    async fn failed_insert_does_not_mutate_store() {
        let store = MemoryStore::new();
        store.insert(new_user("a@x.com", "+1555")).await.unwrap();
        let _ = store.insert(new_user("a@x.com", "+1556")).await;
        let next = store.insert(new_user("b@x.com", "+1557")).await.unwrap();
        assert_eq!(next.id, 2);
    }
}
