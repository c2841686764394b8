use crate::models::{User, UserField, UserPatch};
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("User not found: {0}")]
    NotFound(String),
}

/// Field-keyed persistence of user records, primary key = email
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts or replaces the record stored under `user.email`
    async fn put(&self, user: &User) -> Result<(), StoreError>;

    async fn get(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_field(&self, field: UserField, value: &str) -> Result<Option<User>, StoreError>;

    async fn update(&self, email: &str, patch: UserPatch) -> Result<(), StoreError>;

    async fn delete(&self, email: &str) -> Result<(), StoreError>;

    async fn list(&self) -> Result<Vec<User>, StoreError>;
}

/// Read side swallows store failures: they are logged and reported as absence
#[derive(Clone)]
pub struct UserRepository {
    store: Arc<dyn UserStore>,
}

impl UserRepository {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    pub async fn save_user(&self, user: &User) -> Result<(), StoreError> {
        self.store.put(user).await?;
        log::info!("💾 User saved: {} ({})", user.email, user.student_id);
        Ok(())
    }

    pub async fn get_user_by_email(&self, email: &str) -> Option<User> {
        match self.store.get(email).await {
            Ok(user) => user,
            Err(e) => {
                log::error!("❌ Failed to load user {}: {}", email, e);
                None
            }
        }
    }

    /// Looks the identifier up as a student ID first, then as an email
    pub async fn get_user_by_identifier(&self, identifier: &str) -> Option<User> {
        for field in [UserField::StudentId, UserField::Email] {
            match self.store.find_by_field(field, identifier).await {
                Ok(Some(user)) => return Some(user),
                Ok(None) => continue,
                Err(e) => {
                    log::error!("❌ Lookup by {} failed for {}: {}", field.key(), identifier, e);
                    return None;
                }
            }
        }
        None
    }

    pub async fn get_all_users(&self) -> Vec<User> {
        self.store.list().await.unwrap_or_else(|e| {
            log::error!("❌ Failed to list users: {}", e);
            Vec::new()
        })
    }

    pub async fn update_user_nfc_uid(&self, email: &str, nfc_uid: &str) -> Result<(), StoreError> {
        self.store
            .update(
                email,
                UserPatch {
                    nfc_uid: Some(nfc_uid.to_string()),
                },
            )
            .await?;
        log::info!("🏷️  NFC tag {} linked to {}", nfc_uid, email);
        Ok(())
    }

    pub async fn delete_user(&self, email: &str) -> Result<(), StoreError> {
        self.store.delete(email).await?;
        log::info!("🗑️  User deleted: {}", email);
        Ok(())
    }
}
