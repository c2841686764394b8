use crate::models::{User, UserField, UserPatch};
use crate::services::user_service::{StoreError, UserStore};
use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, DateTime as BsonDateTime, Document};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, Database, IndexModel};
use std::error::Error;

pub const USERS_COLLECTION: &str = "users";

#[derive(Clone)]
pub struct MongoDB {
    db: Database,
}

impl MongoDB {
    pub async fn new(uri: &str) -> Result<Self, Box<dyn Error>> {
        let mut client_options = mongodb::options::ClientOptions::parse(uri).await?;

        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(2);
        client_options.max_idle_time = Some(std::time::Duration::from_secs(300));
        client_options.connect_timeout = Some(std::time::Duration::from_secs(5));
        client_options.server_selection_timeout = Some(std::time::Duration::from_secs(5));

        let client = Client::with_options(client_options)?;

        // Extract database name from URI or use default
        let db_name = uri
            .split('/')
            .last()
            .and_then(|s| s.split('?').next())
            .filter(|s| !s.is_empty() && !s.contains(':'))
            .unwrap_or("nfcampus");

        let db = client.database(db_name);

        // Test connection
        db.list_collection_names().await?;

        let mongodb = Self { db };
        mongodb.ensure_indexes().await?;

        Ok(mongodb)
    }

    /// Email is the primary key; student ID backs identifier lookups
    async fn ensure_indexes(&self) -> Result<(), Box<dyn Error>> {
        log::info!("🔧 Creating database indexes...");

        let users = self.collection::<Document>(USERS_COLLECTION);

        let email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        match users.create_index(email_index).await {
            Ok(_) => log::info!("   ✅ Index created: users(email) unique"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        let student_id_index = IndexModel::builder()
            .keys(doc! { "studentId": 1 })
            .build();

        match users.create_index(student_id_index).await {
            Ok(_) => log::info!("   ✅ Index created: users(studentId)"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        log::info!("✅ Database indexes ready");

        Ok(())
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }

    pub async fn health_check(&self) -> bool {
        self.db.list_collection_names().await.is_ok()
    }
}

/// [`UserStore`] over the `users` collection
#[derive(Clone)]
pub struct MongoUserStore {
    users: Collection<User>,
}

impl MongoUserStore {
    pub fn new(db: &MongoDB) -> Self {
        Self {
            users: db.collection::<User>(USERS_COLLECTION),
        }
    }
}

fn db_err(e: mongodb::error::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn put(&self, user: &User) -> Result<(), StoreError> {
        let mut record = user.clone();
        let now = BsonDateTime::now();
        record.created_at.get_or_insert(now);
        record.updated_at = Some(now);

        self.users
            .replace_one(doc! { "email": user.email.as_str() }, &record)
            .upsert(true)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn get(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.users
            .find_one(doc! { "email": email })
            .await
            .map_err(db_err)
    }

    async fn find_by_field(&self, field: UserField, value: &str) -> Result<Option<User>, StoreError> {
        let mut filter = Document::new();
        filter.insert(field.key(), value);

        self.users
            .find_one(filter)
            .await
            .map_err(db_err)
    }

    async fn update(&self, email: &str, patch: UserPatch) -> Result<(), StoreError> {
        let mut set = doc! { "updatedAt": BsonDateTime::now() };
        if let Some(nfc_uid) = patch.nfc_uid {
            set.insert("nfcUid", nfc_uid);
        }

        let result = self
            .users
            .update_one(doc! { "email": email }, doc! { "$set": set })
            .await
            .map_err(db_err)?;

        if result.matched_count == 0 {
            return Err(StoreError::NotFound(email.to_string()));
        }
        Ok(())
    }

    async fn delete(&self, email: &str) -> Result<(), StoreError> {
        let result = self
            .users
            .delete_one(doc! { "email": email })
            .await
            .map_err(db_err)?;

        if result.deleted_count == 0 {
            return Err(StoreError::NotFound(email.to_string()));
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let cursor = self.users.find(doc! {}).await.map_err(db_err)?;
        cursor.try_collect().await.map_err(db_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_mongodb_connection() {
        dotenv::dotenv().ok();
        let uri = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017/nfcampus".to_string());

        let db = MongoDB::new(&uri).await;
        assert!(db.is_ok());
        assert!(db.unwrap().health_check().await);
    }
}
