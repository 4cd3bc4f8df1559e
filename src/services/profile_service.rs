use crate::{
    database::{MongoDB, HISTORY_COLLECTION, USERS_COLLECTION},
    models::{HistoryEntry, UserIdentity, UserProfile},
    utils::AppError,
};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use serde_json::{Map, Value};

// Storage bookkeeping, not user attributes
const INTERNAL_FIELDS: [&str; 2] = ["_id", "user_id"];

/// Reads a user's profile and interaction history from the document store
#[async_trait]
pub trait ProfileReader: Send + Sync {
    /// `NotFound` if the profile doesn't exist; an empty history is fine.
    async fn read(
        &self,
        user: &UserIdentity,
    ) -> Result<(UserProfile, Vec<HistoryEntry>), AppError>;
}

pub struct MongoProfileReader {
    db: MongoDB,
}

impl MongoProfileReader {
    pub fn new(db: MongoDB) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProfileReader for MongoProfileReader {
    async fn read(
        &self,
        user: &UserIdentity,
    ) -> Result<(UserProfile, Vec<HistoryEntry>), AppError> {
        let users = self.db.collection::<Document>(USERS_COLLECTION);

        let profile_doc = users
            .find_one(doc! { "user_id": user.as_str() })
            .await?
            .ok_or_else(|| AppError::NotFound("User attributes not found".to_string()))?;

        let history = self.db.collection::<Document>(HISTORY_COLLECTION);
        let history_docs: Vec<Document> = history
            .find(doc! { "user_id": user.as_str() })
            .await?
            .try_collect()
            .await?;

        log::debug!(
            "📄 Loaded profile and {} history entries for {}",
            history_docs.len(),
            user
        );

        let profile = UserProfile(document_to_map(profile_doc));
        let entries = history_docs
            .into_iter()
            .map(|d| HistoryEntry(document_to_map(d)))
            .collect();

        Ok((profile, entries))
    }
}

/// Converts a BSON document into relaxed extended JSON, dropping storage fields
fn document_to_map(mut document: Document) -> Map<String, Value> {
    for field in INTERNAL_FIELDS {
        document.remove(field);
    }

    match Bson::Document(document).into_relaxed_extjson() {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
