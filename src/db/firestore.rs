// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore-backed document store.
//!
//! Handles:
//! - Client setup against the live service or the local emulator
//! - Raw field-map reads and writes addressed by document path
//! - Merge writes via an update mask built from the given fields

use async_trait::async_trait;
use futures_util::TryStreamExt;
use serde::Deserialize;

use crate::db::{Document, DocumentStore, Fields, StoreError};

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreStore {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreStore {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, StoreError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| StoreError(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, StoreError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        // ExternalJwtFunctionSource provides a dummy token without needing a
        // custom TokenSource implementation struct.
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| StoreError(format!("Failed to connect to Firestore Emulator: {}", e)))?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, StoreError> {
        self.client
            .as_ref()
            .ok_or_else(|| StoreError("Database not connected (offline mode)".to_string()))
    }
}

// ─── Path Handling ───────────────────────────────────────────

/// Wire shape for reads: the document id plus every remaining field.
#[derive(Debug, Deserialize)]
struct StoredDoc {
    #[serde(alias = "_firestore_id")]
    id: String,
    #[serde(flatten)]
    fields: Fields,
}

fn segments(path: &str) -> Result<Vec<&str>, StoreError> {
    let segs: Vec<&str> = path.split('/').collect();
    if segs.iter().any(|s| s.is_empty()) {
        return Err(StoreError(format!("Invalid path: {}", path)));
    }
    Ok(segs)
}

/// Split `a/b/.../col/id` into parent (collection, id) pairs, the leaf
/// collection, and the document id. Document paths have an even number
/// of segments.
fn split_document_path(path: &str) -> Result<(Vec<(&str, &str)>, &str, &str), StoreError> {
    let segs = segments(path)?;
    if segs.len() < 2 || segs.len() % 2 != 0 {
        return Err(StoreError(format!("Not a document path: {}", path)));
    }
    let id = segs[segs.len() - 1];
    let collection = segs[segs.len() - 2];
    let parents = segs[..segs.len() - 2]
        .chunks(2)
        .map(|pair| (pair[0], pair[1]))
        .collect();
    Ok((parents, collection, id))
}

/// Split `a/b/.../col` into parent pairs and the leaf collection.
/// Collection paths have an odd number of segments.
fn split_collection_path(path: &str) -> Result<(Vec<(&str, &str)>, &str), StoreError> {
    let segs = segments(path)?;
    if segs.len() % 2 == 0 {
        return Err(StoreError(format!("Not a collection path: {}", path)));
    }
    let collection = segs[segs.len() - 1];
    let parents = segs[..segs.len() - 1]
        .chunks(2)
        .map(|pair| (pair[0], pair[1]))
        .collect();
    Ok((parents, collection))
}

fn build_parent(
    client: &firestore::FirestoreDb,
    pairs: &[(&str, &str)],
) -> Result<Option<firestore::ParentPathBuilder>, StoreError> {
    let mut iter = pairs.iter();
    let Some((collection, id)) = iter.next() else {
        return Ok(None);
    };
    let mut parent = client
        .parent_path(collection, *id)
        .map_err(|e| StoreError(e.to_string()))?;
    for (collection, id) in iter {
        parent = parent.at(collection, *id).map_err(|e| StoreError(e.to_string()))?;
    }
    Ok(Some(parent))
}

// ─── Document Operations ─────────────────────────────────────

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn get_document(&self, path: &str) -> Result<Option<Document>, StoreError> {
        let client = self.get_client()?;
        let (parents, collection, id) = split_document_path(path)?;
        let parent = build_parent(client, &parents)?;

        let found: Option<StoredDoc> = match &parent {
            Some(parent_path) => {
                client
                    .fluent()
                    .select()
                    .by_id_in(collection)
                    .parent(parent_path)
                    .obj()
                    .one(id)
                    .await
            }
            None => {
                client
                    .fluent()
                    .select()
                    .by_id_in(collection)
                    .obj()
                    .one(id)
                    .await
            }
        }
        .map_err(|e| StoreError(e.to_string()))?;

        Ok(found.map(|doc| Document {
            id: doc.id,
            fields: doc.fields,
        }))
    }

    async fn set_document(
        &self,
        path: &str,
        fields: Fields,
        merge: bool,
    ) -> Result<(), StoreError> {
        let client = self.get_client()?;
        let (parents, collection, id) = split_document_path(path)?;
        let parent = build_parent(client, &parents)?;

        // With a mask the write touches only the listed fields and still
        // creates the document if it is missing. Without one it replaces
        // the whole document.
        let mask: Vec<String> = fields.keys().cloned().collect();
        let object = serde_json::Value::Object(fields);

        let update = client.fluent().update();
        let update = if merge { update.fields(mask) } else { update };

        let _: () = match &parent {
            Some(parent_path) => {
                update
                    .in_col(collection)
                    .document_id(id)
                    .parent(parent_path)
                    .object(&object)
                    .execute()
                    .await
            }
            None => {
                update
                    .in_col(collection)
                    .document_id(id)
                    .object(&object)
                    .execute()
                    .await
            }
        }
        .map_err(|e| StoreError(e.to_string()))?;

        Ok(())
    }

    async fn delete_document(&self, path: &str) -> Result<(), StoreError> {
        let client = self.get_client()?;
        let (parents, collection, id) = split_document_path(path)?;
        let parent = build_parent(client, &parents)?;

        match &parent {
            Some(parent_path) => {
                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .parent(parent_path)
                    .document_id(id)
                    .execute()
                    .await
            }
            None => {
                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(id)
                    .execute()
                    .await
            }
        }
        .map_err(|e| StoreError(e.to_string()))?;

        Ok(())
    }

    async fn list_documents(&self, collection_path: &str) -> Result<Vec<Document>, StoreError> {
        let client = self.get_client()?;
        let (parents, collection) = split_collection_path(collection_path)?;
        let parent = build_parent(client, &parents)?;

        let stream = match &parent {
            Some(parent_path) => {
                client
                    .fluent()
                    .select()
                    .from(collection)
                    .parent(parent_path)
                    .obj::<StoredDoc>()
                    .stream_query_with_errors()
                    .await
            }
            None => {
                client
                    .fluent()
                    .select()
                    .from(collection)
                    .obj::<StoredDoc>()
                    .stream_query_with_errors()
                    .await
            }
        }
        .map_err(|e| StoreError(e.to_string()))?;

        let docs: Vec<StoredDoc> = stream
            .try_collect()
            .await
            .map_err(|e| StoreError(e.to_string()))?;

        Ok(docs
            .into_iter()
            .map(|doc| Document {
                id: doc.id,
                fields: doc.fields,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_document_path() {
        let (parents, collection, id) = split_document_path("users/u1").unwrap();
        assert!(parents.is_empty());
        assert_eq!(collection, "users");
        assert_eq!(id, "u1");

        let (parents, collection, id) =
            split_document_path("tasks/u1/userTasks/t1").unwrap();
        assert_eq!(parents, vec![("tasks", "u1")]);
        assert_eq!(collection, "userTasks");
        assert_eq!(id, "t1");
    }

    #[test]
    fn test_split_collection_path() {
        let (parents, collection) = split_collection_path("users").unwrap();
        assert!(parents.is_empty());
        assert_eq!(collection, "users");

        let (parents, collection) = split_collection_path("tasks/u1/userTasks").unwrap();
        assert_eq!(parents, vec![("tasks", "u1")]);
        assert_eq!(collection, "userTasks");
    }

    #[test]
    fn test_rejects_malformed_paths() {
        assert!(split_document_path("users").is_err());
        assert!(split_document_path("users//u1").is_err());
        assert!(split_document_path("").is_err());
        assert!(split_collection_path("users/u1").is_err());
    }

    #[tokio::test]
    async fn test_mock_store_errors_offline() {
        let store = FirestoreStore::new_mock();

        let err = store.get_document("users/u1").await.unwrap_err();
        assert!(err.to_string().contains("offline mode"));

        let err = store
            .set_document("users/u1", Fields::new(), true)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("offline mode"));

        assert!(store.delete_document("users/u1").await.is_err());
        assert!(store.list_documents("users").await.is_err());
    }
}
