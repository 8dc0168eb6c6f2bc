//! Storage layer (Firestore, plus an in-memory double for tests).
//!
//! Documents are addressed by slash-separated paths like
//! `users/{uid}` or `tasks/{ownerId}/userTasks/{taskId}` and carried
//! as raw field maps. Typed models decode at the call site.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreStore;
pub use memory::MemoryStore;

use async_trait::async_trait;

/// Raw document fields, keyed by wire field name.
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// A stored document: its id plus the raw fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

/// Storage failure, carrying the backend's message.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct StoreError(pub String);

/// Document CRUD over path-addressed collections.
///
/// A document path has an even number of segments, a collection path
/// an odd number. `set_document` with `merge` set touches only the
/// given fields and creates the document if it does not exist yet.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get_document(&self, path: &str) -> Result<Option<Document>, StoreError>;

    async fn set_document(&self, path: &str, fields: Fields, merge: bool)
        -> Result<(), StoreError>;

    /// Delete a document. Deleting an absent document is not an error.
    async fn delete_document(&self, path: &str) -> Result<(), StoreError>;

    async fn list_documents(&self, collection_path: &str) -> Result<Vec<Document>, StoreError>;
}

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const TASKS: &str = "tasks";
    pub const USER_TASKS: &str = "userTasks";
}

/// Path builders for the documents this app stores.
pub mod paths {
    use super::collections;

    /// `users/{uid}`
    pub fn profile_doc(uid: &str) -> String {
        format!("{}/{}", collections::USERS, uid)
    }

    /// `tasks/{ownerId}/userTasks`
    pub fn task_collection(owner_id: &str) -> String {
        format!(
            "{}/{}/{}",
            collections::TASKS,
            owner_id,
            collections::USER_TASKS
        )
    }

    /// `tasks/{ownerId}/userTasks/{taskId}`
    pub fn task_doc(owner_id: &str, task_id: &str) -> String {
        format!("{}/{}", task_collection(owner_id), task_id)
    }
}
