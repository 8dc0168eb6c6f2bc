// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory document store, a stand-in for Firestore in tests.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

use crate::db::{Document, DocumentStore, Fields, StoreError};

/// Document store backed by a process-local map, keyed by full
/// document path.
#[derive(Clone, Default)]
pub struct MemoryStore {
    docs: Arc<DashMap<String, Fields>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents across all collections.
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

fn doc_id(path: &str) -> String {
    path.rsplit('/').next().unwrap_or(path).to_string()
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_document(&self, path: &str) -> Result<Option<Document>, StoreError> {
        Ok(self.docs.get(path).map(|entry| Document {
            id: doc_id(path),
            fields: entry.value().clone(),
        }))
    }

    async fn set_document(
        &self,
        path: &str,
        fields: Fields,
        merge: bool,
    ) -> Result<(), StoreError> {
        if merge {
            let mut entry = self.docs.entry(path.to_string()).or_default();
            entry.extend(fields);
        } else {
            self.docs.insert(path.to_string(), fields);
        }
        Ok(())
    }

    async fn delete_document(&self, path: &str) -> Result<(), StoreError> {
        self.docs.remove(path);
        Ok(())
    }

    async fn list_documents(&self, collection_path: &str) -> Result<Vec<Document>, StoreError> {
        let prefix = format!("{}/", collection_path);
        let mut docs: Vec<Document> = self
            .docs
            .iter()
            .filter_map(|entry| {
                let rest = entry.key().strip_prefix(&prefix)?;
                // Only direct children; deeper paths belong to subcollections.
                if rest.contains('/') {
                    return None;
                }
                Some(Document {
                    id: rest.to_string(),
                    fields: entry.value().clone(),
                })
            })
            .collect();
        docs.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(docs)
    }
}
