// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Task repository.
//!
//! Every read and write goes to `tasks/{ownerId}/userTasks`; the owner
//! id comes from the session, never from caller-supplied data, so one
//! user's queries cannot reach another user's tasks.

use std::sync::Arc;
use uuid::Uuid;

use crate::db::{paths, DocumentStore};
use crate::error::{AppError, Result};
use crate::models::{Task, TaskPatch};

/// Owner-scoped task storage.
#[derive(Clone)]
pub struct TaskRepository {
    store: Arc<dyn DocumentStore>,
}

impl TaskRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// List the owner's tasks, skipping documents that no longer decode.
    pub async fn list(&self, owner_id: &str) -> Result<Vec<Task>> {
        let docs = self
            .store
            .list_documents(&paths::task_collection(owner_id))
            .await
            .map_err(|e| AppError::Fetch(e.to_string()))?;

        let mut tasks = Vec::with_capacity(docs.len());
        for doc in docs {
            match Task::from_fields(doc.id.clone(), doc.fields) {
                Ok(task) => tasks.push(task),
                Err(e) => {
                    tracing::warn!(task_id = %doc.id, error = %e, "Skipping task that does not decode");
                }
            }
        }
        Ok(tasks)
    }

    /// Get one task by id.
    pub async fn get(&self, owner_id: &str, task_id: &str) -> Result<Task> {
        let doc = self
            .store
            .get_document(&paths::task_doc(owner_id, task_id))
            .await
            .map_err(|e| AppError::Fetch(e.to_string()))?
            .ok_or_else(|| AppError::NotFound(format!("Task {}", task_id)))?;

        Task::from_fields(doc.id, doc.fields)
            .map_err(|e| AppError::Fetch(format!("Task {} does not decode: {}", task_id, e)))
    }

    /// Create or update a task and return its id.
    ///
    /// Without an id the patch must be complete and a fresh id is
    /// assigned. With an id, only the fields present in the patch
    /// change; everything else stays as stored.
    pub async fn upsert(
        &self,
        owner_id: &str,
        task_id: Option<&str>,
        patch: &TaskPatch,
    ) -> Result<String> {
        patch.check(task_id.is_none())?;

        let id = match task_id {
            Some(id) => id.to_string(),
            None => Uuid::new_v4().to_string(),
        };

        let fields = patch
            .to_fields()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize task: {}", e)))?;

        self.store
            .set_document(&paths::task_doc(owner_id, &id), fields, true)
            .await
            .map_err(|e| AppError::Persistence(e.to_string()))?;

        tracing::debug!(owner_id = %owner_id, task_id = %id, "Task written");
        Ok(id)
    }

    /// Delete a task. Deleting an id that never existed is not an error.
    pub async fn delete(&self, owner_id: &str, task_id: &str) -> Result<()> {
        self.store
            .delete_document(&paths::task_doc(owner_id, task_id))
            .await
            .map_err(|e| AppError::Persistence(e.to_string()))?;

        tracing::debug!(owner_id = %owner_id, task_id = %task_id, "Task deleted");
        Ok(())
    }
}
