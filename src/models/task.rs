// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Task records and the validated patch type used for writes.
//!
//! Wire field names are camelCase (`dueDate`) so documents written by
//! earlier clients read back unchanged. The task id is the document id,
//! never one of the stored fields.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use crate::error::FieldErrors;

/// Task priority, stored under its display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// Error parsing a priority from its display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Priority must be Low, Medium, or High")]
pub struct InvalidPriority;

impl FromStr for Priority {
    type Err = InvalidPriority;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Low" => Ok(Priority::Low),
            "Medium" => Ok(Priority::Medium),
            "High" => Ok(Priority::High),
            _ => Err(InvalidPriority),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        };
        f.write_str(name)
    }
}

/// Task status, stored under its display name ("To Do", "In Progress",
/// "Done").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "To Do")]
    ToDo,
    #[serde(rename = "In Progress")]
    InProgress,
    Done,
}

/// Error parsing a status from its display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Status must be To Do, In Progress, or Done")]
pub struct InvalidStatus;

impl FromStr for Status {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "To Do" => Ok(Status::ToDo),
            "In Progress" => Ok(Status::InProgress),
            "Done" => Ok(Status::Done),
            _ => Err(InvalidStatus),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::ToDo => "To Do",
            Status::InProgress => "In Progress",
            Status::Done => "Done",
        };
        f.write_str(name)
    }
}

/// A task document under `tasks/{ownerId}/userTasks/{taskId}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Document id; owner is implicit via the storage path.
    #[serde(skip)]
    pub id: String,
    pub title: String,
    pub description: String,
    pub due_date: NaiveDate,
    pub priority: Priority,
    pub status: Status,
}

impl Task {
    /// Rebuild a task from a stored document's id and field map.
    pub fn from_fields(
        id: impl Into<String>,
        fields: serde_json::Map<String, serde_json::Value>,
    ) -> serde_json::Result<Self> {
        let mut task: Task = serde_json::from_value(serde_json::Value::Object(fields))?;
        task.id = id.into();
        Ok(task)
    }
}

/// Field set submitted to an upsert.
///
/// Present fields are validated and written; absent fields are left
/// untouched by the merge-write. Creating a new task requires every
/// field to be present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[validate(length(min = 3, message = "Title must be at least 3 characters"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[validate(length(min = 10, message = "Description must be at least 10 characters"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
}

impl TaskPatch {
    /// Patch carrying every field of an existing task.
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: Some(task.title.clone()),
            description: Some(task.description.clone()),
            due_date: Some(task.due_date),
            priority: Some(task.priority),
            status: Some(task.status),
        }
    }

    /// Validate the present fields; with `create` set, also require
    /// every field. Messages match what the task form shows inline.
    pub fn check(&self, create: bool) -> Result<(), FieldErrors> {
        let mut errors = match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => FieldErrors::from(e),
        };

        if create {
            if self.title.is_none() {
                errors.push("title", "Title must be at least 3 characters");
            }
            if self.description.is_none() {
                errors.push("description", "Description must be at least 10 characters");
            }
            if self.due_date.is_none() {
                errors.push("due_date", "Due date is required");
            }
            if self.priority.is_none() {
                errors.push("priority", InvalidPriority.to_string());
            }
            if self.status.is_none() {
                errors.push("status", InvalidStatus.to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Serialize the present fields as a document field map.
    pub fn to_fields(&self) -> serde_json::Result<serde_json::Map<String, serde_json::Value>> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(fields) => Ok(fields),
            _ => Err(serde::ser::Error::custom(
                "task patch did not serialize to an object",
            )),
        }
    }
}
