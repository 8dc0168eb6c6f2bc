// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod task;
pub mod user;

pub use task::{Priority, Status, Task, TaskPatch};
pub use user::{CurrentUser, Identity, ProfileFields, UserProfile};
