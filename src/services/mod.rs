// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod auth;
pub mod session;
pub mod tasks;

pub use auth::{
    AuthProvider, CredentialSource, FederatedProvider, FirebaseAuthClient, InMemoryAuthProvider,
    SessionChange, SessionChanges,
};
pub use session::{SessionState, SessionStore};
pub use tasks::TaskRepository;
