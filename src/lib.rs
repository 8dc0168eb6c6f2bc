// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! OnTrack: session, navigation guard, and task persistence core.
//!
//! This crate provides the client core for the task manager: a session
//! state machine over Firebase Auth, the route guard that gates
//! navigation on it, and the owner-scoped task repository on Firestore.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use config::Config;
use db::{DocumentStore, FirestoreStore};
use routes::RouteGuard;
use services::auth::AuthProvider;
use services::{FirebaseAuthClient, SessionStore, TaskRepository};

/// Shared application state.
#[derive(Clone)]
pub struct App {
    pub config: Config,
    pub session: SessionStore,
    pub tasks: TaskRepository,
}

impl App {
    /// Wire the app onto the live Firebase services.
    pub async fn connect(config: Config) -> anyhow::Result<App> {
        let provider = Arc::new(FirebaseAuthClient::new(&config));
        let store = Arc::new(FirestoreStore::new(&config.gcp_project_id).await?);
        Ok(Self::with_components(config, provider, store))
    }

    /// Wire the app onto any provider and store. Tests hand in the
    /// in-memory pair.
    pub fn with_components(
        config: Config,
        provider: Arc<dyn AuthProvider>,
        store: Arc<dyn DocumentStore>,
    ) -> App {
        let session = SessionStore::spawn(provider, Arc::clone(&store));
        let tasks = TaskRepository::new(store);
        App {
            config,
            session,
            tasks,
        }
    }

    /// Guard over the live session state.
    pub fn guard(&self) -> RouteGuard {
        RouteGuard::new(self.session.watch())
    }
}
