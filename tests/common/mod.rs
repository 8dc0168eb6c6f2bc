// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use chrono::NaiveDate;
use ontrack::config::Config;
use ontrack::db::MemoryStore;
use ontrack::models::{Identity, Priority, ProfileFields, Status, TaskPatch};
use ontrack::services::{FederatedProvider, InMemoryAuthProvider};
use ontrack::App;
use std::sync::Arc;

/// Check if the Firestore emulator is available via environment variable.
#[allow(dead_code)]
pub fn firestore_emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Check if the Firebase Auth emulator is available via environment variable.
#[allow(dead_code)]
pub fn auth_emulator_available() -> bool {
    std::env::var("FIREBASE_AUTH_EMULATOR_HOST").is_ok()
}

/// Skip test with message if the Firestore emulator is not available.
#[macro_export]
macro_rules! require_firestore_emulator {
    () => {
        if !crate::common::firestore_emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Skip test with message if the Auth emulator is not available.
#[macro_export]
macro_rules! require_auth_emulator {
    () => {
        if !crate::common::auth_emulator_available() {
            eprintln!("⚠️  Skipping: FIREBASE_AUTH_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Initialize tracing for a test run. Set RUST_LOG to see worker logs.
#[allow(dead_code)]
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Create a test app over the in-memory provider and store.
/// Returns the concrete halves too, for direct inspection.
#[allow(dead_code)]
pub fn test_app() -> (App, Arc<InMemoryAuthProvider>, Arc<MemoryStore>) {
    init_tracing();
    let provider = Arc::new(InMemoryAuthProvider::new());
    let store = Arc::new(MemoryStore::new());
    let app = App::with_components(Config::test_default(), provider.clone(), store.clone());
    (app, provider, store)
}

/// Test app whose Google sign-in resolves to the given identity.
#[allow(dead_code)]
pub fn test_app_with_google(
    identity: Identity,
) -> (App, Arc<InMemoryAuthProvider>, Arc<MemoryStore>) {
    init_tracing();
    let provider = Arc::new(
        InMemoryAuthProvider::new().with_federated_identity(FederatedProvider::Google, identity),
    );
    let store = Arc::new(MemoryStore::new());
    let app = App::with_components(Config::test_default(), provider.clone(), store.clone());
    (app, provider, store)
}

/// Registration form fields that pass validation.
#[allow(dead_code)]
pub fn sample_profile() -> ProfileFields {
    ProfileFields {
        first_name: "Grace".to_string(),
        last_name: "Hopper".to_string(),
        address: "1 Navy Way".to_string(),
        mobile: "4155550100".to_string(),
    }
}

/// A complete task patch, as the create form submits it.
#[allow(dead_code)]
pub fn sample_patch() -> TaskPatch {
    TaskPatch {
        title: Some("Write weekly report".to_string()),
        description: Some("Summarize progress for the team standup".to_string()),
        due_date: NaiveDate::from_ymd_opt(2026, 3, 18),
        priority: Some(Priority::Medium),
        status: Some(Status::ToDo),
    }
}
