// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity Toolkit integration tests.
//!
//! These tests require the Firebase Auth emulator to be running, with
//! FIREBASE_AUTH_EMULATOR_HOST pointing at it:
//!
//!     firebase emulators:start --only auth
//!
//! The emulator accepts any API key, so the test config's placeholder
//! key works.

use ontrack::config::Config;
use ontrack::error::AuthErrorKind;
use ontrack::services::{AuthProvider, FirebaseAuthClient, SessionChange};

mod common;

/// Generate a unique email for test isolation.
fn unique_email() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    format!(
        "it-{}@example.com",
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    )
}

fn test_client() -> FirebaseAuthClient {
    FirebaseAuthClient::new(&Config::test_default())
}

#[tokio::test]
async fn test_password_account_lifecycle() {
    require_auth_emulator!();

    let client = test_client();
    let email = unique_email();

    let created = client.create_identity(&email, "secret1").await.unwrap();
    assert!(!created.id.is_empty(), "Provider should assign a uid");
    assert_eq!(created.email, email);

    let signed_in = client.sign_in(&email, "secret1").await.unwrap();
    assert_eq!(signed_in.id, created.id);
    assert_eq!(signed_in.email, email);

    println!("✓ Password account lifecycle verified: email={}", email);
}

#[tokio::test]
async fn test_duplicate_email_rejected() {
    require_auth_emulator!();

    let client = test_client();
    let email = unique_email();

    client.create_identity(&email, "secret1").await.unwrap();
    let err = client.create_identity(&email, "secret2").await.unwrap_err();
    assert_eq!(err.kind(), AuthErrorKind::EmailInUse);
    assert!(err.message().contains("EMAIL_EXISTS"));

    println!("✓ Duplicate email rejected: email={}", email);
}

#[tokio::test]
async fn test_weak_password_rejected() {
    require_auth_emulator!();

    let client = test_client();
    let err = client.create_identity(&unique_email(), "123").await.unwrap_err();
    assert_eq!(err.kind(), AuthErrorKind::WeakPassword);
    assert!(err.message().starts_with("WEAK_PASSWORD"));

    println!("✓ Weak password rejected with: {}", err.message());
}

#[tokio::test]
async fn test_invalid_email_rejected() {
    require_auth_emulator!();

    let client = test_client();
    let err = client.create_identity("not-an-email", "secret1").await.unwrap_err();
    assert_eq!(err.kind(), AuthErrorKind::InvalidEmail);

    println!("✓ Invalid email rejected with: {}", err.message());
}

#[tokio::test]
async fn test_bad_credentials_classified() {
    require_auth_emulator!();

    let client = test_client();
    let email = unique_email();
    client.create_identity(&email, "secret1").await.unwrap();

    // The exact code varies across emulator versions (INVALID_PASSWORD
    // or INVALID_LOGIN_CREDENTIALS); both classify the same way.
    let err = client.sign_in(&email, "wrong-password").await.unwrap_err();
    assert_eq!(err.kind(), AuthErrorKind::InvalidCredentials);

    let err = client.sign_in(&unique_email(), "secret1").await.unwrap_err();
    assert_eq!(err.kind(), AuthErrorKind::InvalidCredentials);

    println!("✓ Bad credentials classified: email={}", email);
}

#[tokio::test]
async fn test_session_changes_delivered() {
    require_auth_emulator!();

    let client = test_client();
    let email = unique_email();

    let mut changes = client.subscribe();
    assert_eq!(changes.next().await, Some(SessionChange::SignedOut));

    let identity = client.create_identity(&email, "secret1").await.unwrap();
    assert_eq!(changes.next().await, Some(SessionChange::SignedIn(identity)));

    client.sign_out().await.unwrap();
    assert_eq!(changes.next().await, Some(SessionChange::SignedOut));

    println!("✓ Session changes delivered: email={}", email);
}
