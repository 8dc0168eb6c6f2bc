// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Auth providers.
//!
//! Handles:
//! - Password sign-up and sign-in via the Firebase Identity Toolkit
//! - Federated (Google) sign-in through a pluggable credential source
//! - Session-change events fanned out to subscribers
//! - Provider error code classification

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AuthError, AuthErrorKind};
use crate::models::Identity;

const LIVE_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Federated identity providers the app can sign in with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FederatedProvider {
    Google,
}

impl FederatedProvider {
    /// Identity Toolkit provider id.
    pub fn provider_id(&self) -> &'static str {
        match self {
            FederatedProvider::Google => "google.com",
        }
    }
}

/// A change in who is signed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionChange {
    SignedIn(Identity),
    SignedOut,
}

/// Stream of session changes. The provider's state at subscribe time
/// is delivered first, then every later change in order.
pub struct SessionChanges {
    initial: Option<SessionChange>,
    rx: broadcast::Receiver<SessionChange>,
}

impl SessionChanges {
    /// Next change, or `None` once the provider is gone.
    pub async fn next(&mut self) -> Option<SessionChange> {
        if let Some(change) = self.initial.take() {
            return Some(change);
        }
        loop {
            match self.rx.recv().await {
                Ok(change) => return Some(change),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "Dropped session changes, catching up");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Source of the federated provider's ID token.
///
/// In the app this wraps the platform's Google sign-in flow; tests
/// hand back a canned token.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    async fn id_token(&self) -> Result<String, AuthError>;
}

/// An authentication backend.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Register a password account and sign it in.
    async fn create_identity(&self, email: &str, password: &str) -> Result<Identity, AuthError>;

    /// Sign in with email and password.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError>;

    /// Sign in through a federated provider.
    async fn sign_in_federated(&self, provider: FederatedProvider)
        -> Result<Identity, AuthError>;

    /// End the current session.
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Current identity plus a stream of later changes.
    fn subscribe(&self) -> SessionChanges;
}

// ─── Session Tracking ────────────────────────────────────────

/// Current identity plus the event fan-out, shared by both providers.
struct SessionTracker {
    current: RwLock<Option<Identity>>,
    events: broadcast::Sender<SessionChange>,
}

impl Default for SessionTracker {
    fn default() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            current: RwLock::new(None),
            events,
        }
    }
}

impl SessionTracker {
    fn signed_in(&self, identity: Identity) {
        *self
            .current
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(identity.clone());
        let _ = self.events.send(SessionChange::SignedIn(identity));
    }

    fn signed_out(&self) {
        *self
            .current
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = None;
        let _ = self.events.send(SessionChange::SignedOut);
    }

    fn subscribe(&self) -> SessionChanges {
        // Subscribe before reading the snapshot so a change landing in
        // between shows up as an event instead of going missing.
        let rx = self.events.subscribe();
        let current = self
            .current
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone();
        let initial = Some(match current {
            Some(identity) => SessionChange::SignedIn(identity),
            None => SessionChange::SignedOut,
        });
        SessionChanges { initial, rx }
    }
}

// ─── Firebase Identity Toolkit ───────────────────────────────

/// Firebase Identity Toolkit REST client.
pub struct FirebaseAuthClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    google_tokens: Option<Arc<dyn CredentialSource>>,
    session: SessionTracker,
}

impl FirebaseAuthClient {
    /// Create a new Identity Toolkit client.
    ///
    /// For local development with emulator, set FIREBASE_AUTH_EMULATOR_HOST.
    pub fn new(config: &Config) -> Self {
        let base_url = match std::env::var("FIREBASE_AUTH_EMULATOR_HOST") {
            Ok(host) => {
                tracing::info!(host = %host, "Using Firebase Auth emulator");
                format!("http://{}/identitytoolkit.googleapis.com/v1", host)
            }
            Err(_) => LIVE_BASE_URL.to_string(),
        };

        Self {
            http: reqwest::Client::new(),
            base_url,
            api_key: config.firebase_api_key.clone(),
            google_tokens: None,
            session: SessionTracker::default(),
        }
    }

    /// Supply the source of Google ID tokens for federated sign-in.
    pub fn with_credential_source(mut self, source: Arc<dyn CredentialSource>) -> Self {
        self.google_tokens = Some(source);
        self
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{}/accounts:{}?key={}", self.base_url, action, self.api_key)
    }

    /// POST to an accounts endpoint and parse the response.
    async fn post_accounts(
        &self,
        action: &str,
        body: serde_json::Value,
    ) -> Result<AccountResponse, AuthError> {
        let response = self
            .http
            .post(self.endpoint(action))
            .json(&body)
            .send()
            .await
            .map_err(|e| AuthError::new(AuthErrorKind::Network, e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(decode_provider_error(status, &body));
        }

        response.json().await.map_err(|e| {
            AuthError::new(
                AuthErrorKind::Provider,
                format!("Malformed provider response: {}", e),
            )
        })
    }
}

#[async_trait]
impl AuthProvider for FirebaseAuthClient {
    async fn create_identity(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let account = self
            .post_accounts(
                "signUp",
                serde_json::json!({
                    "email": email,
                    "password": password,
                    "returnSecureToken": true,
                }),
            )
            .await?;

        let identity = account.into_identity(email);
        tracing::info!(uid = %identity.id, "Account created");
        self.session.signed_in(identity.clone());
        Ok(identity)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let account = self
            .post_accounts(
                "signInWithPassword",
                serde_json::json!({
                    "email": email,
                    "password": password,
                    "returnSecureToken": true,
                }),
            )
            .await?;

        let identity = account.into_identity(email);
        tracing::info!(uid = %identity.id, "Signed in");
        self.session.signed_in(identity.clone());
        Ok(identity)
    }

    async fn sign_in_federated(
        &self,
        provider: FederatedProvider,
    ) -> Result<Identity, AuthError> {
        let source = self.google_tokens.as_ref().ok_or_else(|| {
            AuthError::new(
                AuthErrorKind::Provider,
                "No credential source configured for federated sign-in",
            )
        })?;
        let id_token = source.id_token().await?;

        let post_body = format!(
            "id_token={}&providerId={}",
            urlencoding::encode(&id_token),
            provider.provider_id()
        );
        let account = self
            .post_accounts(
                "signInWithIdp",
                serde_json::json!({
                    "postBody": post_body,
                    "requestUri": "http://localhost",
                    "returnSecureToken": true,
                }),
            )
            .await?;

        let identity = account.into_identity("");
        tracing::info!(
            uid = %identity.id,
            provider = provider.provider_id(),
            "Federated sign-in complete"
        );
        self.session.signed_in(identity.clone());
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.session.signed_out();
        Ok(())
    }

    fn subscribe(&self) -> SessionChanges {
        self.session.subscribe()
    }
}

/// Identity Toolkit account response (the fields we use).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    display_name: Option<String>,
}

impl AccountResponse {
    fn into_identity(self, fallback_email: &str) -> Identity {
        let email = if self.email.is_empty() {
            fallback_email.to_string()
        } else {
            self.email
        };
        Identity {
            id: self.local_id,
            email,
            display_name: self.display_name,
        }
    }
}

/// Map an Identity Toolkit error body onto an AuthError.
///
/// Bodies look like `{"error": {"message": "EMAIL_EXISTS"}}`; the code
/// may carry a suffix, as in "WEAK_PASSWORD : Password should be at
/// least 6 characters".
fn decode_provider_error(status: reqwest::StatusCode, body: &str) -> AuthError {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: ErrorDetail,
    }
    #[derive(Deserialize)]
    struct ErrorDetail {
        #[serde(default)]
        message: String,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) if !parsed.error.message.is_empty() => {
            classify_provider_message(parsed.error.message)
        }
        _ => AuthError::new(AuthErrorKind::Provider, format!("HTTP {}: {}", status, body)),
    }
}

/// Classify a provider error code, keeping the message verbatim.
fn classify_provider_message(message: String) -> AuthError {
    let code = message
        .split(|c: char| c == ' ' || c == ':')
        .next()
        .unwrap_or("");
    let kind = match code {
        "INVALID_EMAIL" | "MISSING_EMAIL" => AuthErrorKind::InvalidEmail,
        "EMAIL_EXISTS" => AuthErrorKind::EmailInUse,
        "WEAK_PASSWORD" | "MISSING_PASSWORD" => AuthErrorKind::WeakPassword,
        "INVALID_PASSWORD" | "EMAIL_NOT_FOUND" | "INVALID_LOGIN_CREDENTIALS" => {
            AuthErrorKind::InvalidCredentials
        }
        "USER_DISABLED" => AuthErrorKind::UserDisabled,
        _ => AuthErrorKind::Provider,
    };
    AuthError::new(kind, message)
}

// ─── In-Memory Provider ──────────────────────────────────────

/// In-memory provider double, answering with the live provider's
/// error codes.
#[derive(Default)]
pub struct InMemoryAuthProvider {
    accounts: DashMap<String, StoredAccount>,
    federated: DashMap<&'static str, Identity>,
    session: SessionTracker,
}

struct StoredAccount {
    uid: String,
    password: String,
}

impl InMemoryAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-register the identity a federated sign-in should produce.
    pub fn with_federated_identity(self, provider: FederatedProvider, identity: Identity) -> Self {
        self.federated.insert(provider.provider_id(), identity);
        self
    }

    /// Push a provider-side sign-out, as if the session ended in
    /// another tab.
    pub fn force_sign_out(&self) {
        self.session.signed_out();
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    }
}

#[async_trait]
impl AuthProvider for InMemoryAuthProvider {
    async fn create_identity(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let email = normalize_email(email);
        if !is_plausible_email(&email) {
            return Err(AuthError::new(AuthErrorKind::InvalidEmail, "INVALID_EMAIL"));
        }
        if password.len() < 6 {
            return Err(AuthError::new(
                AuthErrorKind::WeakPassword,
                "WEAK_PASSWORD : Password should be at least 6 characters",
            ));
        }

        let uid = Uuid::new_v4().simple().to_string();
        match self.accounts.entry(email.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                return Err(AuthError::new(AuthErrorKind::EmailInUse, "EMAIL_EXISTS"));
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(StoredAccount {
                    uid: uid.clone(),
                    password: password.to_string(),
                });
            }
        }

        let identity = Identity {
            id: uid,
            email,
            display_name: None,
        };
        self.session.signed_in(identity.clone());
        Ok(identity)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let email = normalize_email(email);
        let identity = {
            let account = self.accounts.get(&email).ok_or_else(|| {
                AuthError::new(AuthErrorKind::InvalidCredentials, "EMAIL_NOT_FOUND")
            })?;
            if account.password != password {
                return Err(AuthError::new(
                    AuthErrorKind::InvalidCredentials,
                    "INVALID_PASSWORD",
                ));
            }
            Identity {
                id: account.uid.clone(),
                email: email.clone(),
                display_name: None,
            }
        };
        self.session.signed_in(identity.clone());
        Ok(identity)
    }

    async fn sign_in_federated(
        &self,
        provider: FederatedProvider,
    ) -> Result<Identity, AuthError> {
        let identity = self
            .federated
            .get(provider.provider_id())
            .map(|entry| entry.clone())
            .ok_or_else(|| {
                AuthError::new(
                    AuthErrorKind::Provider,
                    format!("No {} account linked", provider.provider_id()),
                )
            })?;
        self.session.signed_in(identity.clone());
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.session.signed_out();
        Ok(())
    }

    fn subscribe(&self) -> SessionChanges {
        self.session.subscribe()
    }
}
