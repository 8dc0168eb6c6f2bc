// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session state machine.
//!
//! One worker task owns the auth state. Explicit calls (sign up, sign
//! in, log out) and provider session changes land on the same queue,
//! so transitions apply in a single well-defined order. Consumers read
//! the state through a `watch` channel and never talk to the provider
//! directly.

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};

use crate::db::{paths, DocumentStore};
use crate::error::{AppError, Result};
use crate::models::{CurrentUser, Identity, ProfileFields, UserProfile};
use crate::services::auth::{AuthProvider, FederatedProvider, SessionChange};

/// Who is signed in, as far as the app knows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    /// The provider has not reported yet (app start).
    #[default]
    Initializing,
    Unauthenticated,
    Authenticated(CurrentUser),
}

impl SessionState {
    /// True until the provider has reported for the first time.
    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Initializing)
    }

    pub fn user(&self) -> Option<&CurrentUser> {
        match self {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

enum SessionMessage {
    SignUp {
        email: String,
        password: String,
        fields: ProfileFields,
        reply: oneshot::Sender<Result<CurrentUser>>,
    },
    SignIn {
        email: String,
        password: String,
        reply: oneshot::Sender<Result<()>>,
    },
    FederatedSignIn {
        provider: FederatedProvider,
        reply: oneshot::Sender<Result<CurrentUser>>,
    },
    Logout {
        reply: oneshot::Sender<Result<()>>,
    },
    ProviderChange(SessionChange),
}

/// Cloneable handle to the session worker.
#[derive(Clone)]
pub struct SessionStore {
    commands: mpsc::Sender<SessionMessage>,
    state: watch::Receiver<SessionState>,
}

impl SessionStore {
    /// Start the worker and the provider subscription.
    pub fn spawn(provider: Arc<dyn AuthProvider>, store: Arc<dyn DocumentStore>) -> Self {
        let (commands, messages) = mpsc::channel(32);
        let (publish, state) = watch::channel(SessionState::Initializing);

        // Provider changes go through the same queue as explicit calls,
        // so one consumer applies every transition in order.
        let mut changes = provider.subscribe();
        let forward = commands.clone();
        tokio::spawn(async move {
            while let Some(change) = changes.next().await {
                if forward
                    .send(SessionMessage::ProviderChange(change))
                    .await
                    .is_err()
                {
                    break;
                }
            }
        });

        let worker = SessionWorker {
            provider,
            store,
            publish,
        };
        tokio::spawn(worker.run(messages));

        Self { commands, state }
    }

    /// Current state snapshot.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Watch channel for state changes.
    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    /// Wait until the provider has reported at least once.
    pub async fn wait_until_resolved(&self) -> SessionState {
        let mut watch = self.state.clone();
        let resolved = match watch.wait_for(|state| !state.is_loading()).await {
            Ok(state) => state.clone(),
            // Worker is gone; report whatever it last published.
            Err(_) => self.state(),
        };
        resolved
    }

    /// Register a password account, store its profile, and sign it in.
    pub async fn sign_up(
        &self,
        email: impl Into<String>,
        password: impl Into<String>,
        fields: ProfileFields,
    ) -> Result<CurrentUser> {
        let (reply, response) = oneshot::channel();
        self.send(SessionMessage::SignUp {
            email: email.into(),
            password: password.into(),
            fields,
            reply,
        })
        .await?;
        self.recv(response).await
    }

    /// Sign in with email and password. The state transition follows
    /// through the provider's session change.
    pub async fn sign_in(
        &self,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<()> {
        let (reply, response) = oneshot::channel();
        self.send(SessionMessage::SignIn {
            email: email.into(),
            password: password.into(),
            reply,
        })
        .await?;
        self.recv(response).await
    }

    /// Sign in with Google, storing a first-run profile if none exists.
    pub async fn sign_in_with_google(&self) -> Result<CurrentUser> {
        let (reply, response) = oneshot::channel();
        self.send(SessionMessage::FederatedSignIn {
            provider: FederatedProvider::Google,
            reply,
        })
        .await?;
        self.recv(response).await
    }

    /// End the current session.
    pub async fn logout(&self) -> Result<()> {
        let (reply, response) = oneshot::channel();
        self.send(SessionMessage::Logout { reply }).await?;
        self.recv(response).await
    }

    async fn send(&self, message: SessionMessage) -> Result<()> {
        self.commands
            .send(message)
            .await
            .map_err(|_| AppError::Internal(anyhow::anyhow!("Session store task stopped")))
    }

    async fn recv<T>(&self, response: oneshot::Receiver<Result<T>>) -> Result<T> {
        response
            .await
            .map_err(|_| AppError::Internal(anyhow::anyhow!("Session store task stopped")))?
    }
}

struct SessionWorker {
    provider: Arc<dyn AuthProvider>,
    store: Arc<dyn DocumentStore>,
    publish: watch::Sender<SessionState>,
}

impl SessionWorker {
    async fn run(self, mut messages: mpsc::Receiver<SessionMessage>) {
        while let Some(message) = messages.recv().await {
            match message {
                SessionMessage::SignUp {
                    email,
                    password,
                    fields,
                    reply,
                } => {
                    let _ = reply.send(self.handle_sign_up(email, password, fields).await);
                }
                SessionMessage::SignIn {
                    email,
                    password,
                    reply,
                } => {
                    let _ = reply.send(self.handle_sign_in(email, password).await);
                }
                SessionMessage::FederatedSignIn { provider, reply } => {
                    let _ = reply.send(self.handle_federated_sign_in(provider).await);
                }
                SessionMessage::Logout { reply } => {
                    let _ = reply.send(self.handle_logout().await);
                }
                SessionMessage::ProviderChange(change) => {
                    self.handle_session_change(change).await;
                }
            }
        }
        tracing::debug!("Session worker stopped");
    }

    async fn handle_sign_up(
        &self,
        email: String,
        password: String,
        fields: ProfileFields,
    ) -> Result<CurrentUser> {
        fields.check()?;

        let identity = self.provider.create_identity(&email, &password).await?;

        let profile = UserProfile::for_sign_up(&identity, &fields, chrono::Utc::now());
        let doc = profile
            .to_fields()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize profile: {}", e)))?;

        let path = paths::profile_doc(&identity.id);
        if let Err(e) = self.store.set_document(&path, doc, false).await {
            // The account exists at the provider either way; the next
            // sign-in proceeds without the profile fields.
            tracing::warn!(error = %e, uid = %identity.id, "Account created but profile write failed");
            return Err(AppError::Persistence(e.to_string()));
        }

        tracing::info!(uid = %identity.id, "Account registered");
        Ok(CurrentUser::from_identity(identity).with_profile(&profile))
    }

    async fn handle_sign_in(&self, email: String, password: String) -> Result<()> {
        let identity = self.provider.sign_in(&email, &password).await?;
        tracing::info!(uid = %identity.id, "Signed in");
        Ok(())
    }

    async fn handle_federated_sign_in(
        &self,
        provider: FederatedProvider,
    ) -> Result<CurrentUser> {
        let identity = self.provider.sign_in_federated(provider).await?;
        let path = paths::profile_doc(&identity.id);

        // The first federated sign-in stores a profile derived from the
        // provider's display name; later ones leave the document alone.
        let existing = self
            .store
            .get_document(&path)
            .await
            .map_err(|e| AppError::Fetch(e.to_string()))?;

        let profile = match existing {
            Some(doc) => match UserProfile::from_fields(doc.fields) {
                Ok(profile) => profile,
                Err(e) => {
                    tracing::warn!(error = %e, uid = %identity.id, "Stored profile does not decode");
                    UserProfile::from_display_name(&identity)
                }
            },
            None => {
                let profile = UserProfile::from_display_name(&identity);
                let doc = profile.to_fields().map_err(|e| {
                    AppError::Internal(anyhow::anyhow!("Failed to serialize profile: {}", e))
                })?;
                self.store
                    .set_document(&path, doc, false)
                    .await
                    .map_err(|e| AppError::Persistence(e.to_string()))?;
                tracing::info!(uid = %identity.id, "Stored first-run profile for federated account");
                profile
            }
        };

        Ok(CurrentUser::from_identity(identity).with_profile(&profile))
    }

    async fn handle_logout(&self) -> Result<()> {
        self.provider.sign_out().await?;
        tracing::info!("Signed out");
        Ok(())
    }

    async fn handle_session_change(&self, change: SessionChange) {
        let state = match change {
            SessionChange::SignedIn(identity) => {
                tracing::debug!(uid = %identity.id, "Session change: signed in");
                SessionState::Authenticated(self.merged_user(identity).await)
            }
            SessionChange::SignedOut => {
                tracing::debug!("Session change: signed out");
                SessionState::Unauthenticated
            }
        };
        self.publish.send_replace(state);
    }

    /// Merge the stored profile into the identity, degrading to the
    /// bare identity when the profile is missing or unreadable.
    async fn merged_user(&self, identity: Identity) -> CurrentUser {
        let path = paths::profile_doc(&identity.id);
        match self.store.get_document(&path).await {
            Ok(Some(doc)) => match UserProfile::from_fields(doc.fields) {
                Ok(profile) => CurrentUser::from_identity(identity).with_profile(&profile),
                Err(e) => {
                    tracing::warn!(error = %e, path = %path, "Stored profile does not decode");
                    CurrentUser::from_identity(identity)
                }
            },
            Ok(None) => CurrentUser::from_identity(identity),
            Err(e) => {
                tracing::warn!(error = %e, path = %path, "Failed to load profile");
                CurrentUser::from_identity(identity)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_accessors() {
        assert!(SessionState::Initializing.is_loading());
        assert!(!SessionState::Unauthenticated.is_loading());
        assert!(SessionState::Unauthenticated.user().is_none());

        let user = CurrentUser {
            id: "u1".to_string(),
            email: "a@example.com".to_string(),
            ..CurrentUser::default()
        };
        let state = SessionState::Authenticated(user);
        assert!(!state.is_loading());
        assert_eq!(state.user().map(|u| u.id.as_str()), Some("u1"));
    }

    #[test]
    fn test_default_state_is_initializing() {
        assert_eq!(SessionState::default(), SessionState::Initializing);
    }
}
