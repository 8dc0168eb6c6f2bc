// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Auth guard for navigation.
//!
//! Until the session resolves, every screen shows the loading
//! placeholder. Signed-out users can only reach the auth screen;
//! everything else redirects there.

use tokio::sync::watch;

use crate::routes::Route;
use crate::services::session::SessionState;

/// What the router should do with a navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session still resolving; show the loading placeholder.
    Loading,
    /// Send the user to the given route instead.
    Redirect(Route),
    /// Let the navigation through.
    Allow,
}

/// Decide a navigation from the session state alone.
pub fn evaluate(session: &SessionState, target: &Route) -> GuardDecision {
    match session {
        SessionState::Initializing => GuardDecision::Loading,
        SessionState::Unauthenticated => {
            if matches!(target, Route::Auth) {
                GuardDecision::Allow
            } else {
                GuardDecision::Redirect(Route::Auth)
            }
        }
        SessionState::Authenticated(_) => GuardDecision::Allow,
    }
}

/// Guard bound to a live session state channel.
#[derive(Clone)]
pub struct RouteGuard {
    session: watch::Receiver<SessionState>,
}

impl RouteGuard {
    pub fn new(session: watch::Receiver<SessionState>) -> Self {
        Self { session }
    }

    /// Decide against the current state; may answer `Loading`.
    pub fn check(&self, target: &Route) -> GuardDecision {
        evaluate(&self.session.borrow(), target)
    }

    /// Wait out Initializing, then decide.
    pub async fn resolve(&self, target: &Route) -> GuardDecision {
        let mut session = self.session.clone();
        let decision = match session.wait_for(|state| !state.is_loading()).await {
            Ok(state) => evaluate(&state, target),
            // Publisher gone; treat the session as signed out.
            Err(_) => evaluate(&SessionState::Unauthenticated, target),
        };
        decision
    }
}
