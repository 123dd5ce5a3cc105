//! Session state machine: login, logout, and token visibility.
//!
//! `SessionManager` is the single writer of the persisted token pair and
//! the single source of truth for whether the user is signed in. Every
//! state change is broadcast on a watch channel so protected views can
//! re-evaluate access.

use std::sync::{Arc, RwLock};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info};

use super::credentials::CredentialStore;

/// The access/refresh token pair. Immutable value: replaced wholesale on
/// login and refresh, never mutated in place. Absence means logged out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Derived session state. Not stored: `LoggedOut` when no token pair
/// exists, `LoggedIn` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    LoggedOut,
    LoggedIn,
}

struct SessionInner {
    store: CredentialStore,
    tokens: RwLock<Option<TokenPair>>,
    state_tx: watch::Sender<SessionState>,
}

/// Owns the credential store and the in-memory token pair.
///
/// Clone is cheap - the inner state is shared behind an `Arc`, so the
/// transport and the UI layer observe the same session. One instance per
/// process, constructed explicitly at startup.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionInner>,
}

impl SessionManager {
    /// Create the manager, adopting a persisted token pair if one exists.
    pub fn restore(store: CredentialStore) -> Result<Self> {
        let tokens = store
            .load()
            .context("Failed to restore persisted session")?;

        let state = match tokens {
            Some(_) => SessionState::LoggedIn,
            None => SessionState::LoggedOut,
        };
        match state {
            SessionState::LoggedIn => info!("Restored persisted session"),
            SessionState::LoggedOut => debug!("No persisted session found"),
        }

        let (state_tx, _) = watch::channel(state);
        Ok(Self {
            inner: Arc::new(SessionInner {
                store,
                tokens: RwLock::new(tokens),
                state_tx,
            }),
        })
    }

    /// Install a new token pair: persist it, swap it into memory, and
    /// notify watchers. The new access token is visible to the very next
    /// outbound call - there is no stale-token window.
    pub fn login(&self, pair: TokenPair) -> Result<()> {
        self.inner
            .store
            .save(&pair)
            .context("Failed to persist token pair")?;
        *self.inner.tokens.write().unwrap() = Some(pair);
        self.inner.state_tx.send_replace(SessionState::LoggedIn);
        info!("Session established");
        Ok(())
    }

    /// Drop the session: clear storage and memory, notify watchers.
    /// Requests parked on an in-flight refresh observe the cleared session
    /// and resolve to a session-expired error rather than being dropped.
    pub fn logout(&self) -> Result<()> {
        self.inner
            .store
            .clear()
            .context("Failed to clear persisted tokens")?;
        *self.inner.tokens.write().unwrap() = None;
        self.inner.state_tx.send_replace(SessionState::LoggedOut);
        info!("Logged out");
        Ok(())
    }

    pub fn current_tokens(&self) -> Option<TokenPair> {
        self.inner.tokens.read().unwrap().clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.inner
            .tokens
            .read()
            .unwrap()
            .as_ref()
            .map(|pair| pair.access_token.clone())
    }

    pub fn is_logged_in(&self) -> bool {
        self.inner.tokens.read().unwrap().is_some()
    }

    pub fn state(&self) -> SessionState {
        *self.inner.state_tx.borrow()
    }

    /// Watch session state changes. This is the gating signal for
    /// protected views: re-evaluate access whenever it fires.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state_tx.subscribe()
    }
}
