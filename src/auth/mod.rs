//! Authentication module for managing the user session and credentials.
//!
//! This module provides:
//! - `SessionManager`: Login/logout state machine and token visibility
//! - `CredentialStore`: Persistent storage for the token pair
//!
//! The token pair is persisted to disk and survives process restarts.

pub mod credentials;
pub mod session;

pub use credentials::CredentialStore;
pub use session::{SessionManager, SessionState, TokenPair};
