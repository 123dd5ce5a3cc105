//! Core library for WheelDrop - session management, authenticated
//! transport, and the generation API client.
//!
//! The UI layer is a consumer of this crate, not part of it. The pieces
//! fit together as follows:
//!
//! - [`auth::CredentialStore`] persists the access/refresh token pair
//! - [`auth::SessionManager`] owns login/logout state and token visibility
//! - [`api::AuthenticatedTransport`] attaches the bearer token and runs the
//!   single-flight refresh-and-retry cycle on authorization failures
//! - [`api::GenerationClient`] drives the two-phase upload/process workflow
//! - [`api::AuthClient`] exchanges a Google ID token for a session
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use wheeldrop_core::api::{AuthenticatedTransport, GenerationClient, ReqwestSender};
//! use wheeldrop_core::auth::{CredentialStore, SessionManager};
//! use wheeldrop_core::config::Config;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::load()?;
//! let session = SessionManager::restore(CredentialStore::new(config.storage_dir()?))?;
//! let transport = AuthenticatedTransport::new(
//!     Arc::new(ReqwestSender::new()?),
//!     session,
//!     config.api_base_url.clone(),
//! );
//! let generations = GenerationClient::new(transport);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiError, AuthClient, AuthenticatedTransport, GenerationClient, ReqwestSender};
pub use auth::{CredentialStore, SessionManager, SessionState, TokenPair};
pub use config::Config;
pub use models::{GenerationJob, GenerationStatus, ImageAsset};
