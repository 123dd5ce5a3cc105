//! Backend API module.
//!
//! All outbound calls flow through `AuthenticatedTransport`, which owns
//! bearer-token attachment and the single-flight refresh-and-retry policy.
//! `GenerationClient` and `AuthClient` are thin, typed endpoint wrappers
//! on top of it; `ApiError` is the one error taxonomy they all surface.

pub mod auth;
pub mod error;
pub mod generations;
pub mod transport;

pub use auth::AuthClient;
pub use error::ApiError;
pub use generations::GenerationClient;
pub use transport::{
    AuthenticatedTransport, HttpSend, MultipartPart, RawResponse, RequestBody, RequestSpec,
    ReqwestSender,
};
