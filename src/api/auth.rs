//! Identity endpoint client.
//!
//! Exchanges a Google ID token for a backend token pair and installs it
//! in the session. The call is sent anonymously: the caller is logged out
//! and must not trip the transport's refresh machinery.

use serde_json::json;
use tracing::info;

use super::transport::{AuthenticatedTransport, RequestSpec};
use super::ApiError;
use crate::auth::TokenPair;

/// Google sign-in exchange endpoint
const GOOGLE_AUTH_PATH: &str = "/api/auth/google";

#[derive(Clone)]
pub struct AuthClient {
    transport: AuthenticatedTransport,
}

impl AuthClient {
    pub fn new(transport: AuthenticatedTransport) -> Self {
        Self { transport }
    }

    /// Exchange a Google ID token for a session.
    ///
    /// On success the returned pair is installed via the session manager,
    /// so the next authenticated call already carries the new token.
    pub async fn login_with_google(&self, id_token: &str) -> Result<(), ApiError> {
        let spec = RequestSpec::post(GOOGLE_AUTH_PATH).json(json!({ "id_token": id_token }));
        let response = self.transport.request_anonymous(spec).await?;

        if !response.status.is_success() {
            return Err(ApiError::from_status(response.status, &response.body));
        }

        let pair: TokenPair = response.json()?;
        self.transport.session().login(pair).map_err(|e| {
            ApiError::Unexpected(format!("Failed to persist session: {:#}", e))
        })?;
        info!("Signed in with Google");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use reqwest::StatusCode;

    use crate::api::transport::{HttpSend, RawResponse};
    use crate::auth::{CredentialStore, SessionManager};

    use super::*;

    struct Scripted {
        status: StatusCode,
        body: Vec<u8>,
    }

    #[async_trait]
    impl HttpSend for Scripted {
        async fn send(
            &self,
            _url: &str,
            _spec: &RequestSpec,
            bearer: Option<&str>,
        ) -> Result<RawResponse, ApiError> {
            // Identity calls carry no bearer header.
            assert_eq!(bearer, None);
            Ok(RawResponse {
                status: self.status,
                body: self.body.clone(),
            })
        }
    }

    fn client_with(
        dir: &std::path::Path,
        status: StatusCode,
        body: &[u8],
    ) -> (AuthClient, SessionManager) {
        let session =
            SessionManager::restore(CredentialStore::new(dir.to_path_buf())).expect("restore");
        let transport = AuthenticatedTransport::new(
            Arc::new(Scripted {
                status,
                body: body.to_vec(),
            }),
            session.clone(),
            "http://backend.test",
        );
        (AuthClient::new(transport), session)
    }

    #[tokio::test]
    async fn test_google_login_installs_token_pair() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (client, session) = client_with(
            dir.path(),
            StatusCode::OK,
            br#"{"access_token": "A", "refresh_token": "B"}"#,
        );

        client.login_with_google("google-id-token").await.expect("login");

        let pair = session.current_tokens().expect("logged in");
        assert_eq!(pair.access_token, "A");
        assert_eq!(pair.refresh_token, "B");
    }

    #[tokio::test]
    async fn test_google_login_surfaces_normalized_backend_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (client, session) = client_with(
            dir.path(),
            StatusCode::BAD_REQUEST,
            br#"{"detail": "invalid id token"}"#,
        );

        let err = client
            .login_with_google("expired-id-token")
            .await
            .expect_err("must fail");
        assert!(matches!(err, ApiError::Validation(ref m) if m == "invalid id token"));
        assert!(!session.is_logged_in());
    }

    #[tokio::test]
    async fn test_google_login_rejects_unexpected_wire_shape() {
        let dir = tempfile::tempdir().expect("tempdir");
        // camelCase is not the canonical contract; it must not half-install.
        let (client, session) = client_with(
            dir.path(),
            StatusCode::OK,
            br#"{"accessToken": "A", "refreshToken": "B"}"#,
        );

        let err = client
            .login_with_google("google-id-token")
            .await
            .expect_err("must fail");
        assert!(matches!(err, ApiError::Unexpected(_)));
        assert!(!session.is_logged_in());
    }
}
