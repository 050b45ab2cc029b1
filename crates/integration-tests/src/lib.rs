//! Integration tests for AgentBI.
//!
//! Tests drive the full router (identity gate, session provider, handlers)
//! in-process with `tower::ServiceExt::oneshot`. Accounts go to a
//! [`MemoryAccountStore`] and identities come from [`StaticIdentity`], so no
//! database or identity provider is needed.
//!
//! The `PostgreSQL` repository tests in `tests/accounts_db.rs` are ignored by
//! default and need `DATABASE_URL` pointing at a disposable database.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p agentbi-integration-tests
//! DATABASE_URL=postgres://localhost/agentbi_test \
//!     cargo test -p agentbi-integration-tests -- --ignored
//! ```

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;

use agentbi_core::AccountId;
use agentbi_web::config::TabSessionConfig;
use agentbi_web::db::MemoryAccountStore;
use agentbi_web::identity::{
    GatePolicy, Identity, IdentityError, IdentityVerifier, PublicRoutes, SESSION_COOKIE,
};
use agentbi_web::session::SessionRegistry;
use agentbi_web::webhooks::{WebhookHeaders, WebhookVerifier};
use agentbi_web::{AppState, app};

/// Signing secret shared by the test server and the test signer.
pub const TEST_WEBHOOK_SECRET: &str = "whsec_MfKQ9r8GKYqrTwjUPD8ILPZIo2LaLaSw";

/// Where anonymous page requests are redirected.
pub const SIGN_IN_URL: &str = "/sign-in";

/// Token prefix [`StaticIdentity`] accepts; the rest is the user ID.
const TOKEN_PREFIX: &str = "test-token:";

/// Identity verifier that trusts `test-token:<user_id>` tokens.
#[derive(Debug, Default)]
pub struct StaticIdentity;

impl StaticIdentity {
    /// A session token for `user_id`.
    #[must_use]
    pub fn token_for(user_id: &str) -> String {
        format!("{TOKEN_PREFIX}{user_id}")
    }
}

impl IdentityVerifier for StaticIdentity {
    fn verify(&self, token: &str) -> Result<Identity, IdentityError> {
        token
            .strip_prefix(TOKEN_PREFIX)
            .filter(|id| !id.is_empty())
            .map(|id| Identity {
                user_id: AccountId::new(id),
                session_id: None,
            })
            .ok_or_else(|| IdentityError::InvalidToken("not a test token".to_string()))
    }
}

/// A response reduced to what tests assert on.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: Value,
}

/// A fully wired application over in-memory collaborators.
pub struct TestContext {
    pub app: Router,
    pub accounts: Arc<MemoryAccountStore>,
    pub signer: WebhookVerifier,
}

impl TestContext {
    /// Build the app with default public routes and an empty store.
    ///
    /// # Panics
    ///
    /// Panics if the test secret or route patterns are invalid.
    #[must_use]
    pub fn new() -> Self {
        Self::with_tab_sessions(TabSessionConfig::default())
    }

    /// Build the app with custom tab session settings.
    ///
    /// # Panics
    ///
    /// Panics if the test secret or route patterns are invalid.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn with_tab_sessions(tab_sessions: TabSessionConfig) -> Self {
        let accounts = Arc::new(MemoryAccountStore::new());
        let signer = WebhookVerifier::new(&SecretString::from(TEST_WEBHOOK_SECRET)).unwrap();
        let gate = GatePolicy::new(PublicRoutes::new(&[] as &[&str]).unwrap(), SIGN_IN_URL);

        let state = AppState::new(
            accounts.clone(),
            signer.clone(),
            Arc::new(StaticIdentity),
            gate,
        );
        let registry = SessionRegistry::new(tab_sessions);

        Self {
            app: app(state, registry),
            accounts,
            signer,
        }
    }

    /// Send a request through a fresh clone of the router.
    ///
    /// # Panics
    ///
    /// Panics if the router fails or the body cannot be read.
    #[allow(clippy::unwrap_used)]
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .map(|v| v.to_str().unwrap().to_owned());
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse {
            status,
            location,
            body,
        }
    }

    /// A webhook delivery signed with the test secret, dated now.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn signed_webhook(&self, msg_id: &str, body: &str) -> Request<Body> {
        let timestamp = chrono::Utc::now().timestamp();
        let signature = self.signer.sign(msg_id, timestamp, body.as_bytes()).unwrap();

        Request::builder()
            .method(Method::POST)
            .uri("/api/webhooks")
            .header(header::CONTENT_TYPE, "application/json")
            .header(WebhookHeaders::ID, msg_id)
            .header(WebhookHeaders::TIMESTAMP, timestamp.to_string())
            .header(WebhookHeaders::SIGNATURE, signature)
            .body(Body::from(body.to_owned()))
            .unwrap()
    }

    /// Open a tab for `user` and return its ID.
    ///
    /// # Panics
    ///
    /// Panics if the tab cannot be opened.
    #[allow(clippy::unwrap_used)]
    pub async fn open_tab(&self, user: &str) -> String {
        let response = self.send(as_user(user, Method::POST, "/api/tabs", None)).await;
        assert_eq!(response.status, StatusCode::CREATED);
        response.body["tab_id"].as_str().unwrap().to_owned()
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// A request carrying `user`'s session cookie and an optional JSON body.
///
/// # Panics
///
/// Panics if the request cannot be built.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn as_user(user: &str, method: Method, uri: &str, json: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri).header(
        header::COOKIE,
        format!("{SESSION_COOKIE}={}", StaticIdentity::token_for(user)),
    );

    match json {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// A file part for [`multipart_as_user`].
pub struct Part<'a> {
    pub file_name: &'a str,
    pub content_type: &'a str,
    pub content: &'a [u8],
}

const BOUNDARY: &str = "agentbi-test-boundary";

/// A multipart request carrying `user`'s session cookie.
///
/// # Panics
///
/// Panics if the request cannot be built.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn multipart_as_user(user: &str, uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                part.file_name, part.content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(part.content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            header::COOKIE,
            format!("{SESSION_COOKIE}={}", StaticIdentity::token_for(user)),
        )
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}
