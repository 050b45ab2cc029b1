//! Identity verification for the request gate.
//!
//! The identity provider issues a short-lived session token (a JWT) that the
//! browser presents either as the `__session` cookie or as an
//! `Authorization: Bearer` header. This module verifies that token and
//! decides which paths need one at all; the gate itself lives in
//! [`crate::middleware::auth`].

pub mod jwt;
pub mod policy;

pub use jwt::JwtVerifier;
pub use policy::{GatePolicy, PublicRoutes};

use axum::http::{HeaderMap, header};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use agentbi_core::{AccountId, IdentitySessionId};

/// Cookie the identity provider stores the session token in.
pub const SESSION_COOKIE: &str = "__session";

/// A verified caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Identity-provider user ID (`sub` claim).
    pub user_id: AccountId,
    /// Identity-provider session ID (`sid` claim), when present.
    pub session_id: Option<IdentitySessionId>,
}

/// Reasons a session credential was not accepted.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("invalid verification key: {0}")]
    InvalidKey(String),

    #[error("session token expired")]
    Expired,

    #[error("session token not yet valid")]
    NotYetValid,

    #[error("unauthorized party: {0}")]
    UnauthorizedParty(String),

    #[error("invalid session token: {0}")]
    InvalidToken(String),
}

/// Verifies a session credential and resolves it to an [`Identity`].
pub trait IdentityVerifier: Send + Sync {
    /// Verify a raw session token.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError` when the token is not acceptable.
    fn verify(&self, token: &str) -> Result<Identity, IdentityError>;
}

/// Find the session token on a request.
///
/// A bearer token wins over the cookie, matching how API clients and the
/// browser each present credentials.
#[must_use]
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    bearer_token(headers).or_else(|| session_cookie(headers))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn session_cookie(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
        .filter(|v| !v.is_empty())
}
