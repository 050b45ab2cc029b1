//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AppConfig;
use crate::db::{AccountStore, PgAccountRepository};
use crate::identity::{GatePolicy, IdentityError, IdentityVerifier, JwtVerifier};
use crate::webhooks::WebhookVerifier;

/// Error building application state from configuration.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("identity: {0}")]
    Identity(#[from] IdentityError),
    #[error("webhook: {0}")]
    Webhook(#[from] crate::webhooks::WebhookError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. Tab sessions are not here:
/// they are provided per request by the session layer.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    accounts: Arc<dyn AccountStore>,
    webhooks: WebhookVerifier,
    identity: Arc<dyn IdentityVerifier>,
    gate: GatePolicy,
}

impl AppState {
    /// Assemble state from already-built parts.
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        webhooks: WebhookVerifier,
        identity: Arc<dyn IdentityVerifier>,
        gate: GatePolicy,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                accounts,
                webhooks,
                identity,
                gate,
            }),
        }
    }

    /// Build production state: `PostgreSQL` accounts and RS256 identity.
    ///
    /// # Errors
    ///
    /// Returns `StateError` if the identity key, a public route pattern or the
    /// webhook secret is invalid.
    pub fn from_config(config: &AppConfig, pool: PgPool) -> Result<Self, StateError> {
        let identity = JwtVerifier::from_rsa_pem(
            &config.identity.jwt_key,
            config.identity.authorized_parties.clone(),
        )?;

        Ok(Self::new(
            Arc::new(PgAccountRepository::new(pool)),
            WebhookVerifier::new(&config.webhook_secret)?,
            Arc::new(identity),
            GatePolicy::from_config(&config.identity)?,
        ))
    }

    #[must_use]
    pub fn accounts(&self) -> &dyn AccountStore {
        self.inner.accounts.as_ref()
    }

    #[must_use]
    pub fn webhooks(&self) -> &WebhookVerifier {
        &self.inner.webhooks
    }

    #[must_use]
    pub fn identity(&self) -> &dyn IdentityVerifier {
        self.inner.identity.as_ref()
    }

    #[must_use]
    pub fn gate(&self) -> &GatePolicy {
        &self.inner.gate
    }
}
