//! Identity-provider webhooks.
//!
//! Inbound events are delivered through Svix. Every request is verified
//! against the raw body before anything is parsed:
//!
//! 1. [`WebhookHeaders::from_headers`] pulls `svix-id`, `svix-timestamp` and
//!    `svix-signature`.
//! 2. [`WebhookVerifier::verify`] checks the HMAC and timestamp, returning a
//!    [`VerifiedPayload`].
//! 3. [`WebhookEvent::from_verified`] parses the payload into the closed set
//!    of events this server acts on.

pub mod event;
pub mod svix;

pub use event::{EmailAddress, UserCreated, WebhookEvent};
pub use svix::{VerifiedPayload, WebhookHeaders, WebhookVerifier};

use thiserror::Error;

/// Errors raised while authenticating or decoding a webhook delivery.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// A required `svix-*` header was absent or not valid UTF-8.
    #[error("missing header: {0}")]
    MissingHeader(&'static str),

    /// The signing secret is not a valid base64 `whsec_` secret.
    #[error("invalid signing secret: {0}")]
    InvalidSecret(String),

    /// `svix-timestamp` is not an integer.
    #[error("invalid timestamp header")]
    InvalidTimestamp,

    /// The delivery is older than the tolerance window.
    #[error("message timestamp too old")]
    TimestampTooOld,

    /// The delivery is dated further in the future than the tolerance window.
    #[error("message timestamp too new")]
    TimestampTooNew,

    /// No `v1` signature in `svix-signature` matched.
    #[error("no matching signature found")]
    SignatureMismatch,

    /// The verified body is not a JSON event envelope.
    #[error("invalid event payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}
