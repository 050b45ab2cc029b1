//! Identity-provider event envelopes.
//!
//! Events arrive as `{"type": "...", "data": {...}}`. Only the kinds listed
//! in [`WebhookEvent`] are acted on; everything else is reported back as
//! unhandled rather than silently accepted.

use serde::Deserialize;

use agentbi_core::{AccountId, AccountRecord};

use super::{VerifiedPayload, WebhookError};

/// Event kind tag for newly created users.
pub const USER_CREATED: &str = "user.created";

/// A verified event, narrowed to the kinds this server understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    UserCreated(UserCreated),
    /// A well-formed event of a kind this server does not act on.
    Unhandled { kind: String },
}

/// Payload of a `user.created` event (subset).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserCreated {
    pub id: AccountId,
    #[serde(default)]
    pub email_addresses: Vec<EmailAddress>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EmailAddress {
    pub email_address: String,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: serde_json::Value,
}

impl WebhookEvent {
    /// Parse a verified payload.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::InvalidPayload` if the body is not an event
    /// envelope, or if a handled kind carries malformed data.
    pub fn from_verified(payload: VerifiedPayload<'_>) -> Result<Self, WebhookError> {
        let envelope: Envelope = serde_json::from_slice(payload.as_bytes())?;

        match envelope.kind.as_str() {
            USER_CREATED => Ok(Self::UserCreated(serde_json::from_value(envelope.data)?)),
            _ => Ok(Self::Unhandled {
                kind: envelope.kind,
            }),
        }
    }

    /// The event's `type` tag.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::UserCreated(_) => USER_CREATED,
            Self::Unhandled { kind } => kind,
        }
    }
}

impl UserCreated {
    /// The first listed email address, or `""` when none are listed.
    #[must_use]
    pub fn first_email(&self) -> &str {
        self.email_addresses
            .first()
            .map_or("", |e| e.email_address.as_str())
    }

    /// The account row this event provisions.
    #[must_use]
    pub fn to_record(&self) -> AccountRecord {
        AccountRecord::new(self.id.clone(), self.first_email())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;
    use crate::webhooks::{WebhookHeaders, WebhookVerifier};

    fn parse(body: &str) -> Result<WebhookEvent, WebhookError> {
        let verifier =
            WebhookVerifier::new(&SecretString::from("whsec_MfKQ9r8GKYqrTwjUPD8ILPZIo2LaLaSw"))
                .unwrap();
        let now = 1_700_000_000;
        let sig = verifier.sign("msg_1", now, body.as_bytes()).unwrap();
        let ts = now.to_string();
        let headers = WebhookHeaders {
            id: "msg_1",
            timestamp: &ts,
            signature: &sig,
        };
        let verified = verifier.verify_at(&headers, body.as_bytes(), now).unwrap();
        WebhookEvent::from_verified(verified)
    }

    #[test]
    fn test_user_created_takes_first_email() {
        let event = parse(
            r#"{"type":"user.created","data":{"id":"u1","email_addresses":[{"email_address":"a@x.com"},{"email_address":"b@x.com"}]}}"#,
        )
        .unwrap();

        let WebhookEvent::UserCreated(user) = event else {
            panic!("expected user.created");
        };
        assert_eq!(user.to_record(), AccountRecord::new("u1", "a@x.com"));
    }

    #[test]
    fn test_user_created_without_emails_has_empty_email() {
        let event =
            parse(r#"{"type":"user.created","data":{"id":"u2","email_addresses":[]}}"#).unwrap();

        let WebhookEvent::UserCreated(user) = event else {
            panic!("expected user.created");
        };
        assert_eq!(user.first_email(), "");
        assert_eq!(user.to_record().email, "");
    }

    #[test]
    fn test_other_kinds_are_unhandled() {
        let event = parse(r#"{"type":"user.deleted","data":{"id":"u1"}}"#).unwrap();
        assert_eq!(
            event,
            WebhookEvent::Unhandled {
                kind: "user.deleted".to_string()
            }
        );
        assert_eq!(event.kind(), "user.deleted");
    }

    #[test]
    fn test_user_created_without_id_is_invalid() {
        let result = parse(r#"{"type":"user.created","data":{"email_addresses":[]}}"#);
        assert!(matches!(result, Err(WebhookError::InvalidPayload(_))));
    }

    #[test]
    fn test_non_json_is_invalid() {
        let result = parse("not json");
        assert!(matches!(result, Err(WebhookError::InvalidPayload(_))));
    }
}
