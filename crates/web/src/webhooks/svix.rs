//! Svix webhook signature verification.
//!
//! Signed content is `{svix-id}.{svix-timestamp}.{raw body}`, authenticated
//! with HMAC-SHA256 under the base64-decoded `whsec_` secret. The
//! `svix-signature` header holds one or more space-separated `v1,<base64>`
//! entries; any one of them may match (secret rotation sends several).

use std::fmt;
use std::sync::Arc;

use axum::http::HeaderMap;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretSlice, SecretString};
use sha2::Sha256;
use tracing::debug;

use super::WebhookError;

type HmacSha256 = Hmac<Sha256>;

const SECRET_PREFIX: &str = "whsec_";
const SIGNATURE_VERSION: &str = "v1";

/// Maximum clock difference accepted between sender and receiver.
pub const TOLERANCE_SECS: i64 = 5 * 60;

/// The three transport headers a Svix delivery carries.
#[derive(Debug, Clone, Copy)]
pub struct WebhookHeaders<'a> {
    pub id: &'a str,
    pub timestamp: &'a str,
    pub signature: &'a str,
}

impl<'a> WebhookHeaders<'a> {
    pub const ID: &'static str = "svix-id";
    pub const TIMESTAMP: &'static str = "svix-timestamp";
    pub const SIGNATURE: &'static str = "svix-signature";

    /// Extract the Svix headers from a request.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::MissingHeader` naming the first header that is
    /// absent or not visible ASCII.
    pub fn from_headers(headers: &'a HeaderMap) -> Result<Self, WebhookError> {
        let get = |name: &'static str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .filter(|v| !v.is_empty())
                .ok_or(WebhookError::MissingHeader(name))
        };

        Ok(Self {
            id: get(Self::ID)?,
            timestamp: get(Self::TIMESTAMP)?,
            signature: get(Self::SIGNATURE)?,
        })
    }
}

/// A request body whose signature has been checked.
///
/// Only [`WebhookVerifier::verify`] can produce one, so anything parsing a
/// `VerifiedPayload` is parsing authenticated bytes.
#[derive(Debug, Clone, Copy)]
pub struct VerifiedPayload<'a>(&'a [u8]);

impl<'a> VerifiedPayload<'a> {
    #[must_use]
    pub const fn as_bytes(&self) -> &'a [u8] {
        self.0
    }
}

/// Verifies (and, for local tooling, produces) Svix signatures.
#[derive(Clone)]
pub struct WebhookVerifier {
    key: Arc<SecretSlice<u8>>,
}

impl fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl WebhookVerifier {
    /// Build a verifier from a `whsec_<base64>` secret.
    ///
    /// The `whsec_` prefix is optional.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::InvalidSecret` if the secret is not base64 or
    /// decodes to nothing.
    pub fn new(secret: &SecretString) -> Result<Self, WebhookError> {
        let raw = secret.expose_secret().trim();
        let encoded = raw.strip_prefix(SECRET_PREFIX).unwrap_or(raw);

        let key = STANDARD
            .decode(encoded)
            .map_err(|e| WebhookError::InvalidSecret(e.to_string()))?;
        if key.is_empty() {
            return Err(WebhookError::InvalidSecret("secret is empty".to_string()));
        }

        Ok(Self {
            key: Arc::new(SecretSlice::from(key)),
        })
    }

    /// Verify a delivery against the current time.
    ///
    /// `payload` must be the body exactly as received; re-serialized JSON
    /// will not verify.
    ///
    /// # Errors
    ///
    /// Returns a `WebhookError` describing why the delivery was rejected.
    pub fn verify<'p>(
        &self,
        headers: &WebhookHeaders<'_>,
        payload: &'p [u8],
    ) -> Result<VerifiedPayload<'p>, WebhookError> {
        self.verify_at(headers, payload, chrono::Utc::now().timestamp())
    }

    /// Verify a delivery as of `now` (Unix seconds).
    ///
    /// # Errors
    ///
    /// See [`WebhookVerifier::verify`].
    pub fn verify_at<'p>(
        &self,
        headers: &WebhookHeaders<'_>,
        payload: &'p [u8],
        now: i64,
    ) -> Result<VerifiedPayload<'p>, WebhookError> {
        let timestamp: i64 = headers
            .timestamp
            .trim()
            .parse()
            .map_err(|_| WebhookError::InvalidTimestamp)?;

        if now.saturating_sub(timestamp) > TOLERANCE_SECS {
            return Err(WebhookError::TimestampTooOld);
        }
        if timestamp > now.saturating_add(TOLERANCE_SECS) {
            return Err(WebhookError::TimestampTooNew);
        }

        let mac = self.mac(headers.id, timestamp, payload)?;

        let matched = headers
            .signature
            .split_whitespace()
            .filter_map(|entry| entry.split_once(','))
            .filter(|(version, _)| *version == SIGNATURE_VERSION)
            .filter_map(|(_, signature)| STANDARD.decode(signature).ok())
            .any(|signature| mac.clone().verify_slice(&signature).is_ok());

        if !matched {
            return Err(WebhookError::SignatureMismatch);
        }

        debug!(svix_id = %headers.id, "Webhook signature verified");
        Ok(VerifiedPayload(payload))
    }

    /// Produce the `svix-signature` value for a payload.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::InvalidSecret` if the key cannot seed an HMAC.
    pub fn sign(&self, id: &str, timestamp: i64, payload: &[u8]) -> Result<String, WebhookError> {
        let mac = self.mac(id, timestamp, payload)?;
        Ok(format!(
            "{SIGNATURE_VERSION},{}",
            STANDARD.encode(mac.finalize().into_bytes())
        ))
    }

    fn mac(&self, id: &str, timestamp: i64, payload: &[u8]) -> Result<HmacSha256, WebhookError> {
        let mut mac = HmacSha256::new_from_slice(self.key.expose_secret())
            .map_err(|e| WebhookError::InvalidSecret(e.to_string()))?;
        mac.update(id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        Ok(mac)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    const SECRET: &str = "whsec_MfKQ9r8GKYqrTwjUPD8ILPZIo2LaLaSw";
    const NOW: i64 = 1_700_000_000;
    const BODY: &[u8] = br#"{"type":"user.created","data":{"id":"u1"}}"#;

    fn verifier(secret: &str) -> WebhookVerifier {
        WebhookVerifier::new(&SecretString::from(secret)).unwrap()
    }

    fn headers<'a>(timestamp: &'a str, signature: &'a str) -> WebhookHeaders<'a> {
        WebhookHeaders {
            id: "msg_1",
            timestamp,
            signature,
        }
    }

    #[test]
    fn test_valid_signature_verifies() {
        let v = verifier(SECRET);
        let sig = v.sign("msg_1", NOW, BODY).unwrap();
        let ts = NOW.to_string();

        let verified = v.verify_at(&headers(&ts, &sig), BODY, NOW).unwrap();
        assert_eq!(verified.as_bytes(), BODY);
    }

    #[test]
    fn test_tampered_body_rejected() {
        let v = verifier(SECRET);
        let sig = v.sign("msg_1", NOW, BODY).unwrap();
        let ts = NOW.to_string();
        let tampered = br#"{"type":"user.created","data":{"id":"u2"}}"#;

        let result = v.verify_at(&headers(&ts, &sig), tampered, NOW);
        assert!(matches!(result, Err(WebhookError::SignatureMismatch)));
    }

    #[test]
    fn test_reserialized_body_rejected() {
        let v = verifier(SECRET);
        let sig = v.sign("msg_1", NOW, BODY).unwrap();
        let ts = NOW.to_string();
        let value: serde_json::Value = serde_json::from_slice(BODY).unwrap();
        let reserialized = serde_json::to_vec_pretty(&value).unwrap();

        let result = v.verify_at(&headers(&ts, &sig), &reserialized, NOW);
        assert!(matches!(result, Err(WebhookError::SignatureMismatch)));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let sig = verifier("whsec_c2VjcmV0LW51bWJlci10d28tZm9yLXRlc3Rz")
            .sign("msg_1", NOW, BODY)
            .unwrap();
        let ts = NOW.to_string();

        let result = verifier(SECRET).verify_at(&headers(&ts, &sig), BODY, NOW);
        assert!(matches!(result, Err(WebhookError::SignatureMismatch)));
    }

    #[test]
    fn test_any_of_several_signatures_may_match() {
        let v = verifier(SECRET);
        let good = v.sign("msg_1", NOW, BODY).unwrap();
        let header = format!("v1,Zm9vYmFy v2,whatever {good}");
        let ts = NOW.to_string();

        assert!(v.verify_at(&headers(&ts, &header), BODY, NOW).is_ok());
    }

    #[test]
    fn test_unknown_version_ignored() {
        let v = verifier(SECRET);
        let good = v.sign("msg_1", NOW, BODY).unwrap();
        let v0 = good.replacen("v1,", "v0,", 1);
        let ts = NOW.to_string();

        let result = v.verify_at(&headers(&ts, &v0), BODY, NOW);
        assert!(matches!(result, Err(WebhookError::SignatureMismatch)));
    }

    #[test]
    fn test_old_timestamp_rejected() {
        let v = verifier(SECRET);
        let then = NOW - TOLERANCE_SECS - 1;
        let sig = v.sign("msg_1", then, BODY).unwrap();
        let ts = then.to_string();

        let result = v.verify_at(&headers(&ts, &sig), BODY, NOW);
        assert!(matches!(result, Err(WebhookError::TimestampTooOld)));
    }

    #[test]
    fn test_future_timestamp_rejected() {
        let v = verifier(SECRET);
        let then = NOW + TOLERANCE_SECS + 1;
        let sig = v.sign("msg_1", then, BODY).unwrap();
        let ts = then.to_string();

        let result = v.verify_at(&headers(&ts, &sig), BODY, NOW);
        assert!(matches!(result, Err(WebhookError::TimestampTooNew)));
    }

    #[test]
    fn test_timestamp_within_tolerance_accepted() {
        let v = verifier(SECRET);
        let then = NOW - TOLERANCE_SECS;
        let sig = v.sign("msg_1", then, BODY).unwrap();
        let ts = then.to_string();

        assert!(v.verify_at(&headers(&ts, &sig), BODY, NOW).is_ok());
    }

    #[test]
    fn test_non_numeric_timestamp_rejected() {
        let v = verifier(SECRET);
        let result = v.verify_at(&headers("yesterday", "v1,abc"), BODY, NOW);
        assert!(matches!(result, Err(WebhookError::InvalidTimestamp)));
    }

    #[test]
    fn test_secret_without_prefix_is_accepted() {
        let prefixed = verifier(SECRET);
        let bare = verifier(SECRET.trim_start_matches(SECRET_PREFIX));

        assert_eq!(
            prefixed.sign("msg_1", NOW, BODY).unwrap(),
            bare.sign("msg_1", NOW, BODY).unwrap()
        );
    }

    #[test]
    fn test_invalid_secret_rejected() {
        let result = WebhookVerifier::new(&SecretString::from("whsec_***"));
        assert!(matches!(result, Err(WebhookError::InvalidSecret(_))));

        let result = WebhookVerifier::new(&SecretString::from("whsec_"));
        assert!(matches!(result, Err(WebhookError::InvalidSecret(_))));
    }

    #[test]
    fn test_headers_missing_each() {
        let mut map = HeaderMap::new();
        assert!(matches!(
            WebhookHeaders::from_headers(&map),
            Err(WebhookError::MissingHeader("svix-id"))
        ));

        map.insert("svix-id", HeaderValue::from_static("msg_1"));
        assert!(matches!(
            WebhookHeaders::from_headers(&map),
            Err(WebhookError::MissingHeader("svix-timestamp"))
        ));

        map.insert("svix-timestamp", HeaderValue::from_static("1700000000"));
        assert!(matches!(
            WebhookHeaders::from_headers(&map),
            Err(WebhookError::MissingHeader("svix-signature"))
        ));

        map.insert("svix-signature", HeaderValue::from_static("v1,abc"));
        let parsed = WebhookHeaders::from_headers(&map).unwrap();
        assert_eq!(parsed.id, "msg_1");
        assert_eq!(parsed.timestamp, "1700000000");
    }

    #[test]
    fn test_debug_redacts_key() {
        let debug = format!("{:?}", verifier(SECRET));
        assert!(debug.contains("[REDACTED]"));
    }
}
