//! Sign a webhook payload for local testing.
//!
//! # Usage
//!
//! ```bash
//! agentbi-cli sign-webhook --id msg_local_1 --file user_created.json
//! ```
//!
//! Prints the three `svix-*` headers for the payload, signed with
//! `WEBHOOK_SECRET`, ready to paste into `curl -H`.

use std::path::Path;

use secrecy::SecretString;

use agentbi_web::webhooks::{WebhookError, WebhookHeaders, WebhookVerifier};

/// Errors from signing a payload.
#[derive(Debug, thiserror::Error)]
pub enum SignError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Failed to read payload: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Webhook(#[from] WebhookError),
}

/// Header lines for `payload`, signed as message `id` at `timestamp`.
///
/// # Errors
///
/// Returns `WebhookError` if the secret is not a valid `whsec_` secret.
pub fn header_lines(
    secret: &SecretString,
    id: &str,
    timestamp: i64,
    payload: &[u8],
) -> Result<Vec<String>, WebhookError> {
    let verifier = WebhookVerifier::new(secret)?;
    let signature = verifier.sign(id, timestamp, payload)?;

    Ok(vec![
        format!("{}: {id}", WebhookHeaders::ID),
        format!("{}: {timestamp}", WebhookHeaders::TIMESTAMP),
        format!("{}: {signature}", WebhookHeaders::SIGNATURE),
    ])
}

/// Sign the payload in `file` and print its headers.
///
/// # Errors
///
/// Returns `SignError` if the secret is unset or invalid, or the file cannot
/// be read.
pub fn run(id: &str, file: &Path, timestamp: Option<i64>) -> Result<(), SignError> {
    let _ = dotenvy::dotenv();

    let secret = std::env::var("WEBHOOK_SECRET")
        .map(SecretString::from)
        .map_err(|_| SignError::MissingEnvVar("WEBHOOK_SECRET"))?;
    let payload = std::fs::read(file)?;
    let timestamp = timestamp.unwrap_or_else(|| chrono::Utc::now().timestamp());

    #[allow(clippy::print_stdout)]
    for line in header_lines(&secret, id, timestamp, &payload)? {
        println!("{line}");
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_MfKQ9r8GKYqrTwjUPD8ILPZIo2LaLaSw";

    #[test]
    fn test_signed_headers_verify() {
        let secret = SecretString::from(SECRET);
        let payload = br#"{"type":"user.created","data":{"id":"u1"}}"#;
        let lines = header_lines(&secret, "msg_1", 1_700_000_000, payload).unwrap();

        assert_eq!(lines[0], "svix-id: msg_1");
        assert_eq!(lines[1], "svix-timestamp: 1700000000");
        let signature = lines[2].strip_prefix("svix-signature: ").unwrap();
        assert!(signature.starts_with("v1,"));

        let headers = WebhookHeaders {
            id: "msg_1",
            timestamp: "1700000000",
            signature,
        };
        let verifier = WebhookVerifier::new(&secret).unwrap();
        assert!(verifier.verify_at(&headers, payload, 1_700_000_000).is_ok());
    }

    #[test]
    fn test_invalid_secret() {
        let secret = SecretString::from("not-a-whsec-secret!!");
        assert!(header_lines(&secret, "msg_1", 0, b"{}").is_err());
    }
}
