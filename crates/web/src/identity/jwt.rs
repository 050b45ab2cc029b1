//! RS256 session-token verification with a static PEM key.
//!
//! The identity provider publishes the public half of its signing key; with
//! it configured, tokens verify locally with no network call per request.

use std::fmt;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;
use tracing::debug;

use agentbi_core::{AccountId, IdentitySessionId};

use super::{Identity, IdentityError, IdentityVerifier};

/// Allowed clock drift between the identity provider and this server.
const CLOCK_SKEW_LEEWAY_SECS: u64 = 5;

/// Claims read from an identity session token.
#[derive(Debug, Deserialize)]
struct SessionClaims {
    sub: String,
    #[serde(default)]
    sid: Option<String>,
    #[serde(default)]
    azp: Option<String>,
}

/// Verifies RS256 session tokens against a fixed public key.
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
    authorized_parties: Vec<String>,
}

impl fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtVerifier")
            .field("algorithms", &self.validation.algorithms)
            .field("authorized_parties", &self.authorized_parties)
            .finish_non_exhaustive()
    }
}

impl JwtVerifier {
    /// Create a verifier from a PEM-encoded RSA public key.
    ///
    /// `authorized_parties` restricts the `azp` claim; leave it empty to
    /// accept tokens minted for any origin.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::InvalidKey` if the PEM cannot be parsed.
    pub fn from_rsa_pem(pem: &str, authorized_parties: Vec<String>) -> Result<Self, IdentityError> {
        let key = DecodingKey::from_rsa_pem(pem.as_bytes())
            .map_err(|e| IdentityError::InvalidKey(e.to_string()))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        // Session tokens carry no audience; `azp` is checked instead
        validation.validate_aud = false;
        validation.leeway = CLOCK_SKEW_LEEWAY_SECS;

        Ok(Self {
            key,
            validation,
            authorized_parties,
        })
    }
}

impl IdentityVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> Result<Identity, IdentityError> {
        let data = decode::<SessionClaims>(token, &self.key, &self.validation).map_err(|e| {
            debug!("Session token rejected: {e}");
            match e.kind() {
                ErrorKind::ExpiredSignature => IdentityError::Expired,
                ErrorKind::ImmatureSignature => IdentityError::NotYetValid,
                _ => IdentityError::InvalidToken(e.to_string()),
            }
        })?;
        let claims = data.claims;

        if let Some(azp) = &claims.azp
            && !self.authorized_parties.is_empty()
            && !self.authorized_parties.iter().any(|p| p == azp)
        {
            return Err(IdentityError::UnauthorizedParty(azp.clone()));
        }

        Ok(Identity {
            user_id: AccountId::new(claims.sub),
            session_id: claims.sid.map(IdentitySessionId::new),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::json;

    use super::*;

    const PRIVATE_KEY: &str = include_str!("../../testdata/identity_private.pem");
    const PUBLIC_KEY: &str = include_str!("../../testdata/identity_public.pem");

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }

    fn mint(claims: &serde_json::Value) -> String {
        let key = EncodingKey::from_rsa_pem(PRIVATE_KEY.as_bytes()).unwrap();
        encode(&Header::new(Algorithm::RS256), claims, &key).unwrap()
    }

    fn verifier(parties: &[&str]) -> JwtVerifier {
        JwtVerifier::from_rsa_pem(
            PUBLIC_KEY,
            parties.iter().map(ToString::to_string).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_valid_token() {
        let token = mint(&json!({
            "sub": "user_1",
            "sid": "sess_1",
            "exp": now() + 60,
            "nbf": now() - 10,
        }));

        let identity = verifier(&[]).verify(&token).unwrap();
        assert_eq!(identity.user_id, AccountId::new("user_1"));
        assert_eq!(identity.session_id, Some(IdentitySessionId::new("sess_1")));
    }

    #[test]
    fn test_expired_token() {
        let token = mint(&json!({"sub": "user_1", "exp": now() - 120}));
        assert!(matches!(
            verifier(&[]).verify(&token),
            Err(IdentityError::Expired)
        ));
    }

    #[test]
    fn test_immature_token() {
        let token = mint(&json!({"sub": "user_1", "exp": now() + 600, "nbf": now() + 300}));
        assert!(matches!(
            verifier(&[]).verify(&token),
            Err(IdentityError::NotYetValid)
        ));
    }

    #[test]
    fn test_missing_subject() {
        let token = mint(&json!({"exp": now() + 60}));
        assert!(matches!(
            verifier(&[]).verify(&token),
            Err(IdentityError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_garbage_token() {
        assert!(matches!(
            verifier(&[]).verify("not-a-jwt"),
            Err(IdentityError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_hs256_token_rejected() {
        let token = encode(
            &Header::new(Algorithm::HS256),
            &json!({"sub": "user_1", "exp": now() + 60}),
            &EncodingKey::from_secret(b"shared"),
        )
        .unwrap();
        assert!(verifier(&[]).verify(&token).is_err());
    }

    #[test]
    fn test_authorized_parties() {
        let token = mint(&json!({
            "sub": "user_1",
            "azp": "https://evil.example.net",
            "exp": now() + 60,
        }));

        assert!(matches!(
            verifier(&["https://app.agentbi.dev"]).verify(&token),
            Err(IdentityError::UnauthorizedParty(_))
        ));
        assert!(verifier(&[]).verify(&token).is_ok());

        let good = mint(&json!({
            "sub": "user_1",
            "azp": "https://app.agentbi.dev",
            "exp": now() + 60,
        }));
        assert!(verifier(&["https://app.agentbi.dev"]).verify(&good).is_ok());
    }

    #[test]
    fn test_invalid_pem() {
        assert!(matches!(
            JwtVerifier::from_rsa_pem("-----BEGIN PUBLIC KEY-----", Vec::new()),
            Err(IdentityError::InvalidKey(_))
        ));
    }
}
