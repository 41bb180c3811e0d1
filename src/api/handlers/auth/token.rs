//! Stateless session tokens: HS256 JWTs carrying `{userId, iat, exp}`.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("failed to sign session token")]
    Sign(#[source] jsonwebtoken::errors::Error),
    #[error("invalid session token")]
    Invalid(#[source] jsonwebtoken::errors::Error),
    #[error("system clock is before the unix epoch")]
    Clock,
}

impl TokenError {
    /// True when the token was well formed and correctly signed but has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        matches!(
            self,
            Self::Invalid(err)
                if matches!(err.kind(), jsonwebtoken::errors::ErrorKind::ExpiredSignature)
        )
    }
}

pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_seconds: i64,
}

impl TokenSigner {
    #[must_use]
    pub fn new(secret: &SecretString, ttl_seconds: i64) -> Self {
        let secret = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
            ttl_seconds,
        }
    }

    #[cfg(test)]
    pub(crate) fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    /// Sign a token for `user_id` that expires one TTL from now.
    ///
    /// # Errors
    /// Returns an error if the clock is unusable or signing fails.
    pub fn issue(&self, user_id: Uuid) -> Result<String, TokenError> {
        self.issue_at(user_id, now_unix_seconds()?)
    }

    pub(crate) fn issue_at(&self, user_id: Uuid, issued_at: i64) -> Result<String, TokenError> {
        let claims = SessionClaims {
            user_id,
            iat: issued_at,
            exp: issued_at.saturating_add(self.ttl_seconds),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(TokenError::Sign)
    }

    /// Check signature and expiry, returning the claims.
    ///
    /// # Errors
    /// Returns [`TokenError::Invalid`] for a bad signature, malformed token or elapsed expiry.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        decode::<SessionClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(TokenError::Invalid)
    }
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("key", &"***")
            .field("ttl_seconds", &self.ttl_seconds)
            .finish()
    }
}

fn now_unix_seconds() -> Result<i64, TokenError> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|_| TokenError::Clock)?;
    i64::try_from(elapsed.as_secs()).map_err(|_| TokenError::Clock)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: i64 = 7 * 24 * 60 * 60;

    fn signer(secret: &str) -> TokenSigner {
        TokenSigner::new(&SecretString::from(secret.to_string()), TTL)
    }

    #[test]
    fn issued_token_round_trips_claims() -> anyhow::Result<()> {
        let signer = signer("0123456789abcdef0123456789abcdef");
        let user_id = Uuid::new_v4();
        let token = signer.issue(user_id)?;
        let claims = signer.verify(&token)?;
        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.exp - claims.iat, TTL);
        Ok(())
    }

    #[test]
    fn payload_uses_user_id_claim_name() -> anyhow::Result<()> {
        let claims = SessionClaims {
            user_id: Uuid::nil(),
            iat: 1,
            exp: 2,
        };
        let value = serde_json::to_value(&claims)?;
        assert!(value.get("userId").is_some());
        assert!(value.get("user_id").is_none());
        Ok(())
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() -> anyhow::Result<()> {
        let token = signer("0123456789abcdef0123456789abcdef").issue(Uuid::new_v4())?;
        let result = signer("fedcba9876543210fedcba9876543210").verify(&token);
        assert!(matches!(result, Err(TokenError::Invalid(_))));
        Ok(())
    }

    #[test]
    fn expired_token_is_rejected() -> anyhow::Result<()> {
        let signer = signer("0123456789abcdef0123456789abcdef");
        let issued_at = now_unix_seconds()? - TTL - 3600;
        let token = signer.issue_at(Uuid::new_v4(), issued_at)?;
        let result = signer.verify(&token);
        assert!(result.as_ref().is_err_and(TokenError::is_expired));
        Ok(())
    }

    #[test]
    fn garbage_is_rejected() {
        let signer = signer("0123456789abcdef0123456789abcdef");
        for token in ["", "not-a-token", "a.b.c", "forged-cookie-value"] {
            let result = signer.verify(token);
            assert!(matches!(result, Err(TokenError::Invalid(_))), "{token}");
        }
    }

    #[test]
    fn debug_redacts_key() {
        let debug = format!("{:?}", signer("0123456789abcdef0123456789abcdef"));
        assert!(!debug.contains("0123456789abcdef"));
    }
}
