//! services/api/src/adapters/identity.rs
//!
//! Verifies the session tokens issued by the external identity provider.
//! Implements the `IdentityVerifier` port from the `core` crate.

use async_trait::async_trait;
use documind_core::domain::Identity;
use documind_core::ports::{IdentityVerifier, PortError, PortResult};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::IdentityKey;

/// The claims DocuMind reads from a session token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    /// The provider's stable user id.
    pub sub: String,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// A verifier for provider-signed JWTs.
#[derive(Clone)]
pub struct JwtIdentityVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityVerifier {
    pub fn from_config(
        key: &IdentityKey,
        issuer: Option<&str>,
    ) -> Result<Self, jsonwebtoken::errors::Error> {
        let (key, algorithm) = match key {
            IdentityKey::RsaPem(pem) => (DecodingKey::from_rsa_pem(pem.as_bytes())?, Algorithm::RS256),
            IdentityKey::Secret(secret) => (DecodingKey::from_secret(secret.as_bytes()), Algorithm::HS256),
        };

        let mut validation = Validation::new(algorithm);
        validation.validate_aud = false;
        if let Some(issuer) = issuer {
            validation.set_issuer(&[issuer]);
        }

        Ok(Self { key, validation })
    }
}

#[async_trait]
impl IdentityVerifier for JwtIdentityVerifier {
    async fn verify(&self, token: &str) -> PortResult<Identity> {
        let data = decode::<SessionClaims>(token, &self.key, &self.validation).map_err(|e| {
            debug!(error = %e, "Rejected session token");
            PortError::Unauthorized
        })?;

        let claims = data.claims;
        if claims.sub.trim().is_empty() {
            return Err(PortError::Unauthorized);
        }
        Ok(Identity {
            user_id: claims.sub,
            email: claims.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "identity-test-secret";

    fn sign(claims: &SessionClaims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn verifier() -> JwtIdentityVerifier {
        JwtIdentityVerifier::from_config(&IdentityKey::Secret(SECRET.into()), None).unwrap()
    }

    fn claims(exp_offset: Duration) -> SessionClaims {
        SessionClaims {
            sub: "user_2abc".into(),
            exp: (Utc::now() + exp_offset).timestamp(),
            email: Some("ada@example.com".into()),
        }
    }

    #[tokio::test]
    async fn valid_token_yields_identity() {
        let token = sign(&claims(Duration::hours(1)), SECRET);
        let identity = verifier().verify(&token).await.unwrap();
        assert_eq!(identity.user_id, "user_2abc");
        assert_eq!(identity.email.as_deref(), Some("ada@example.com"));
    }

    #[tokio::test]
    async fn wrong_signature_is_rejected() {
        let token = sign(&claims(Duration::hours(1)), "someone-else");
        assert!(matches!(
            verifier().verify(&token).await,
            Err(PortError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let token = sign(&claims(-Duration::hours(2)), SECRET);
        assert!(matches!(
            verifier().verify(&token).await,
            Err(PortError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn issuer_is_enforced_when_configured() {
        let strict = JwtIdentityVerifier::from_config(
            &IdentityKey::Secret(SECRET.into()),
            Some("https://clerk.documind.app"),
        )
        .unwrap();
        let token = sign(&claims(Duration::hours(1)), SECRET);
        assert!(strict.verify(&token).await.is_err());
    }

    #[tokio::test]
    async fn garbage_is_rejected() {
        assert!(verifier().verify("not-a-jwt").await.is_err());
    }
}
