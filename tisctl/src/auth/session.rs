//! Access token creation and verification.
//!
//! Tokens are HS256 JWTs carrying `{user_id, role, iat, exp}`. There is no server-side
//! session store: expiry is the only way a token stops being valid.

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{auth::identity::Identity, auth::roles::Role, config::Config, errors::Error, types::UserId};

/// JWT session claims
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub user_id: UserId,
    pub role: Role,
    pub iat: i64, // Issued at
    pub exp: i64, // Expiration time
}

/// Signs and verifies access tokens with the single configured secret.
///
/// Built once at startup. Verification accepts only HS256 and allows no clock skew.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    validity: TimeDelta,
}

impl SessionKeys {
    pub fn new(secret: &[u8], validity: std::time::Duration) -> Result<Self, Error> {
        let validity = TimeDelta::from_std(validity).map_err(|e| Error::Internal {
            operation: format!("convert token validity: {e}"),
        })?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat"]);

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            validity,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let secret_key = config.secret_key.as_ref().ok_or_else(|| Error::Internal {
            operation: "JWT sessions: secret_key is required".to_string(),
        })?;

        Self::new(secret_key.as_bytes(), config.auth.security.jwt_expiry)
    }

    /// Validity window of issued tokens
    pub fn validity(&self) -> TimeDelta {
        self.validity
    }

    /// Issue a token for the given user, valid from now.
    pub fn issue(&self, user_id: UserId, role: Role) -> Result<String, Error> {
        self.issue_at(user_id, role, Utc::now())
    }

    /// Issue a token as if it had been created at `issued_at`.
    pub fn issue_at(&self, user_id: UserId, role: Role, issued_at: DateTime<Utc>) -> Result<String, Error> {
        let claims = SessionClaims {
            user_id,
            role,
            iat: issued_at.timestamp(),
            exp: (issued_at + self.validity).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|e| Error::Internal {
            operation: format!("create JWT: {e}"),
        })
    }

    /// Verify a token's signature, structure and expiry, returning the identity it asserts.
    pub fn verify(&self, token: &str) -> Result<Identity, Error> {
        use jsonwebtoken::errors::ErrorKind;

        let token_data = decode::<SessionClaims>(token, &self.decoding, &self.validation).map_err(|e| match e.kind() {
            // Client errors (401) - forged, malformed or expired tokens
            ErrorKind::InvalidToken
            | ErrorKind::InvalidSignature
            | ErrorKind::ExpiredSignature
            | ErrorKind::MissingRequiredClaim(_)
            | ErrorKind::InvalidIssuer
            | ErrorKind::InvalidAudience
            | ErrorKind::InvalidSubject
            | ErrorKind::ImmatureSignature
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_)
            | ErrorKind::InvalidAlgorithm => {
                tracing::debug!("Rejected access token: {e}");
                Error::InvalidCredential
            }

            // Server errors (500) - key issues, internal failures
            ErrorKind::InvalidEcdsaKey
            | ErrorKind::InvalidRsaKey(_)
            | ErrorKind::RsaFailedSigning
            | ErrorKind::InvalidAlgorithmName
            | ErrorKind::InvalidKeyFormat
            | ErrorKind::MissingAlgorithm
            | ErrorKind::Crypto(_) => Error::Internal {
                operation: format!("JWT verification: {e}"),
            },

            // Catch-all for any future error variants (default to server error for safety)
            _ => Error::Internal {
                operation: format!("JWT verification (unknown error): {e}"),
            },
        })?;

        Ok(Identity {
            user_id: token_data.claims.user_id,
            role: token_data.claims.role,
        })
    }
}
