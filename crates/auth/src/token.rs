//! Token issuer/verifier (HS256).

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;

use crate::claims::{Claims, validate_claims};
use crate::principal::Principal;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("failed to sign token: {0}")]
    Encode(#[source] jsonwebtoken::errors::Error),

    #[error("invalid token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),

    #[error("token not yet valid (issued in the future)")]
    NotYetValid,
}

/// Creates and verifies signed claim bundles.
///
/// Tokens never expire; rotating the secret invalidates all of them.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtService {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Mint a token for the given principal.
    pub fn issue(&self, principal: &Principal, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = Claims::new(
            principal.user_id,
            principal.is_admin,
            principal.is_business,
            now,
        );
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(TokenError::Encode)
    }

    /// Verify the signature and decode the claims.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(TokenError::Invalid)?;
        validate_claims(&claims, now)?;
        Ok(claims)
    }
}

impl core::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("JwtService").finish_non_exhaustive()
    }
}
