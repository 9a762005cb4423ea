use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use bizcard_core::UserId;

use crate::token::TokenError;

/// Tolerated clock skew between issuer and verifier.
const ISSUED_AT_LEEWAY_SECS: i64 = 60;

/// Canonical claim bundle embedded in every token.
///
/// Always carries the identity and *all* role flags. Flags reflect the user
/// record at issue time; checks that must see the current business status
/// read the stored record instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id.
    #[serde(rename = "_id")]
    pub sub: UserId,

    #[serde(rename = "isAdmin")]
    pub is_admin: bool,

    #[serde(rename = "isBusiness")]
    pub is_business: bool,

    /// Issued-at, unix seconds.
    pub iat: i64,
}

impl Claims {
    pub fn new(sub: UserId, is_admin: bool, is_business: bool, issued_at: DateTime<Utc>) -> Self {
        Self {
            sub,
            is_admin,
            is_business,
            iat: issued_at.timestamp(),
        }
    }
}

/// Deterministically validate decoded claims.
///
/// Tokens carry no expiry; the only time rule is that a token cannot be
/// issued in the future. Signature verification happens in [`crate::JwtService`].
pub fn validate_claims(claims: &Claims, now: DateTime<Utc>) -> Result<(), TokenError> {
    let latest = now + Duration::seconds(ISSUED_AT_LEEWAY_SECS);
    if claims.iat > latest.timestamp() {
        return Err(TokenError::NotYetValid);
    }
    Ok(())
}
