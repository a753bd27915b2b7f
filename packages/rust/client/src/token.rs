//! Short-lived admin tokens derived from the composite admin key.
//!
//! A token is an HS256 JWT: base64url(header) `.` base64url(claims) `.`
//! base64url(signature), where the signature is HMAC-SHA256 over the first
//! two segments keyed with the hex-decoded secret. Encoding is deterministic:
//! the same key and timestamp always produce the same bytes.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ghostwriter_shared::AuthError;

use crate::signing::{hex_decode, hmac_sha256};

/// Audience the Admin API expects.
pub const TOKEN_AUDIENCE: &str = "/admin/";

/// Token lifetime in seconds.
pub const TOKEN_LIFETIME_SECS: i64 = 300;

const SIGNING_ALGORITHM: &str = "HS256";

// ---------------------------------------------------------------------------
// AdminKey
// ---------------------------------------------------------------------------

/// Parsed `<keyId>:<hexSecret>` admin key.
pub struct AdminKey {
    pub key_id: String,
    pub secret: Vec<u8>,
}

impl AdminKey {
    /// Split on the first `:` and hex-decode the secret half.
    pub fn parse(raw: &str) -> Result<Self, AuthError> {
        let (key_id, secret) = raw.split_once(':').ok_or(AuthError::BadFormat)?;
        let secret = hex_decode(secret).map_err(AuthError::BadSecret)?;
        Ok(Self {
            key_id: key_id.to_string(),
            secret,
        })
    }
}

impl std::fmt::Debug for AdminKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminKey")
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Token
// ---------------------------------------------------------------------------

/// JOSE header. Field order is fixed by declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHeader {
    pub alg: String,
    pub kid: String,
    pub typ: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub iat: i64,
    pub exp: i64,
    pub aud: String,
}

/// A signed admin token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminToken {
    pub header: TokenHeader,
    pub claims: TokenClaims,
    pub signature: Vec<u8>,
}

impl AdminToken {
    /// Compact `header.claims.signature` form placed in the `Authorization` header.
    pub fn encode(&self) -> String {
        let signing_input = signing_input(&self.header, &self.claims);
        format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(&self.signature))
    }
}

/// Issue a fresh token for `admin_key`, valid from `now` for five minutes.
pub fn issue_token(admin_key: &str, now: DateTime<Utc>) -> Result<AdminToken, AuthError> {
    let key = AdminKey::parse(admin_key)?;

    let header = TokenHeader {
        alg: SIGNING_ALGORITHM.to_string(),
        kid: key.key_id,
        typ: "JWT".to_string(),
    };
    let iat = now.timestamp();
    let claims = TokenClaims {
        iat,
        exp: iat + TOKEN_LIFETIME_SECS,
        aud: TOKEN_AUDIENCE.to_string(),
    };

    let signature = hmac_sha256(&key.secret, signing_input(&header, &claims).as_bytes());

    Ok(AdminToken {
        header,
        claims,
        signature,
    })
}

fn signing_input(header: &TokenHeader, claims: &TokenClaims) -> String {
    format!("{}.{}", encode_segment(header), encode_segment(claims))
}

fn encode_segment<T: Serialize>(value: &T) -> String {
    // Plain structs of strings and integers always serialize.
    let json = serde_json::to_vec(value).expect("token segment serializes");
    URL_SAFE_NO_PAD.encode(json)
}
