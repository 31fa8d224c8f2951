use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::TokenConfig;

/// Lifetime of a magic-link token. Fixed; not configurable per request.
pub const TOKEN_TTL_MINUTES: i64 = 5;

/// Claims signed into a magic-link token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MagicLinkClaims {
    /// Address the link was sent to
    pub email: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp). Informational; tokens without it still verify.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
}

/// Signed compact token (`header.payload.signature`).
///
/// `Debug` is redacted so tokens never end up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct MagicToken(String);

impl MagicToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<String> for MagicToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Debug for MagicToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MagicToken(<redacted>)")
    }
}

/// Outcome of decoding a presented token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Valid(String),
    Rejected(Rejection),
}

/// Deliberately coarse: callers learn only "expired" or "invalid".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Signature checks out but the expiry has passed
    Expired,
    /// Bad signature, malformed token, or missing/mistyped claims
    Invalid,
}

/// HS256 codec for magic-link tokens. Holds the process-wide signing key.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(config: &TokenConfig) -> Self {
        Self::from_secret(config.secret_key.expose_secret().as_bytes())
    }

    pub fn from_secret(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against an explicit clock in `decode_at`, without leeway.
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Issue a token for `email` expiring `TOKEN_TTL_MINUTES` from now.
    pub fn issue(&self, email: &str) -> Result<MagicToken, anyhow::Error> {
        self.issue_at(email, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    ///
    /// Output is deterministic for a given email, key and timestamp.
    ///
    /// Claims carry whole seconds and `exp` is truncated, so a token issued
    /// at `t0` stops verifying at `floor(t0) + TTL`, up to one second before
    /// `t0 + TTL`. The lifetime never exceeds the TTL.
    pub fn issue_at(&self, email: &str, now: DateTime<Utc>) -> Result<MagicToken, anyhow::Error> {
        let exp = now + Duration::minutes(TOKEN_TTL_MINUTES);

        let claims = MagicLinkClaims {
            email: email.to_string(),
            exp: exp.timestamp(),
            iat: Some(now.timestamp()),
        };

        let header = Header::new(Algorithm::HS256);
        let token = encode(&header, &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to encode magic link token: {}", e))?;

        Ok(MagicToken(token))
    }

    /// Validate a presented token against the current time.
    pub fn decode(&self, token: &str) -> Result<Verification, anyhow::Error> {
        self.decode_at(token, Utc::now())
    }

    /// Validate a presented token as if the current time were `now`.
    ///
    /// The signature is checked before the expiry, so a forged token is
    /// always `Invalid` regardless of its claimed `exp`. `Err` is reserved
    /// for codec faults such as a misconfigured key.
    pub fn decode_at(&self, token: &str, now: DateTime<Utc>) -> Result<Verification, anyhow::Error> {
        let token_data =
            match decode::<MagicLinkClaims>(token, &self.decoding_key, &self.validation) {
                Ok(data) => data,
                Err(e) => {
                    return match e.kind() {
                        ErrorKind::InvalidEcdsaKey
                        | ErrorKind::InvalidRsaKey(_)
                        | ErrorKind::RsaFailedSigning
                        | ErrorKind::InvalidAlgorithmName
                        | ErrorKind::InvalidKeyFormat
                        | ErrorKind::MissingAlgorithm
                        | ErrorKind::Crypto(_) => Err(anyhow::anyhow!(
                            "Failed to decode magic link token: {}",
                            e
                        )),
                        _ => Ok(Verification::Rejected(Rejection::Invalid)),
                    };
                }
            };

        let claims = token_data.claims;
        if now.timestamp() >= claims.exp {
            return Ok(Verification::Rejected(Rejection::Expired));
        }

        Ok(Verification::Valid(claims.email))
    }
}
