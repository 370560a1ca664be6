use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::auth::claims::Claims;
use crate::config::JwtConfig;

/// Why a credential failed strict verification. `Expired` is reserved for a
/// correctly signed, structurally valid token that is merely past its expiry
/// claim; everything else collapses into `Invalid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("token invalid")]
    Invalid,
    #[error("token expired")]
    Expired,
}

/// Signs and verifies session credentials: HS256 JWTs carrying the owning
/// user id as subject, with a fixed TTL from issuance.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: TimeDuration,
}

impl TokenCodec {
    pub fn new(secret: &str, ttl_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: TimeDuration::minutes(ttl_minutes),
        }
    }

    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self::new(&cfg.secret, cfg.ttl_minutes)
    }

    pub fn issue(&self, user_id: Uuid) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + self.ttl;
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user_id, "credential issued");
        Ok(token)
    }

    /// Checks signature and, unless `ignore_expiry` is set, the expiry claim.
    /// Returns the raw subject claim on success.
    pub fn verify(&self, token: &str, ignore_expiry: bool) -> Result<String, VerifyError> {
        let mut validation = Validation::default();
        // No leeway: the expiry boundary is exact.
        validation.leeway = 0;
        validation.validate_exp = !ignore_expiry;
        match decode::<Claims>(token, &self.decoding, &validation) {
            Ok(data) => Ok(data.claims.sub),
            Err(e) => match e.kind() {
                ErrorKind::ExpiredSignature => Err(VerifyError::Expired),
                _ => Err(VerifyError::Invalid),
            },
        }
    }

    /// Best-effort subject extraction: expiry is ignored, and any decoding or
    /// parsing failure yields `None` instead of an error.
    pub fn extract_subject(&self, token: &str) -> Option<Uuid> {
        let sub = self.verify(token, true).ok()?;
        Uuid::parse_str(&sub).ok()
    }
}
