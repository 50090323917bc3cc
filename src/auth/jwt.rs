use std::sync::Arc;

use base64ct::{Base64UrlUnpadded, Encoding};
use jsonwebtoken::{
    decode, decode_header, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header,
    Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::config::{JwtConfig, MAX_TTL_MINUTES};
use crate::store::UserId;

const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;
const HMAC_FAMILY: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// JWT payload issued at login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub authorized: bool,
    pub email: String,
    #[serde(rename = "userId")]
    pub user_id: UserId,
    pub exp: i64, // expires at (unix timestamp)
}

/// Claims as read back from a token. Kept as a raw map so that an absent
/// key and a present-but-wrong value (`null` included) stay distinct.
type RawClaims = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("unexpected signing method")]
    UnexpectedSigningMethod,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("missing claim `{0}`")]
    MissingClaim(&'static str),
    #[error("invalid claim `{0}`")]
    InvalidClaim(&'static str),
    #[error("token expiry out of range")]
    ExpiryOutOfRange,
    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName
            | ErrorKind::InvalidKeyFormat
            | ErrorKind::MissingAlgorithm => Self::UnexpectedSigningMethod,
            ErrorKind::ExpiredSignature => Self::Expired,
            _ => Self::Malformed,
        }
    }
}

/// Issues and validates HMAC-signed identity tokens with a fixed lifetime.
#[derive(Clone)]
pub struct TokenService {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
    ttl: Duration,
}

impl TokenService {
    /// The lifetime is clamped to `1..=MAX_TTL_MINUTES`; `AppConfig` rejects
    /// values outside that range before they get here.
    pub fn new(cfg: &JwtConfig) -> Self {
        let ttl_minutes = cfg.ttl_minutes.clamp(1, MAX_TTL_MINUTES);
        Self {
            encoding: Arc::new(EncodingKey::from_secret(cfg.secret.as_bytes())),
            decoding: Arc::new(DecodingKey::from_secret(cfg.secret.as_bytes())),
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    pub fn issue(&self, user_id: UserId, email: &str) -> Result<String, TokenError> {
        self.issue_at(user_id, email, OffsetDateTime::now_utc())
    }

    pub fn issue_at(
        &self,
        user_id: UserId,
        email: &str,
        now: OffsetDateTime,
    ) -> Result<String, TokenError> {
        let exp = now
            .checked_add(self.ttl)
            .ok_or(TokenError::ExpiryOutOfRange)?;
        let claims = Claims {
            authorized: true,
            email: email.to_string(),
            user_id,
            exp: exp.unix_timestamp(),
        };
        let token = encode(&Header::new(SIGNING_ALGORITHM), &claims, &self.encoding)
            .map_err(TokenError::Signing)?;
        debug!(user_id = %user_id, exp = claims.exp, "jwt signed");
        Ok(token)
    }

    pub fn validate(&self, token: &str) -> Result<UserId, TokenError> {
        self.validate_at(token, OffsetDateTime::now_utc())
    }

    /// Verify `token` as of `now`. The signature is checked before any claim.
    pub fn validate_at(&self, token: &str, now: OffsetDateTime) -> Result<UserId, TokenError> {
        let header = decode_header(token).map_err(|_| classify_bad_header(token))?;
        if !HMAC_FAMILY.contains(&header.alg) {
            return Err(TokenError::UnexpectedSigningMethod);
        }

        let data = decode::<RawClaims>(token, &self.decoding, &Self::validation())?;
        let claims = data.claims;

        let exp = claims.get("exp").ok_or(TokenError::MissingClaim("exp"))?;
        let exp = exp.as_i64().ok_or(TokenError::InvalidClaim("exp"))?;
        if now.unix_timestamp() >= exp {
            return Err(TokenError::Expired);
        }

        let raw_id = claims
            .get("userId")
            .ok_or(TokenError::MissingClaim("userId"))?;
        let user_id = parse_user_id(raw_id).ok_or(TokenError::InvalidClaim("userId"))?;
        debug!(user_id = %user_id, "jwt verified");
        Ok(user_id)
    }

    /// Signature and algorithm checks only; expiry and claims are checked
    /// against an explicit clock in `validate_at`.
    fn validation() -> Validation {
        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.algorithms = HMAC_FAMILY.to_vec();
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation
    }
}

/// A header that names an algorithm jsonwebtoken cannot parse (`none`,
/// vendor names) is an algorithm problem, not a malformed token.
fn classify_bad_header(token: &str) -> TokenError {
    let Some(segment) = token.split('.').next() else {
        return TokenError::Malformed;
    };
    let Ok(bytes) = Base64UrlUnpadded::decode_vec(segment) else {
        return TokenError::Malformed;
    };
    match serde_json::from_slice::<serde_json::Value>(&bytes) {
        Ok(header) if header.get("alg").is_some_and(|a| a.is_string()) => {
            TokenError::UnexpectedSigningMethod
        }
        _ => TokenError::Malformed,
    }
}

/// Integers are taken as is; floats are truncated toward zero.
fn parse_user_id(value: &serde_json::Value) -> Option<UserId> {
    let n = value.as_number()?;
    let id = match n.as_i64() {
        Some(i) => i,
        None => {
            let f = n.as_f64()?;
            if !f.is_finite() || f < 1.0 || f >= i64::MAX as f64 {
                return None;
            }
            f.trunc() as i64
        }
    };
    (id > 0).then_some(UserId(id))
}
