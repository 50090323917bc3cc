use std::sync::Arc;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use thiserror::Error;
use tracing::error;

use crate::config::PasswordConfig;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("invalid argon2 parameters: {0}")]
    Params(String),
    #[error("argon2 hash error: {0}")]
    Hash(String),
    #[error("stored hash is malformed: {0}")]
    MalformedHash(String),
}

const DECOY_PASSWORD: &str = "evbook-decoy-password";

/// Argon2id hashing with a configurable cost.
#[derive(Clone)]
pub struct PasswordService {
    argon2: Argon2<'static>,
    decoy: Arc<str>,
}

impl PasswordService {
    pub fn new(cfg: &PasswordConfig) -> Result<Self, PasswordError> {
        let params = Params::new(cfg.m_cost_kib, cfg.t_cost, cfg.p_cost, None)
            .map_err(|e| PasswordError::Params(e.to_string()))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let decoy = hash_with(&argon2, DECOY_PASSWORD)?.into();
        Ok(Self { argon2, decoy })
    }

    pub fn hash(&self, plain: &str) -> Result<String, PasswordError> {
        hash_with(&self.argon2, plain)
    }

    /// A valid hash with the current cost parameters that matches no account.
    /// Login verifies against it when the user is unknown so both failure
    /// paths do the same amount of work.
    pub fn decoy_hash(&self) -> &str {
        &self.decoy
    }

    /// `Ok(false)` on mismatch; errors only when the stored hash is unusable.
    /// Cost parameters are read from the stored hash.
    pub fn verify(&self, hash: &str, plain: &str) -> Result<bool, PasswordError> {
        let parsed = PasswordHash::new(hash).map_err(|e| {
            error!(error = %e, "argon2 parse hash error");
            PasswordError::MalformedHash(e.to_string())
        })?;
        match self.argon2.verify_password(plain.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => {
                error!(error = %e, "argon2 verify_password error");
                Err(PasswordError::Hash(e.to_string()))
            }
        }
    }
}

fn hash_with(argon2: &Argon2<'_>, plain: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            PasswordError::Hash(e.to_string())
        })?
        .to_string();
    Ok(hash)
}
