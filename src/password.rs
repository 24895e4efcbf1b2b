use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;
use tokio::task;

/// HashingConfig
///
/// Argon2id cost parameters applied to newly created hashes. Verification reads the
/// parameters embedded in the stored PHC string, so changing these never locks out
/// existing accounts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HashingConfig {
    pub memory_cost_kib: u32,
    pub time_cost: u32,
    pub parallelism: u32,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            memory_cost_kib: Params::DEFAULT_M_COST,
            time_cost: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

impl HashingConfig {
    /// The Argon2 parameter set, rejecting costs the algorithm cannot run with.
    pub fn params(&self) -> Result<Params, argon2::Error> {
        Params::new(self.memory_cost_kib, self.time_cost, self.parallelism, None)
    }
}

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("invalid argon2 parameters: {0}")]
    Params(String),

    #[error("failed to hash password: {0}")]
    Hash(String),

    #[error("password hashing task panicked")]
    Task(#[from] task::JoinError),
}

/// Hash a password with Argon2id and a fresh random salt.
pub fn hash_password(password: &str, config: &HashingConfig) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let params = config
        .params()
        .map_err(|e| PasswordError::Params(e.to_string()))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::Hash(e.to_string()))?;

    Ok(hash.to_string())
}

/// Check a password against a stored PHC hash. A malformed hash never verifies.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let parsed = match PasswordHash::new(stored_hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!("stored password hash is malformed: {}", e);
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

// Argon2 is CPU-bound; both wrappers keep it off the async worker threads.

pub async fn hash_blocking(password: String, config: HashingConfig) -> Result<String, PasswordError> {
    task::spawn_blocking(move || hash_password(&password, &config)).await?
}

pub async fn verify_blocking(password: String, stored_hash: String) -> Result<bool, PasswordError> {
    Ok(task::spawn_blocking(move || verify_password(&password, &stored_hash)).await?)
}
