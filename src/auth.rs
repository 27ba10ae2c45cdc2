//! Credential hashing and secret generation.
//!
//! Argon2id hashing and verification are CPU-heavy; call sites run them
//! under `tokio::task::spawn_blocking`.

use anyhow::Result;
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::config::SecurityConfig;
use crate::constants::security::SCRAMBLE_SECRET_LEN;

/// Hash a password using Argon2id with a per-call random salt.
/// If config is None, uses the library defaults.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Verify a password against a stored digest.
///
/// Comparison time does not depend on where a mismatch occurs. A digest that
/// does not parse as a PHC string yields `false`, never an error.
#[must_use]
pub fn verify_password(password: &str, digest: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(digest) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Generate an opaque, unguessable reset token.
#[must_use]
pub fn generate_reset_token() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Generate the throwaway secret used to scramble an anonymized account's
/// password. The plaintext is hashed and then discarded.
#[must_use]
pub fn generate_scramble_secret() -> String {
    use rand::Rng;
    use rand::distr::Alphanumeric;

    let mut rng = rand::rng();
    (0..SCRAMBLE_SECRET_LEN)
        .map(|_| char::from(rng.sample(Alphanumeric)))
        .collect()
}
