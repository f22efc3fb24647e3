use std::fmt::Write;

use argon2::{
    password_hash::{Output, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use lazy_static::lazy_static;
use rand::{rngs::OsRng, RngCore};
use regex::Regex;
use sha2::{Digest, Sha256};
use tracing::{debug, error};
use ulid::Ulid;

pub const DEFAULT_TOKEN_BYTES: usize = 32;
pub const MIN_PASSWORD_LEN: usize = 8;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
    /// Verified against when an account is unknown or has no password, so
    /// every failed signin pays the same Argon2 cost.
    static ref DUMMY_HASH: Option<String> = hash_password("nodepath-dummy-password").ok();
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Outcome of the password strength rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordCheck {
    pub is_valid: bool,
    pub errors: Vec<&'static str>,
}

pub(crate) fn validate_password(password: &str) -> PasswordCheck {
    let mut errors = Vec::new();

    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.push("Password must be at least 8 characters long");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push("Password must contain at least one uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push("Password must contain at least one lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push("Password must contain at least one number");
    }

    PasswordCheck {
        is_valid: errors.is_empty(),
        errors,
    }
}

/// Argon2id with a fresh random salt; the PHC string carries salt and hash.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// `false` for a wrong password and for a stored value that does not parse.
///
/// Accepts Argon2 PHC strings and the legacy `salt:hex(sha256(password + salt))`
/// form written by earlier deployments.
pub fn verify_password(plain: &str, stored: &str) -> bool {
    let parsed = match PasswordHash::new(stored) {
        Ok(p) => p,
        Err(e) => {
            if let Some((salt, hash)) = stored.split_once(':') {
                return verify_legacy_sha256(plain, salt, hash);
            }
            debug!(error = %e, "stored password hash is malformed");
            return false;
        }
    };
    if parsed.salt.is_none() || parsed.hash.is_none() {
        return false;
    }
    Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok()
}

fn verify_legacy_sha256(plain: &str, salt: &str, hash: &str) -> bool {
    if salt.is_empty() || hash.is_empty() {
        return false;
    }
    let expected = match hex::decode(hash).ok().and_then(|b| Output::new(&b).ok()) {
        Some(expected) => expected,
        None => return false,
    };
    let mut hasher = Sha256::new();
    hasher.update(plain.as_bytes());
    hasher.update(salt.as_bytes());
    let computed = hasher.finalize();
    // `Output` equality is constant time.
    Output::new(&computed).is_ok_and(|computed| computed == expected)
}

/// Checks a signin attempt. With no stored hash the dummy hash is verified
/// instead and the result is always `false`.
pub fn verify_credentials(plain: &str, stored: Option<&str>) -> bool {
    match stored {
        Some(stored) => verify_password(plain, stored),
        None => {
            if let Some(dummy) = DUMMY_HASH.as_deref() {
                let _ = verify_password(plain, dummy);
            }
            false
        }
    }
}

/// `len` random bytes from the OS RNG, hex encoded.
pub fn generate_token(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    bytes.iter().fold(String::with_capacity(len * 2), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

pub fn generate_user_id() -> String {
    Ulid::new().to_string()
}
