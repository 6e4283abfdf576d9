// src/services/auth_service.rs

//! Password hashing and API token keys.

use crate::errors::AppError;
use argon2::{
  password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
  Argon2,
};
use rand_core::RngCore;
use tracing::{debug, error, instrument};

/// Random bytes in an API token key; hex encoding doubles the length to 40.
const TOKEN_KEY_BYTES: usize = 20;

/// Hashes a plain-text password using Argon2.
///
/// # Returns
/// The PHC-formatted hash string, or an `AppError` if the password is empty
/// or hashing fails.
#[instrument(name = "auth_service::hash_password", skip(password), err(Display))]
pub fn hash_password(password: &str) -> Result<String, AppError> {
  if password.is_empty() {
    return Err(AppError::field("password", "This field may not be blank."));
  }

  let salt = SaltString::generate(&mut OsRng);
  match Argon2::default().hash_password(password.as_bytes(), &salt) {
    Ok(password_hash_obj) => {
      debug!("Password hashed successfully.");
      Ok(password_hash_obj.to_string())
    }
    Err(argon_err) => {
      error!(error = %argon_err, "Argon2 password hashing failed.");
      Err(AppError::Internal(format!("Password hashing process failed: {}", argon_err)))
    }
  }
}

/// Verifies a plain-text password against a stored Argon2 hash.
///
/// A mismatch is `Ok(false)`. An unparsable stored hash is an internal error,
/// except for the empty hash, which simply never matches.
#[instrument(name = "auth_service::verify_password", skip_all, err(Display))]
pub fn verify_password(hashed_password_str: &str, provided_password: &str) -> Result<bool, AppError> {
  if hashed_password_str.is_empty() || provided_password.is_empty() {
    return Ok(false);
  }

  let parsed_hash = PasswordHash::new(hashed_password_str).map_err(|parse_err| {
    error!(error = %parse_err, "Failed to parse stored password hash string.");
    AppError::Internal(format!("Invalid stored password hash format: {}", parse_err))
  })?;

  match Argon2::default().verify_password(provided_password.as_bytes(), &parsed_hash) {
    Ok(()) => Ok(true),
    Err(argon2::password_hash::Error::Password) => {
      debug!("Password verification failed: Passwords do not match.");
      Ok(false)
    }
    Err(other_argon_err) => {
      error!(error = %other_argon_err, "Argon2 password verification process encountered an error.");
      Err(AppError::Internal(format!(
        "Password verification process failed: {}",
        other_argon_err
      )))
    }
  }
}

/// A fresh 40-character hex key for `Authorization: Token <key>`.
pub fn generate_token_key() -> String {
  let mut bytes = [0u8; TOKEN_KEY_BYTES];
  OsRng.fill_bytes(&mut bytes);
  hex::encode(bytes)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn hash_then_verify() {
    let hash = hash_password("correct horse battery").unwrap();
    assert!(verify_password(&hash, "correct horse battery").unwrap());
    assert!(!verify_password(&hash, "wrong horse battery").unwrap());
  }

  #[test]
  fn empty_password_is_rejected_for_hashing() {
    assert!(matches!(hash_password(""), Err(AppError::Validation(_))));
  }

  #[test]
  fn token_keys_are_forty_hex_chars_and_distinct() {
    let a = generate_token_key();
    let b = generate_token_key();
    assert_eq!(a.len(), 40);
    assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    assert_ne!(a, b);
  }
}
