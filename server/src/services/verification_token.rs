// src/services/verification_token.rs

//! Signed, expiring email-verification tokens.
//!
//! A token is `base36(issued_at) "-" hex(mac)[..32]`, where the MAC covers the
//! user's id, password hash, active flag and email as well as the timestamp.
//! Activating the account flips `is_active`, so a redeemed token no longer
//! verifies and no token table is needed.

use crate::errors::{AppError, Result as AppResult};
use crate::models::User;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Hex characters of the MAC kept in the token.
const TOKEN_MAC_HEX_LEN: usize = 32;
/// `u64::MAX` in base 36 has 13 digits.
const MAX_TIMESTAMP_DIGITS: usize = 13;
const FIELD_SEPARATOR: &[u8] = &[0x1f];

#[derive(Clone)]
pub struct TokenGenerator {
  secret: Vec<u8>,
  ttl_secs: u64,
}

impl std::fmt::Debug for TokenGenerator {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("TokenGenerator").field("ttl_secs", &self.ttl_secs).finish_non_exhaustive()
  }
}

impl TokenGenerator {
  pub fn new(secret: &str, ttl_secs: u64) -> Self {
    Self {
      secret: secret.as_bytes().to_vec(),
      ttl_secs,
    }
  }

  pub fn make_token(&self, user: &User) -> AppResult<String> {
    self.make_token_at(user, Utc::now().timestamp().max(0) as u64)
  }

  pub fn make_token_at(&self, user: &User, issued_at: u64) -> AppResult<String> {
    let digest = self.mac(user, issued_at)?.finalize().into_bytes();
    let mac_hex = hex::encode(digest);
    Ok(format!("{}-{}", to_base36(issued_at), &mac_hex[..TOKEN_MAC_HEX_LEN]))
  }

  pub fn check_token(&self, user: &User, token: &str) -> bool {
    self.check_token_at(user, token, Utc::now().timestamp().max(0) as u64)
  }

  /// Whether `token` was issued for `user` in its current state and is no older than the TTL at `now`.
  pub fn check_token_at(&self, user: &User, token: &str, now: u64) -> bool {
    let Some((timestamp, mac_hex)) = token.split_once('-') else {
      return false;
    };
    let Some(issued_at) = from_base36(timestamp) else {
      return false;
    };
    if mac_hex.len() != TOKEN_MAC_HEX_LEN {
      return false;
    }
    let Ok(provided) = hex::decode(mac_hex) else {
      return false;
    };
    let Ok(mac) = self.mac(user, issued_at) else {
      return false;
    };
    // Constant-time comparison against the leading bytes of the full MAC.
    if mac.verify_truncated_left(&provided).is_err() {
      return false;
    }
    issued_at <= now && now - issued_at <= self.ttl_secs
  }

  fn mac(&self, user: &User, issued_at: u64) -> AppResult<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(&self.secret)
      .map_err(|e| AppError::Internal(format!("Invalid verification token key: {}", e)))?;
    mac.update(user.id.as_bytes());
    mac.update(FIELD_SEPARATOR);
    mac.update(user.password_hash.as_bytes());
    mac.update(FIELD_SEPARATOR);
    mac.update(&[u8::from(user.is_active)]);
    mac.update(FIELD_SEPARATOR);
    mac.update(user.email.as_bytes());
    mac.update(FIELD_SEPARATOR);
    mac.update(&issued_at.to_be_bytes());
    Ok(mac)
  }
}

pub fn to_base36(mut value: u64) -> String {
  const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
  if value == 0 {
    return "0".to_string();
  }
  let mut out = Vec::new();
  while value > 0 {
    out.push(DIGITS[(value % 36) as usize]);
    value /= 36;
  }
  out.iter().rev().map(|&b| b as char).collect()
}

pub fn from_base36(value: &str) -> Option<u64> {
  if value.is_empty() || value.len() > MAX_TIMESTAMP_DIGITS || !value.bytes().all(|b| b.is_ascii_digit() || b.is_ascii_lowercase()) {
    return None;
  }
  u64::from_str_radix(value, 36).ok()
}

/// URL-safe encoding of a user id for verification links.
pub fn encode_uid(id: Uuid) -> String {
  URL_SAFE_NO_PAD.encode(id.to_string())
}

/// Inverse of [`encode_uid`]; `None` for anything malformed.
pub fn decode_uid(encoded: &str) -> Option<Uuid> {
  let bytes = URL_SAFE_NO_PAD.decode(encoded.trim_end_matches('=')).ok()?;
  let text = String::from_utf8(bytes).ok()?;
  Uuid::parse_str(&text).ok()
}

#[cfg(test)]
mod tests {
  use super::*;

  const DAY: u64 = 24 * 60 * 60;

  fn user() -> User {
    User {
      id: Uuid::new_v4(),
      username: "maria".to_string(),
      email: "maria@example.com".to_string(),
      first_name: String::new(),
      last_name: String::new(),
      password_hash: "$argon2id$v=19$stub".to_string(),
      is_active: false,
      is_staff: false,
      is_superuser: false,
      created_at: Utc::now(),
      updated_at: Utc::now(),
    }
  }

  #[test]
  fn token_verifies_until_it_expires() {
    let generator = TokenGenerator::new("secret", 3 * DAY);
    let u = user();
    let issued_at = 1_700_000_000;
    let token = generator.make_token_at(&u, issued_at).unwrap();
    assert!(generator.check_token_at(&u, &token, issued_at));
    assert!(generator.check_token_at(&u, &token, issued_at + 3 * DAY));
    assert!(!generator.check_token_at(&u, &token, issued_at + 3 * DAY + 1));
  }

  #[test]
  fn activation_invalidates_token() {
    let generator = TokenGenerator::new("secret", DAY);
    let mut u = user();
    let token = generator.make_token(&u).unwrap();
    u.is_active = true;
    assert!(!generator.check_token(&u, &token));
  }

  #[test]
  fn tampered_or_foreign_tokens_fail() {
    let generator = TokenGenerator::new("secret", DAY);
    let u = user();
    let token = generator.make_token(&u).unwrap();

    let mut tampered = token.clone();
    let last = tampered.pop().unwrap();
    tampered.push(if last == '0' { '1' } else { '0' });
    assert!(!generator.check_token(&u, &tampered));

    let other_key = TokenGenerator::new("another-secret", DAY);
    assert!(!other_key.check_token(&u, &token));
    assert!(!generator.check_token(&user(), &token));

    for garbage in ["", "-", "abc", "zz-zz", "1-", "!!-0123456789abcdef0123456789abcdef"] {
      assert!(!generator.check_token(&u, garbage), "{garbage:?} should not verify");
    }
  }

  #[test]
  fn base36_and_uid_round_trip() {
    assert_eq!(to_base36(0), "0");
    assert_eq!(to_base36(1_700_000_000), "s44we8");
    assert_eq!(from_base36("s44we8"), Some(1_700_000_000));
    assert_eq!(from_base36("S44WE8"), None);

    let id = Uuid::new_v4();
    assert_eq!(decode_uid(&encode_uid(id)), Some(id));
    assert_eq!(decode_uid("not base64!"), None);
    assert_eq!(decode_uid(&URL_SAFE_NO_PAD.encode("not-a-uuid")), None);
  }
}
