// src/services/password_policy.rs

//! Strength rules applied to passwords chosen at registration.

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Similarity ratio at or above which a password counts as derived from a user attribute.
const MAX_SIMILARITY: f64 = 0.7;

const COMMON_PASSWORDS: &[&str] = &[
  "123456", "password", "12345678", "qwerty", "123456789", "12345", "1234", "111111", "1234567", "dragon",
  "123123", "baseball", "abc123", "football", "monkey", "letmein", "696969", "shadow", "master", "666666",
  "qwertyuiop", "123321", "mustang", "1234567890", "michael", "654321", "superman", "1qaz2wsx", "7777777",
  "121212", "000000", "qazwsx", "123qwe", "killer", "trustno1", "jordan", "jennifer", "zxcvbnm", "asdfgh",
  "hunter", "buster", "soccer", "harley", "batman", "andrew", "tigger", "sunshine", "iloveyou", "2000",
  "charlie", "robert", "thomas", "hockey", "ranger", "daniel", "starwars", "klaster", "112233", "george",
  "computer", "michelle", "jessica", "pepper", "1111", "zxcvbn", "555555", "11111111", "131313", "freedom",
  "777777", "pass", "maggie", "159753", "aaaaaa", "ginger", "princess", "joshua", "cheese", "amanda",
  "summer", "love", "ashley", "nicole", "chelsea", "biteme", "matthew", "access", "yankees", "987654321",
  "dallas", "austin", "thunder", "taylor", "matrix", "password1", "password123", "welcome", "admin",
  "admin123", "administrator", "passw0rd", "contraseña", "contrasena", "qwerty123", "iloveyou1",
];

/// Messages for every rule `password` breaks; empty when it is acceptable.
///
/// `user_attributes` are the values (username, email) the password must not
/// closely resemble.
pub fn check_password(password: &str, user_attributes: &[&str]) -> Vec<String> {
  let mut problems = Vec::new();

  for attribute in user_attributes.iter().filter(|a| !a.is_empty()) {
    if is_too_similar(password, attribute) {
      let label = if attribute.contains('@') { "email address" } else { "username" };
      problems.push(format!("The password is too similar to the {}.", label));
    }
  }

  if password.chars().count() < MIN_PASSWORD_LENGTH {
    problems.push(format!(
      "This password is too short. It must contain at least {} characters.",
      MIN_PASSWORD_LENGTH
    ));
  }

  let lowered = password.trim().to_lowercase();
  if COMMON_PASSWORDS.contains(&lowered.as_str()) {
    problems.push("This password is too common.".to_string());
  }

  if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
    problems.push("This password is entirely numeric.".to_string());
  }

  problems
}

fn is_too_similar(password: &str, attribute: &str) -> bool {
  let password = password.to_lowercase();
  let attribute = attribute.to_lowercase();
  std::iter::once(attribute.as_str())
    .chain(attribute.split(|c: char| !c.is_alphanumeric() && c != '_'))
    .filter(|part| !part.is_empty())
    .any(|part| similarity_ratio(&password, part) >= MAX_SIMILARITY)
}

/// Ratcliff/Obershelp similarity: `2 * matched / (len(a) + len(b))`.
fn similarity_ratio(a: &str, b: &str) -> f64 {
  let a: Vec<char> = a.chars().collect();
  let b: Vec<char> = b.chars().collect();
  let total = a.len() + b.len();
  if total == 0 {
    return 1.0;
  }
  2.0 * matching_chars(&a, &b) as f64 / total as f64
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
  let (mut best_len, mut best_a, mut best_b) = (0, 0, 0);
  for i in 0..a.len() {
    for j in 0..b.len() {
      let mut k = 0;
      while i + k < a.len() && j + k < b.len() && a[i + k] == b[j + k] {
        k += 1;
      }
      if k > best_len {
        (best_len, best_a, best_b) = (k, i, j);
      }
    }
  }
  if best_len == 0 {
    return 0;
  }
  best_len
    + matching_chars(&a[..best_a], &b[..best_b])
    + matching_chars(&a[best_a + best_len..], &b[best_b + best_len..])
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn strong_password_passes() {
    assert!(check_password("Tostadora-2024!", &["maria", "maria@example.com"]).is_empty());
  }

  #[test]
  fn short_numeric_common_are_all_reported() {
    let problems = check_password("123456", &[]);
    assert_eq!(problems.len(), 3);
  }

  #[test]
  fn password_close_to_username_is_rejected() {
    let problems = check_password("carlos123", &["carlos12"]);
    assert!(problems.iter().any(|p| p.contains("username")));
  }

  #[test]
  fn password_close_to_email_local_part_is_rejected() {
    let problems = check_password("gabriela.r", &["gabriela@example.com"]);
    assert!(problems.iter().any(|p| p.contains("email address")));
  }

  #[test]
  fn ratio_matches_known_values() {
    assert!((similarity_ratio("abcd", "bcde") - 0.75).abs() < f64::EPSILON);
    assert_eq!(similarity_ratio("abc", "xyz"), 0.0);
  }
}
