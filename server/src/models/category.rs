// src/models/category.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Category {
  pub id: Uuid,
  pub name: String,
  pub slug: String,
}

/// Body of `POST /products/categories/`. The slug is derived from the name when absent.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewCategory {
  #[validate(length(min = 1, max = 100, message = "Ensure this field has between 1 and 100 characters."))]
  pub name: String,
  #[serde(default)]
  #[validate(length(max = 100, message = "Ensure this field has no more than 100 characters."))]
  pub slug: Option<String>,
}

impl NewCategory {
  /// The slug to store: the supplied one if non-blank, otherwise `slugify(name)`.
  pub fn resolved_slug(&self) -> String {
    match self.slug.as_deref().map(str::trim) {
      Some(slug) if !slug.is_empty() => slug.to_string(),
      _ => slugify(&self.name),
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CategoryChanges {
  #[validate(length(min = 1, max = 100, message = "Ensure this field has between 1 and 100 characters."))]
  pub name: Option<String>,
  #[validate(length(min = 1, max = 100, message = "Ensure this field has between 1 and 100 characters."))]
  pub slug: Option<String>,
}

pub const INVALID_SLUG: &str =
  "Enter a valid \"slug\" consisting of letters, numbers, underscores or hyphens.";

/// True when `slug` is non-empty and only holds ASCII letters, digits, `-` or `_`.
pub fn is_valid_slug(slug: &str) -> bool {
  !slug.is_empty() && slug.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

fn fold_accent(c: char) -> Option<char> {
  let folded = match c {
    'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => 'a',
    'Á' | 'À' | 'Â' | 'Ä' | 'Ã' | 'Å' => 'A',
    'é' | 'è' | 'ê' | 'ë' => 'e',
    'É' | 'È' | 'Ê' | 'Ë' => 'E',
    'í' | 'ì' | 'î' | 'ï' => 'i',
    'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
    'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
    'Ó' | 'Ò' | 'Ô' | 'Ö' | 'Õ' => 'O',
    'ú' | 'ù' | 'û' | 'ü' => 'u',
    'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
    'ñ' => 'n',
    'Ñ' => 'N',
    'ç' => 'c',
    'Ç' => 'C',
    'ý' | 'ÿ' => 'y',
    'Ý' => 'Y',
    c if c.is_ascii() => c,
    _ => return None,
  };
  Some(folded)
}

/// URL-safe slug for `value`.
///
/// Latin accents are folded to ASCII and other non-ASCII characters dropped;
/// the result is lowercase, keeps only `[a-z0-9_-]`, joins words with a single
/// `-` and never starts or ends with `-` or `_`.
pub fn slugify(value: &str) -> String {
  let cleaned: String = value
    .chars()
    .filter_map(fold_accent)
    .map(|c| c.to_ascii_lowercase())
    .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-' || c.is_ascii_whitespace())
    .collect();

  let mut slug = String::with_capacity(cleaned.len());
  let mut pending_separator = false;
  for c in cleaned.chars() {
    if c == '-' || c.is_ascii_whitespace() {
      pending_separator = true;
      continue;
    }
    if pending_separator && !slug.is_empty() {
      slug.push('-');
    }
    pending_separator = false;
    slug.push(c);
  }
  slug.trim_matches(|c| c == '-' || c == '_').to_string()
}
