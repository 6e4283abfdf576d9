// src/models/mod.rs

//! Data structures for persisted records and the payloads that create them.

pub mod category;
pub mod payment_method;
pub mod product;
pub mod user;

pub use category::{is_valid_slug, slugify, Category, CategoryChanges, NewCategory, INVALID_SLUG};
pub use payment_method::{PaymentMethod, PaymentMethodChanges, PaymentMethodDraft};
pub use product::{validate_product, Product, ProductChanges, ProductDraft, ProductInput};
pub use user::{Account, AccountChanges, AccountStatus, NewUser, RoleSummary, User, UserProfile};

use serde::{Deserialize, Deserializer};

/// For partial updates: an absent key stays `None`, an explicit `null` becomes `Some(None)`.
///
/// Use together with `#[serde(default)]`.
pub fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  Option::<T>::deserialize(deserializer).map(Some)
}
