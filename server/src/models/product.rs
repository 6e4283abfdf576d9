// src/models/product.rs

use crate::errors::{push_field_error, AppError, FieldErrors, Result as AppResult};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// NUMERIC(10, 2): eight integer digits.
const MAX_PRICE_EXCLUSIVE: i64 = 100_000_000;
const MONEY_SCALE: u32 = 2;

/// A product as listed, with the owning category's name joined in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Product {
  pub id: Uuid,
  pub name: String,
  pub description: String,
  pub price: Decimal,
  pub original_price: Option<Decimal>,
  pub has_discount: bool,
  pub discount_percentage: Decimal,
  pub image: Option<String>,
  pub stock: i32,
  #[serde(rename = "category")]
  pub category_id: Uuid,
  pub category_name: String,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Body of `POST /products/products/`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
  pub name: String,
  #[serde(default)]
  pub description: String,
  pub price: Decimal,
  #[serde(default)]
  pub original_price: Option<Decimal>,
  #[serde(default)]
  pub has_discount: bool,
  #[serde(default)]
  pub discount_percentage: Decimal,
  #[serde(default)]
  pub image: Option<String>,
  #[serde(default)]
  pub stock: i32,
  pub category: Uuid,
}

/// Body of `PUT`/`PATCH /products/products/{id}/`; absent fields are kept and
/// `null` clears `original_price` or `image`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductChanges {
  pub name: Option<String>,
  pub description: Option<String>,
  pub price: Option<Decimal>,
  #[serde(default, deserialize_with = "super::present")]
  pub original_price: Option<Option<Decimal>>,
  pub has_discount: Option<bool>,
  pub discount_percentage: Option<Decimal>,
  #[serde(default, deserialize_with = "super::present")]
  pub image: Option<Option<String>>,
  pub stock: Option<i32>,
  pub category: Option<Uuid>,
}

/// The full set of writable product fields, checked by [`validate_product`]
/// before anything is persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
  pub name: String,
  pub description: String,
  pub price: Decimal,
  pub original_price: Option<Decimal>,
  pub has_discount: bool,
  pub discount_percentage: Decimal,
  pub image: Option<String>,
  pub stock: i32,
  pub category_id: Uuid,
}

impl From<ProductInput> for ProductDraft {
  fn from(input: ProductInput) -> Self {
    Self {
      name: input.name,
      description: input.description,
      price: input.price,
      original_price: input.original_price,
      has_discount: input.has_discount,
      discount_percentage: input.discount_percentage,
      image: input.image,
      stock: input.stock,
      category_id: input.category,
    }
  }
}

impl ProductChanges {
  pub fn apply_to(self, current: &Product) -> ProductDraft {
    ProductDraft {
      name: self.name.unwrap_or_else(|| current.name.clone()),
      description: self.description.unwrap_or_else(|| current.description.clone()),
      price: self.price.unwrap_or(current.price),
      original_price: self.original_price.unwrap_or(current.original_price),
      has_discount: self.has_discount.unwrap_or(current.has_discount),
      discount_percentage: self.discount_percentage.unwrap_or(current.discount_percentage),
      image: self.image.unwrap_or_else(|| current.image.clone()),
      stock: self.stock.unwrap_or(current.stock),
      category_id: self.category.unwrap_or(current.category_id),
    }
  }
}

fn check_money(errors: &mut FieldErrors, field: &str, value: Decimal) {
  if value.is_sign_negative() && !value.is_zero() {
    push_field_error(errors, field, "Ensure this value is greater than or equal to 0.");
  }
  if value.abs() >= Decimal::from(MAX_PRICE_EXCLUSIVE) {
    push_field_error(errors, field, "Ensure that there are no more than 10 digits in total.");
  }
  if value.normalize().scale() > MONEY_SCALE {
    push_field_error(errors, field, "Ensure that there are no more than 2 decimal places.");
  }
}

/// Checks the product invariants; every violation is reported, keyed by field.
pub fn validate_product(draft: &ProductDraft) -> AppResult<()> {
  let mut errors = FieldErrors::new();

  let name_len = draft.name.trim().chars().count();
  if name_len == 0 {
    push_field_error(&mut errors, "name", "This field may not be blank.");
  } else if draft.name.chars().count() > 200 {
    push_field_error(&mut errors, "name", "Ensure this field has no more than 200 characters.");
  }

  check_money(&mut errors, "price", draft.price);
  if let Some(original_price) = draft.original_price {
    check_money(&mut errors, "original_price", original_price);
    if draft.price > original_price {
      push_field_error(&mut errors, "price", "Price cannot exceed the original price.");
    }
  }

  if draft.discount_percentage < Decimal::ZERO || draft.discount_percentage > Decimal::from(100) {
    push_field_error(
      &mut errors,
      "discount_percentage",
      "Ensure this value is between 0 and 100.",
    );
  }
  if draft.discount_percentage.normalize().scale() > MONEY_SCALE {
    push_field_error(
      &mut errors,
      "discount_percentage",
      "Ensure that there are no more than 2 decimal places.",
    );
  }

  if draft.stock < 0 {
    push_field_error(&mut errors, "stock", "Ensure this value is greater than or equal to 0.");
  }

  if errors.is_empty() {
    Ok(())
  } else {
    Err(AppError::Validation(errors))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rust_decimal::Decimal;

  fn draft(price: i64, original_price: Option<i64>) -> ProductDraft {
    ProductDraft {
      name: "Smart TV".to_string(),
      description: String::new(),
      price: Decimal::from(price),
      original_price: original_price.map(Decimal::from),
      has_discount: false,
      discount_percentage: Decimal::ZERO,
      image: None,
      stock: 1,
      category_id: Uuid::new_v4(),
    }
  }

  #[test]
  fn price_above_original_price_is_rejected() {
    let err = validate_product(&draft(150, Some(100))).unwrap_err();
    let fields = err.field_errors().unwrap();
    assert!(fields.contains_key("price"));
  }

  #[test]
  fn discounted_price_is_accepted() {
    assert!(validate_product(&draft(80, Some(100))).is_ok());
    assert!(validate_product(&draft(100, None)).is_ok());
  }

  #[test]
  fn discount_out_of_range_and_negative_stock_are_reported_together() {
    let mut d = draft(10, None);
    d.discount_percentage = Decimal::new(10050, 2);
    d.stock = -1;
    let err = validate_product(&d).unwrap_err();
    let fields = err.field_errors().unwrap();
    assert!(fields.contains_key("discount_percentage"));
    assert!(fields.contains_key("stock"));
  }

  #[test]
  fn too_many_decimal_places_is_rejected() {
    let mut d = draft(10, None);
    d.price = Decimal::new(10999, 3);
    assert!(validate_product(&d).is_err());
    d.price = Decimal::new(10990, 3);
    assert!(validate_product(&d).is_ok());
  }

  #[test]
  fn null_clears_and_absent_keeps_optional_fields() {
    let current = Product {
      id: Uuid::new_v4(),
      name: "Smart TV".to_string(),
      description: String::new(),
      price: Decimal::from(50),
      original_price: Some(Decimal::from(60)),
      has_discount: true,
      discount_percentage: Decimal::ZERO,
      image: Some("tv.png".to_string()),
      stock: 1,
      category_id: Uuid::new_v4(),
      category_name: "Televisores".to_string(),
      created_at: chrono::Utc::now(),
      updated_at: chrono::Utc::now(),
    };

    let kept: ProductChanges = serde_json::from_str(r#"{"stock": 2}"#).unwrap();
    let draft = kept.apply_to(&current);
    assert_eq!(draft.original_price, Some(Decimal::from(60)));
    assert_eq!(draft.image.as_deref(), Some("tv.png"));

    let cleared: ProductChanges = serde_json::from_str(r#"{"original_price": null, "image": null}"#).unwrap();
    assert_eq!(cleared.original_price, Some(None));
    let draft = cleared.apply_to(&current);
    assert_eq!(draft.original_price, None);
    assert_eq!(draft.image, None);
  }
}
