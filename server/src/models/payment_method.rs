// src/models/payment_method.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PaymentMethod {
  pub id: Uuid,
  pub name: String,
  pub description: String,
  pub icon: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PaymentMethodDraft {
  #[validate(length(min = 1, max = 100, message = "Ensure this field has between 1 and 100 characters."))]
  pub name: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub icon: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct PaymentMethodChanges {
  #[validate(length(min = 1, max = 100, message = "Ensure this field has between 1 and 100 characters."))]
  pub name: Option<String>,
  pub description: Option<String>,
  #[serde(default, deserialize_with = "super::present")]
  pub icon: Option<Option<String>>,
}

impl PaymentMethodChanges {
  pub fn apply_to(self, current: &PaymentMethod) -> PaymentMethodDraft {
    PaymentMethodDraft {
      name: self.name.unwrap_or_else(|| current.name.clone()),
      description: self.description.unwrap_or_else(|| current.description.clone()),
      icon: self.icon.unwrap_or_else(|| current.icon.clone()),
    }
  }
}
