// src/models/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
  pub id: Uuid,
  pub username: String,
  pub email: String,
  pub first_name: String,
  pub last_name: String,
  #[serde(skip_serializing, default)] // Never send password hash to client
  pub password_hash: String,
  pub is_active: bool,
  pub is_staff: bool,
  pub is_superuser: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
  pub is_email_verified: bool,
  pub phone: Option<String>,
  pub address: Option<String>,
}

/// Activation state derived from the user and profile flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountStatus {
  /// Registered, email not yet verified, cannot sign in.
  Pending,
  Active,
}

/// A user together with its one-to-one profile, serialized as the API's user object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
  #[serde(flatten)]
  pub user: User,
  pub profile: UserProfile,
}

impl Account {
  pub fn id(&self) -> Uuid {
    self.user.id
  }

  pub fn status(&self) -> AccountStatus {
    if self.user.is_active && self.profile.is_email_verified {
      AccountStatus::Active
    } else {
      AccountStatus::Pending
    }
  }
}

/// Everything needed to insert a user and its profile.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub username: String,
  pub email: String,
  pub first_name: String,
  pub last_name: String,
  pub password_hash: String,
  pub is_active: bool,
  pub is_staff: bool,
  pub is_superuser: bool,
  pub email_verified: bool,
}

impl NewUser {
  /// An inactive, unverified account as created by self-registration.
  pub fn pending(username: String, email: String, password_hash: String) -> Self {
    Self {
      username,
      email,
      first_name: String::new(),
      last_name: String::new(),
      password_hash,
      is_active: false,
      is_staff: false,
      is_superuser: false,
      email_verified: false,
    }
  }
}

/// Partial update of a user and its profile, applied in one transaction.
///
/// `None` keeps the stored value. For `phone` and `address`, `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountChanges {
  pub first_name: Option<String>,
  pub last_name: Option<String>,
  pub email: Option<String>,
  pub phone: Option<Option<String>>,
  pub address: Option<Option<String>>,
}

impl AccountChanges {
  pub fn is_empty(&self) -> bool {
    *self == Self::default()
  }

  pub fn apply(&self, user: &mut User, profile: &mut UserProfile) {
    if let Some(first_name) = &self.first_name {
      user.first_name = first_name.clone();
    }
    if let Some(last_name) = &self.last_name {
      user.last_name = last_name.clone();
    }
    if let Some(email) = &self.email {
      user.email = email.clone();
    }
    if let Some(phone) = &self.phone {
      profile.phone = phone.clone();
    }
    if let Some(address) = &self.address {
      profile.address = address.clone();
    }
  }
}

/// Outcome of an admin-role enforcement run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RoleSummary {
  pub superusers: i64,
  pub staff_admins: i64,
  pub promoted: Vec<String>,
  pub demoted: Vec<String>,
}
