// src/store/mod.rs

//! Persistence seams. Pipelines and handlers only see `dyn Store`; the
//! Postgres and in-memory implementations are picked at startup.

pub mod memory;
pub mod postgres;

use crate::config::AppConfig;
use crate::errors::Result as AppResult;
use crate::models::{
  Account, AccountChanges, Category, CategoryChanges, NewUser, PaymentMethod, PaymentMethodDraft, Product,
  ProductDraft, User,
};
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Users, their profiles and API tokens.
#[async_trait]
pub trait AccountStore: Send + Sync {
  async fn username_exists(&self, username: &str) -> AppResult<bool>;

  /// Whether `email` belongs to an account other than `except`.
  async fn email_exists(&self, email: &str, except: Option<Uuid>) -> AppResult<bool>;

  async fn find_account(&self, id: Uuid) -> AppResult<Option<Account>>;
  async fn find_account_by_username(&self, username: &str) -> AppResult<Option<Account>>;

  /// Inserts the user and its profile together.
  async fn insert_account(&self, new_user: NewUser) -> AppResult<Account>;

  /// Sets `is_active` and `profile.is_email_verified` atomically, but only on an
  /// inactive account. `None` when the account is missing or already active.
  async fn activate_account(&self, id: Uuid) -> AppResult<Option<Account>>;

  /// Applies `changes` to the user and profile atomically.
  async fn update_account(&self, id: Uuid, changes: &AccountChanges) -> AppResult<Account>;

  async fn set_roles(&self, id: Uuid, is_staff: bool, is_superuser: bool) -> AppResult<()>;

  /// Grants staff and superuser and replaces the password in one write.
  async fn restore_superuser(&self, id: Uuid, password_hash: &str) -> AppResult<()>;

  /// Every superuser plus the canonical admin account if it exists.
  async fn list_role_holders(&self, admin_username: &str) -> AppResult<Vec<User>>;

  /// Staff accounts, superusers first, then by username.
  async fn list_staff(&self) -> AppResult<Vec<Account>>;

  /// `(superusers, staff that are not superusers)`.
  async fn count_roles(&self) -> AppResult<(i64, i64)>;

  /// Returns the user's API token, creating it on first use.
  async fn issue_auth_token(&self, user_id: Uuid) -> AppResult<String>;
  async fn account_for_token(&self, key: &str) -> AppResult<Option<Account>>;
}

/// Categories, products and payment methods.
#[async_trait]
pub trait CatalogStore: Send + Sync {
  async fn list_categories(&self) -> AppResult<Vec<Category>>;
  async fn find_category_by_slug(&self, slug: &str) -> AppResult<Option<Category>>;
  async fn category_exists(&self, id: Uuid) -> AppResult<bool>;
  async fn create_category(&self, name: &str, slug: &str) -> AppResult<Category>;
  async fn update_category(&self, slug: &str, changes: &CategoryChanges) -> AppResult<Option<Category>>;
  /// Deletes the category and, by cascade, its products.
  async fn delete_category(&self, slug: &str) -> AppResult<bool>;
  /// Looks the category up by slug; creates it with `name` if missing. The flag is `true` on creation.
  async fn get_or_create_category(&self, slug: &str, name: &str) -> AppResult<(Category, bool)>;

  /// Newest first, optionally restricted to one category slug.
  async fn list_products(&self, category_slug: Option<&str>) -> AppResult<Vec<Product>>;
  async fn find_product(&self, id: Uuid) -> AppResult<Option<Product>>;
  async fn create_product(&self, draft: &ProductDraft) -> AppResult<Product>;
  async fn update_product(&self, id: Uuid, draft: &ProductDraft) -> AppResult<Option<Product>>;
  async fn delete_product(&self, id: Uuid) -> AppResult<bool>;
  async fn count_products(&self) -> AppResult<i64>;

  async fn list_payment_methods(&self) -> AppResult<Vec<PaymentMethod>>;
  async fn find_payment_method(&self, id: Uuid) -> AppResult<Option<PaymentMethod>>;
  async fn create_payment_method(&self, draft: &PaymentMethodDraft) -> AppResult<PaymentMethod>;
  async fn update_payment_method(&self, id: Uuid, draft: &PaymentMethodDraft) -> AppResult<Option<PaymentMethod>>;
  async fn delete_payment_method(&self, id: Uuid) -> AppResult<bool>;
  /// Looks the method up by name; creates it with `description` if missing.
  async fn get_or_create_payment_method(&self, name: &str, description: &str) -> AppResult<(PaymentMethod, bool)>;
}

pub trait Store: AccountStore + CatalogStore {}

impl<T: AccountStore + CatalogStore> Store for T {}

/// Opens the store selected by `DATABASE_URL`, running migrations for Postgres.
pub async fn connect(config: &AppConfig) -> AppResult<Arc<dyn Store>> {
  if config.uses_memory_store() {
    tracing::warn!("Using the in-memory store; data is lost on shutdown.");
    return Ok(Arc::new(MemoryStore::new()));
  }
  let store = PgStore::connect(&config.database_url).await?;
  store.migrate().await?;
  Ok(Arc::new(store))
}
