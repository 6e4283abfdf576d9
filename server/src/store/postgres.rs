// src/store/postgres.rs

use super::{AccountStore, CatalogStore};
use crate::errors::{AppError, Result as AppResult, NON_FIELD_ERRORS};
use crate::models::{
  Account, AccountChanges, Category, CategoryChanges, NewUser, PaymentMethod, PaymentMethodDraft, Product,
  ProductDraft, User, UserProfile,
};
use crate::services::auth_service;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use tracing::{info, instrument};
use uuid::Uuid;

const ACCOUNT_SELECT: &str = "SELECT u.id, u.username, u.email, u.first_name, u.last_name, u.password_hash, \
   u.is_active, u.is_staff, u.is_superuser, u.created_at, u.updated_at, \
   COALESCE(p.is_email_verified, FALSE) AS is_email_verified, p.phone, p.address \
   FROM users u LEFT JOIN user_profiles p ON p.user_id = u.id";

const PRODUCT_SELECT: &str = "SELECT p.id, p.name, p.description, p.price, p.original_price, p.has_discount, \
   p.discount_percentage, p.image, p.stock, p.category_id, c.name AS category_name, p.created_at, p.updated_at \
   FROM products p JOIN categories c ON c.id = p.category_id";

const USER_COLUMNS: &str = "id, username, email, first_name, last_name, password_hash, is_active, is_staff, \
   is_superuser, created_at, updated_at";

#[derive(Debug, FromRow)]
struct AccountRow {
  id: Uuid,
  username: String,
  email: String,
  first_name: String,
  last_name: String,
  password_hash: String,
  is_active: bool,
  is_staff: bool,
  is_superuser: bool,
  created_at: DateTime<Utc>,
  updated_at: DateTime<Utc>,
  is_email_verified: bool,
  phone: Option<String>,
  address: Option<String>,
}

impl From<AccountRow> for Account {
  fn from(row: AccountRow) -> Self {
    Account {
      user: User {
        id: row.id,
        username: row.username,
        email: row.email,
        first_name: row.first_name,
        last_name: row.last_name,
        password_hash: row.password_hash,
        is_active: row.is_active,
        is_staff: row.is_staff,
        is_superuser: row.is_superuser,
        created_at: row.created_at,
        updated_at: row.updated_at,
      },
      profile: UserProfile {
        is_email_verified: row.is_email_verified,
        phone: row.phone,
        address: row.address,
      },
    }
  }
}

/// Maps unique-constraint violations to a field error; anything else stays a database error.
fn map_unique_violation(err: sqlx::Error) -> AppError {
  if let sqlx::Error::Database(db_err) = &err {
    if db_err.code().as_deref() == Some("23505") {
      let field = match db_err.constraint() {
        Some(c) if c.contains("username") => "username",
        Some(c) if c.contains("email") => "email",
        Some(c) if c.contains("slug") => "slug",
        Some(c) if c.contains("name") => "name",
        _ => NON_FIELD_ERRORS,
      };
      return AppError::field(field, "A record with this value already exists.");
    }
    if db_err.code().as_deref() == Some("23503") {
      return AppError::field("category", "Referenced object does not exist.");
    }
  }
  AppError::Sqlx(err)
}

#[derive(Debug, Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub async fn connect(database_url: &str) -> AppResult<Self> {
    let pool = PgPoolOptions::new().max_connections(10).connect(database_url).await?;
    info!("Successfully connected to the database.");
    Ok(Self { pool })
  }

  #[instrument(name = "PgStore::migrate", skip(self), err(Display))]
  pub async fn migrate(&self) -> AppResult<()> {
    sqlx::migrate!("./migrations").run(&self.pool).await?;
    info!("Database migrations applied.");
    Ok(())
  }

  async fn fetch_account(&self, id: Uuid) -> AppResult<Option<Account>> {
    let row = sqlx::query_as::<_, AccountRow>(&format!("{} WHERE u.id = $1", ACCOUNT_SELECT))
      .bind(id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(row.map(Account::from))
  }
}

#[async_trait]
impl AccountStore for PgStore {
  async fn username_exists(&self, username: &str) -> AppResult<bool> {
    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
      .bind(username)
      .fetch_one(&self.pool)
      .await?;
    Ok(exists)
  }

  async fn email_exists(&self, email: &str, except: Option<Uuid>) -> AppResult<bool> {
    let exists = sqlx::query_scalar::<_, bool>(
      "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 AND ($2::uuid IS NULL OR id <> $2))",
    )
    .bind(email)
    .bind(except)
    .fetch_one(&self.pool)
    .await?;
    Ok(exists)
  }

  async fn find_account(&self, id: Uuid) -> AppResult<Option<Account>> {
    self.fetch_account(id).await
  }

  async fn find_account_by_username(&self, username: &str) -> AppResult<Option<Account>> {
    let row = sqlx::query_as::<_, AccountRow>(&format!("{} WHERE u.username = $1", ACCOUNT_SELECT))
      .bind(username)
      .fetch_optional(&self.pool)
      .await?;
    Ok(row.map(Account::from))
  }

  #[instrument(name = "PgStore::insert_account", skip(self, new_user), fields(username = %new_user.username), err(Display))]
  async fn insert_account(&self, new_user: NewUser) -> AppResult<Account> {
    let mut tx = self.pool.begin().await?;
    let user = sqlx::query_as::<_, User>(&format!(
      "INSERT INTO users (id, username, email, first_name, last_name, password_hash, is_active, is_staff, is_superuser) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {}",
      USER_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(&new_user.username)
    .bind(&new_user.email)
    .bind(&new_user.first_name)
    .bind(&new_user.last_name)
    .bind(&new_user.password_hash)
    .bind(new_user.is_active)
    .bind(new_user.is_staff)
    .bind(new_user.is_superuser)
    .fetch_one(&mut *tx)
    .await
    .map_err(map_unique_violation)?;

    let profile = sqlx::query_as::<_, UserProfile>(
      "INSERT INTO user_profiles (user_id, is_email_verified) VALUES ($1, $2) \
       RETURNING is_email_verified, phone, address",
    )
    .bind(user.id)
    .bind(new_user.email_verified)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(Account { user, profile })
  }

  #[instrument(name = "PgStore::activate_account", skip(self), err(Display))]
  async fn activate_account(&self, id: Uuid) -> AppResult<Option<Account>> {
    let mut tx = self.pool.begin().await?;
    let updated =
      sqlx::query("UPDATE users SET is_active = TRUE, updated_at = NOW() WHERE id = $1 AND is_active = FALSE")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if updated.rows_affected() == 0 {
      tx.rollback().await?;
      return Ok(None);
    }
    sqlx::query(
      "INSERT INTO user_profiles (user_id, is_email_verified) VALUES ($1, TRUE) \
       ON CONFLICT (user_id) DO UPDATE SET is_email_verified = TRUE",
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    self.fetch_account(id).await
  }

  #[instrument(name = "PgStore::update_account", skip(self, changes), err(Display))]
  async fn update_account(&self, id: Uuid, changes: &AccountChanges) -> AppResult<Account> {
    let mut tx = self.pool.begin().await?;
    let updated = sqlx::query(
      "UPDATE users SET first_name = COALESCE($2, first_name), last_name = COALESCE($3, last_name), \
       email = COALESCE($4, email), updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .bind(changes.first_name.as_deref())
    .bind(changes.last_name.as_deref())
    .bind(changes.email.as_deref())
    .execute(&mut *tx)
    .await
    .map_err(map_unique_violation)?;
    if updated.rows_affected() == 0 {
      return Err(AppError::NotFound(format!("User {} not found", id)));
    }

    // `$2`/`$4` say whether the column is being written at all, so NULL can clear it.
    sqlx::query(
      "INSERT INTO user_profiles (user_id, phone, address) VALUES ($1, $3, $5) \
       ON CONFLICT (user_id) DO UPDATE SET \
       phone = CASE WHEN $2 THEN EXCLUDED.phone ELSE user_profiles.phone END, \
       address = CASE WHEN $4 THEN EXCLUDED.address ELSE user_profiles.address END",
    )
    .bind(id)
    .bind(changes.phone.is_some())
    .bind(changes.phone.clone().flatten())
    .bind(changes.address.is_some())
    .bind(changes.address.clone().flatten())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    self
      .fetch_account(id)
      .await?
      .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
  }

  async fn set_roles(&self, id: Uuid, is_staff: bool, is_superuser: bool) -> AppResult<()> {
    sqlx::query("UPDATE users SET is_staff = $2, is_superuser = $3, updated_at = NOW() WHERE id = $1")
      .bind(id)
      .bind(is_staff)
      .bind(is_superuser)
      .execute(&self.pool)
      .await?;
    Ok(())
  }

  async fn restore_superuser(&self, id: Uuid, password_hash: &str) -> AppResult<()> {
    let updated = sqlx::query(
      "UPDATE users SET is_staff = TRUE, is_superuser = TRUE, password_hash = $2, updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .bind(password_hash)
    .execute(&self.pool)
    .await?;
    if updated.rows_affected() == 0 {
      return Err(AppError::NotFound(format!("User {} not found", id)));
    }
    Ok(())
  }

  async fn list_role_holders(&self, admin_username: &str) -> AppResult<Vec<User>> {
    let users = sqlx::query_as::<_, User>(&format!(
      "SELECT {} FROM users WHERE is_superuser OR username = $1 ORDER BY username",
      USER_COLUMNS
    ))
    .bind(admin_username)
    .fetch_all(&self.pool)
    .await?;
    Ok(users)
  }

  async fn list_staff(&self) -> AppResult<Vec<Account>> {
    let rows = sqlx::query_as::<_, AccountRow>(&format!(
      "{} WHERE u.is_staff ORDER BY u.is_superuser DESC, u.username",
      ACCOUNT_SELECT
    ))
    .fetch_all(&self.pool)
    .await?;
    Ok(rows.into_iter().map(Account::from).collect())
  }

  async fn count_roles(&self) -> AppResult<(i64, i64)> {
    let counts = sqlx::query_as::<_, (i64, i64)>(
      "SELECT COUNT(*) FILTER (WHERE is_superuser), COUNT(*) FILTER (WHERE is_staff AND NOT is_superuser) FROM users",
    )
    .fetch_one(&self.pool)
    .await?;
    Ok(counts)
  }

  async fn issue_auth_token(&self, user_id: Uuid) -> AppResult<String> {
    // A concurrent insert for the same user loses the race and reads the winner's key.
    sqlx::query("INSERT INTO auth_tokens (key, user_id) VALUES ($1, $2) ON CONFLICT (user_id) DO NOTHING")
      .bind(auth_service::generate_token_key())
      .bind(user_id)
      .execute(&self.pool)
      .await?;
    let key = sqlx::query_scalar::<_, String>("SELECT key FROM auth_tokens WHERE user_id = $1")
      .bind(user_id)
      .fetch_one(&self.pool)
      .await?;
    Ok(key)
  }

  async fn account_for_token(&self, key: &str) -> AppResult<Option<Account>> {
    let row = sqlx::query_as::<_, AccountRow>(&format!(
      "{} JOIN auth_tokens t ON t.user_id = u.id WHERE t.key = $1",
      ACCOUNT_SELECT
    ))
    .bind(key)
    .fetch_optional(&self.pool)
    .await?;
    Ok(row.map(Account::from))
  }
}

#[async_trait]
impl CatalogStore for PgStore {
  async fn list_categories(&self) -> AppResult<Vec<Category>> {
    let categories = sqlx::query_as::<_, Category>("SELECT id, name, slug FROM categories ORDER BY name")
      .fetch_all(&self.pool)
      .await?;
    Ok(categories)
  }

  async fn find_category_by_slug(&self, slug: &str) -> AppResult<Option<Category>> {
    let category = sqlx::query_as::<_, Category>("SELECT id, name, slug FROM categories WHERE slug = $1")
      .bind(slug)
      .fetch_optional(&self.pool)
      .await?;
    Ok(category)
  }

  async fn category_exists(&self, id: Uuid) -> AppResult<bool> {
    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)")
      .bind(id)
      .fetch_one(&self.pool)
      .await?;
    Ok(exists)
  }

  async fn create_category(&self, name: &str, slug: &str) -> AppResult<Category> {
    sqlx::query_as::<_, Category>("INSERT INTO categories (id, name, slug) VALUES ($1, $2, $3) RETURNING id, name, slug")
      .bind(Uuid::new_v4())
      .bind(name)
      .bind(slug)
      .fetch_one(&self.pool)
      .await
      .map_err(map_unique_violation)
  }

  async fn update_category(&self, slug: &str, changes: &CategoryChanges) -> AppResult<Option<Category>> {
    sqlx::query_as::<_, Category>(
      "UPDATE categories SET name = COALESCE($2, name), slug = COALESCE($3, slug) WHERE slug = $1 \
       RETURNING id, name, slug",
    )
    .bind(slug)
    .bind(changes.name.as_deref())
    .bind(changes.slug.as_deref())
    .fetch_optional(&self.pool)
    .await
    .map_err(map_unique_violation)
  }

  async fn delete_category(&self, slug: &str) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM categories WHERE slug = $1")
      .bind(slug)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected() > 0)
  }

  async fn get_or_create_category(&self, slug: &str, name: &str) -> AppResult<(Category, bool)> {
    let inserted = sqlx::query_as::<_, Category>(
      "INSERT INTO categories (id, name, slug) VALUES ($1, $2, $3) ON CONFLICT (slug) DO NOTHING \
       RETURNING id, name, slug",
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(slug)
    .fetch_optional(&self.pool)
    .await
    .map_err(map_unique_violation)?;
    if let Some(category) = inserted {
      return Ok((category, true));
    }
    let existing = self
      .find_category_by_slug(slug)
      .await?
      .ok_or_else(|| AppError::Internal(format!("Category '{}' vanished during get-or-create", slug)))?;
    Ok((existing, false))
  }

  async fn list_products(&self, category_slug: Option<&str>) -> AppResult<Vec<Product>> {
    let products = sqlx::query_as::<_, Product>(&format!(
      "{} WHERE ($1::text IS NULL OR c.slug = $1) ORDER BY p.created_at DESC",
      PRODUCT_SELECT
    ))
    .bind(category_slug)
    .fetch_all(&self.pool)
    .await?;
    Ok(products)
  }

  async fn find_product(&self, id: Uuid) -> AppResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(&format!("{} WHERE p.id = $1", PRODUCT_SELECT))
      .bind(id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(product)
  }

  #[instrument(name = "PgStore::create_product", skip(self, draft), fields(name = %draft.name), err(Display))]
  async fn create_product(&self, draft: &ProductDraft) -> AppResult<Product> {
    let id = Uuid::new_v4();
    sqlx::query(
      "INSERT INTO products (id, name, description, price, original_price, has_discount, discount_percentage, \
       image, stock, category_id) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
    )
    .bind(id)
    .bind(&draft.name)
    .bind(&draft.description)
    .bind(draft.price)
    .bind(draft.original_price)
    .bind(draft.has_discount)
    .bind(draft.discount_percentage)
    .bind(draft.image.as_deref())
    .bind(draft.stock)
    .bind(draft.category_id)
    .execute(&self.pool)
    .await
    .map_err(map_unique_violation)?;

    self
      .find_product(id)
      .await?
      .ok_or_else(|| AppError::Internal(format!("Product {} missing after insert", id)))
  }

  async fn update_product(&self, id: Uuid, draft: &ProductDraft) -> AppResult<Option<Product>> {
    let updated = sqlx::query(
      "UPDATE products SET name = $2, description = $3, price = $4, original_price = $5, has_discount = $6, \
       discount_percentage = $7, image = $8, stock = $9, category_id = $10, updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .bind(&draft.name)
    .bind(&draft.description)
    .bind(draft.price)
    .bind(draft.original_price)
    .bind(draft.has_discount)
    .bind(draft.discount_percentage)
    .bind(draft.image.as_deref())
    .bind(draft.stock)
    .bind(draft.category_id)
    .execute(&self.pool)
    .await
    .map_err(map_unique_violation)?;
    if updated.rows_affected() == 0 {
      return Ok(None);
    }
    self.find_product(id).await
  }

  async fn delete_product(&self, id: Uuid) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
      .bind(id)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected() > 0)
  }

  async fn count_products(&self) -> AppResult<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products")
      .fetch_one(&self.pool)
      .await?;
    Ok(count)
  }

  async fn list_payment_methods(&self) -> AppResult<Vec<PaymentMethod>> {
    let methods =
      sqlx::query_as::<_, PaymentMethod>("SELECT id, name, description, icon FROM payment_methods ORDER BY name")
        .fetch_all(&self.pool)
        .await?;
    Ok(methods)
  }

  async fn find_payment_method(&self, id: Uuid) -> AppResult<Option<PaymentMethod>> {
    let method =
      sqlx::query_as::<_, PaymentMethod>("SELECT id, name, description, icon FROM payment_methods WHERE id = $1")
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
    Ok(method)
  }

  async fn create_payment_method(&self, draft: &PaymentMethodDraft) -> AppResult<PaymentMethod> {
    let method = sqlx::query_as::<_, PaymentMethod>(
      "INSERT INTO payment_methods (id, name, description, icon) VALUES ($1, $2, $3, $4) \
       RETURNING id, name, description, icon",
    )
    .bind(Uuid::new_v4())
    .bind(&draft.name)
    .bind(&draft.description)
    .bind(draft.icon.as_deref())
    .fetch_one(&self.pool)
    .await?;
    Ok(method)
  }

  async fn update_payment_method(&self, id: Uuid, draft: &PaymentMethodDraft) -> AppResult<Option<PaymentMethod>> {
    let method = sqlx::query_as::<_, PaymentMethod>(
      "UPDATE payment_methods SET name = $2, description = $3, icon = $4 WHERE id = $1 \
       RETURNING id, name, description, icon",
    )
    .bind(id)
    .bind(&draft.name)
    .bind(&draft.description)
    .bind(draft.icon.as_deref())
    .fetch_optional(&self.pool)
    .await?;
    Ok(method)
  }

  async fn delete_payment_method(&self, id: Uuid) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM payment_methods WHERE id = $1")
      .bind(id)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected() > 0)
  }

  async fn get_or_create_payment_method(&self, name: &str, description: &str) -> AppResult<(PaymentMethod, bool)> {
    let existing =
      sqlx::query_as::<_, PaymentMethod>("SELECT id, name, description, icon FROM payment_methods WHERE name = $1 LIMIT 1")
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
    if let Some(method) = existing {
      return Ok((method, false));
    }
    let method = self
      .create_payment_method(&PaymentMethodDraft {
        name: name.to_string(),
        description: description.to_string(),
        icon: None,
      })
      .await?;
    Ok((method, true))
  }
}
