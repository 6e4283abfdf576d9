// src/store/memory.rs

//! In-process store. Every mutation happens under a single write lock, so a
//! multi-record change is observed either completely or not at all.

use super::{AccountStore, CatalogStore};
use crate::errors::{AppError, Result as AppResult};
use crate::models::{
  Account, AccountChanges, Category, CategoryChanges, NewUser, PaymentMethod, PaymentMethodDraft, Product,
  ProductDraft, User, UserProfile,
};
use crate::services::auth_service;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Default)]
struct Tables {
  users: Vec<User>,
  profiles: HashMap<Uuid, UserProfile>,
  tokens: HashMap<String, Uuid>,
  categories: Vec<Category>,
  /// Stored without a meaningful `category_name`; it is joined in on read.
  products: Vec<Product>,
  payment_methods: Vec<PaymentMethod>,
}

impl Tables {
  fn account(&self, user: &User) -> Account {
    Account {
      user: user.clone(),
      profile: self.profiles.get(&user.id).cloned().unwrap_or_default(),
    }
  }

  fn user_index(&self, id: Uuid) -> AppResult<usize> {
    self
      .users
      .iter()
      .position(|u| u.id == id)
      .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
  }

  fn with_category_name(&self, product: &Product) -> Product {
    let mut product = product.clone();
    product.category_name = self
      .categories
      .iter()
      .find(|c| c.id == product.category_id)
      .map(|c| c.name.clone())
      .unwrap_or_default();
    product
  }

  fn require_category(&self, id: Uuid) -> AppResult<()> {
    if self.categories.iter().any(|c| c.id == id) {
      Ok(())
    } else {
      Err(AppError::field("category", format!("Invalid pk \"{}\" - object does not exist.", id)))
    }
  }

  fn check_category_unique(&self, name: &str, slug: &str, except: Option<Uuid>) -> AppResult<()> {
    let others: Vec<&Category> = self.categories.iter().filter(|c| Some(c.id) != except).collect();
    if others.iter().any(|c| c.name == name) {
      return Err(AppError::field("name", "category with this name already exists."));
    }
    if others.iter().any(|c| c.slug == slug) {
      return Err(AppError::field("slug", "category with this slug already exists."));
    }
    Ok(())
  }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
  tables: RwLock<Tables>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl AccountStore for MemoryStore {
  async fn username_exists(&self, username: &str) -> AppResult<bool> {
    Ok(self.tables.read().users.iter().any(|u| u.username == username))
  }

  async fn email_exists(&self, email: &str, except: Option<Uuid>) -> AppResult<bool> {
    Ok(self
      .tables
      .read()
      .users
      .iter()
      .any(|u| u.email == email && Some(u.id) != except))
  }

  async fn find_account(&self, id: Uuid) -> AppResult<Option<Account>> {
    let tables = self.tables.read();
    Ok(tables.users.iter().find(|u| u.id == id).map(|u| tables.account(u)))
  }

  async fn find_account_by_username(&self, username: &str) -> AppResult<Option<Account>> {
    let tables = self.tables.read();
    Ok(tables.users.iter().find(|u| u.username == username).map(|u| tables.account(u)))
  }

  async fn insert_account(&self, new_user: NewUser) -> AppResult<Account> {
    let mut tables = self.tables.write();
    if tables.users.iter().any(|u| u.username == new_user.username) {
      return Err(AppError::field("username", "A user with that username already exists."));
    }
    if tables.users.iter().any(|u| u.email == new_user.email) {
      return Err(AppError::field("email", "A user with that email already exists."));
    }
    let now = Utc::now();
    let user = User {
      id: Uuid::new_v4(),
      username: new_user.username,
      email: new_user.email,
      first_name: new_user.first_name,
      last_name: new_user.last_name,
      password_hash: new_user.password_hash,
      is_active: new_user.is_active,
      is_staff: new_user.is_staff,
      is_superuser: new_user.is_superuser,
      created_at: now,
      updated_at: now,
    };
    let profile = UserProfile {
      is_email_verified: new_user.email_verified,
      ..UserProfile::default()
    };
    tables.profiles.insert(user.id, profile.clone());
    tables.users.push(user.clone());
    Ok(Account { user, profile })
  }

  async fn activate_account(&self, id: Uuid) -> AppResult<Option<Account>> {
    let mut tables = self.tables.write();
    let Some(index) = tables.users.iter().position(|u| u.id == id) else {
      return Ok(None);
    };
    let user = &mut tables.users[index];
    if user.is_active {
      return Ok(None);
    }
    user.is_active = true;
    user.updated_at = Utc::now();
    tables.profiles.entry(id).or_default().is_email_verified = true;
    let user = tables.users[index].clone();
    Ok(Some(tables.account(&user)))
  }

  async fn update_account(&self, id: Uuid, changes: &AccountChanges) -> AppResult<Account> {
    let mut tables = self.tables.write();
    let index = tables.user_index(id)?;
    if let Some(email) = &changes.email {
      if tables.users.iter().any(|u| &u.email == email && u.id != id) {
        return Err(AppError::field("email", "A user with that email already exists."));
      }
    }
    // Work on copies so nothing is written unless everything applies.
    let mut user = tables.users[index].clone();
    let mut profile = tables.profiles.get(&id).cloned().unwrap_or_default();
    changes.apply(&mut user, &mut profile);
    user.updated_at = Utc::now();
    tables.users[index] = user.clone();
    tables.profiles.insert(id, profile.clone());
    Ok(Account { user, profile })
  }

  async fn set_roles(&self, id: Uuid, is_staff: bool, is_superuser: bool) -> AppResult<()> {
    let mut tables = self.tables.write();
    let index = tables.user_index(id)?;
    let user = &mut tables.users[index];
    user.is_staff = is_staff;
    user.is_superuser = is_superuser;
    user.updated_at = Utc::now();
    Ok(())
  }

  async fn restore_superuser(&self, id: Uuid, password_hash: &str) -> AppResult<()> {
    let mut tables = self.tables.write();
    let index = tables.user_index(id)?;
    let user = &mut tables.users[index];
    user.is_staff = true;
    user.is_superuser = true;
    user.password_hash = password_hash.to_string();
    user.updated_at = Utc::now();
    Ok(())
  }

  async fn list_role_holders(&self, admin_username: &str) -> AppResult<Vec<User>> {
    let tables = self.tables.read();
    let mut holders: Vec<User> = tables
      .users
      .iter()
      .filter(|u| u.is_superuser || u.username == admin_username)
      .cloned()
      .collect();
    holders.sort_by(|a, b| a.username.cmp(&b.username));
    Ok(holders)
  }

  async fn list_staff(&self) -> AppResult<Vec<Account>> {
    let tables = self.tables.read();
    let mut staff: Vec<&User> = tables.users.iter().filter(|u| u.is_staff).collect();
    staff.sort_by(|a, b| b.is_superuser.cmp(&a.is_superuser).then_with(|| a.username.cmp(&b.username)));
    Ok(staff.into_iter().map(|u| tables.account(u)).collect())
  }

  async fn count_roles(&self) -> AppResult<(i64, i64)> {
    let tables = self.tables.read();
    let superusers = tables.users.iter().filter(|u| u.is_superuser).count() as i64;
    let staff_admins = tables.users.iter().filter(|u| u.is_staff && !u.is_superuser).count() as i64;
    Ok((superusers, staff_admins))
  }

  async fn issue_auth_token(&self, user_id: Uuid) -> AppResult<String> {
    let mut tables = self.tables.write();
    tables.user_index(user_id)?;
    if let Some((key, _)) = tables.tokens.iter().find(|(_, owner)| **owner == user_id) {
      return Ok(key.clone());
    }
    let key = auth_service::generate_token_key();
    tables.tokens.insert(key.clone(), user_id);
    Ok(key)
  }

  async fn account_for_token(&self, key: &str) -> AppResult<Option<Account>> {
    let tables = self.tables.read();
    let Some(user_id) = tables.tokens.get(key) else {
      return Ok(None);
    };
    Ok(tables.users.iter().find(|u| u.id == *user_id).map(|u| tables.account(u)))
  }
}

#[async_trait]
impl CatalogStore for MemoryStore {
  async fn list_categories(&self) -> AppResult<Vec<Category>> {
    let mut categories = self.tables.read().categories.clone();
    categories.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(categories)
  }

  async fn find_category_by_slug(&self, slug: &str) -> AppResult<Option<Category>> {
    Ok(self.tables.read().categories.iter().find(|c| c.slug == slug).cloned())
  }

  async fn category_exists(&self, id: Uuid) -> AppResult<bool> {
    Ok(self.tables.read().categories.iter().any(|c| c.id == id))
  }

  async fn create_category(&self, name: &str, slug: &str) -> AppResult<Category> {
    let mut tables = self.tables.write();
    tables.check_category_unique(name, slug, None)?;
    let category = Category {
      id: Uuid::new_v4(),
      name: name.to_string(),
      slug: slug.to_string(),
    };
    tables.categories.push(category.clone());
    Ok(category)
  }

  async fn update_category(&self, slug: &str, changes: &CategoryChanges) -> AppResult<Option<Category>> {
    let mut tables = self.tables.write();
    let Some(index) = tables.categories.iter().position(|c| c.slug == slug) else {
      return Ok(None);
    };
    let mut category = tables.categories[index].clone();
    if let Some(name) = &changes.name {
      category.name = name.clone();
    }
    if let Some(new_slug) = &changes.slug {
      category.slug = new_slug.clone();
    }
    tables.check_category_unique(&category.name, &category.slug, Some(category.id))?;
    tables.categories[index] = category.clone();
    Ok(Some(category))
  }

  async fn delete_category(&self, slug: &str) -> AppResult<bool> {
    let mut tables = self.tables.write();
    let Some(index) = tables.categories.iter().position(|c| c.slug == slug) else {
      return Ok(false);
    };
    let removed = tables.categories.remove(index);
    tables.products.retain(|p| p.category_id != removed.id);
    Ok(true)
  }

  async fn get_or_create_category(&self, slug: &str, name: &str) -> AppResult<(Category, bool)> {
    let mut tables = self.tables.write();
    if let Some(existing) = tables.categories.iter().find(|c| c.slug == slug) {
      return Ok((existing.clone(), false));
    }
    tables.check_category_unique(name, slug, None)?;
    let category = Category {
      id: Uuid::new_v4(),
      name: name.to_string(),
      slug: slug.to_string(),
    };
    tables.categories.push(category.clone());
    Ok((category, true))
  }

  async fn list_products(&self, category_slug: Option<&str>) -> AppResult<Vec<Product>> {
    let tables = self.tables.read();
    let category_id = match category_slug {
      Some(slug) => match tables.categories.iter().find(|c| c.slug == slug) {
        Some(category) => Some(category.id),
        None => return Ok(Vec::new()),
      },
      None => None,
    };
    let mut products: Vec<Product> = tables
      .products
      .iter()
      .filter(|p| category_id.map_or(true, |id| p.category_id == id))
      .map(|p| tables.with_category_name(p))
      .collect();
    products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(products)
  }

  async fn find_product(&self, id: Uuid) -> AppResult<Option<Product>> {
    let tables = self.tables.read();
    Ok(tables.products.iter().find(|p| p.id == id).map(|p| tables.with_category_name(p)))
  }

  async fn create_product(&self, draft: &ProductDraft) -> AppResult<Product> {
    let mut tables = self.tables.write();
    tables.require_category(draft.category_id)?;
    let now = Utc::now();
    let product = Product {
      id: Uuid::new_v4(),
      name: draft.name.clone(),
      description: draft.description.clone(),
      price: draft.price,
      original_price: draft.original_price,
      has_discount: draft.has_discount,
      discount_percentage: draft.discount_percentage,
      image: draft.image.clone(),
      stock: draft.stock,
      category_id: draft.category_id,
      category_name: String::new(),
      created_at: now,
      updated_at: now,
    };
    tables.products.push(product.clone());
    Ok(tables.with_category_name(&product))
  }

  async fn update_product(&self, id: Uuid, draft: &ProductDraft) -> AppResult<Option<Product>> {
    let mut tables = self.tables.write();
    let Some(index) = tables.products.iter().position(|p| p.id == id) else {
      return Ok(None);
    };
    tables.require_category(draft.category_id)?;
    let product = &mut tables.products[index];
    product.name = draft.name.clone();
    product.description = draft.description.clone();
    product.price = draft.price;
    product.original_price = draft.original_price;
    product.has_discount = draft.has_discount;
    product.discount_percentage = draft.discount_percentage;
    product.image = draft.image.clone();
    product.stock = draft.stock;
    product.category_id = draft.category_id;
    product.updated_at = Utc::now();
    let product = tables.products[index].clone();
    Ok(Some(tables.with_category_name(&product)))
  }

  async fn delete_product(&self, id: Uuid) -> AppResult<bool> {
    let mut tables = self.tables.write();
    let before = tables.products.len();
    tables.products.retain(|p| p.id != id);
    Ok(tables.products.len() != before)
  }

  async fn count_products(&self) -> AppResult<i64> {
    Ok(self.tables.read().products.len() as i64)
  }

  async fn list_payment_methods(&self) -> AppResult<Vec<PaymentMethod>> {
    let mut methods = self.tables.read().payment_methods.clone();
    methods.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(methods)
  }

  async fn find_payment_method(&self, id: Uuid) -> AppResult<Option<PaymentMethod>> {
    Ok(self.tables.read().payment_methods.iter().find(|m| m.id == id).cloned())
  }

  async fn create_payment_method(&self, draft: &PaymentMethodDraft) -> AppResult<PaymentMethod> {
    let method = PaymentMethod {
      id: Uuid::new_v4(),
      name: draft.name.clone(),
      description: draft.description.clone(),
      icon: draft.icon.clone(),
    };
    self.tables.write().payment_methods.push(method.clone());
    Ok(method)
  }

  async fn update_payment_method(&self, id: Uuid, draft: &PaymentMethodDraft) -> AppResult<Option<PaymentMethod>> {
    let mut tables = self.tables.write();
    let Some(method) = tables.payment_methods.iter_mut().find(|m| m.id == id) else {
      return Ok(None);
    };
    method.name = draft.name.clone();
    method.description = draft.description.clone();
    method.icon = draft.icon.clone();
    Ok(Some(method.clone()))
  }

  async fn delete_payment_method(&self, id: Uuid) -> AppResult<bool> {
    let mut tables = self.tables.write();
    let before = tables.payment_methods.len();
    tables.payment_methods.retain(|m| m.id != id);
    Ok(tables.payment_methods.len() != before)
  }

  async fn get_or_create_payment_method(&self, name: &str, description: &str) -> AppResult<(PaymentMethod, bool)> {
    let mut tables = self.tables.write();
    if let Some(existing) = tables.payment_methods.iter().find(|m| m.name == name) {
      return Ok((existing.clone(), false));
    }
    let method = PaymentMethod {
      id: Uuid::new_v4(),
      name: name.to_string(),
      description: description.to_string(),
      icon: None,
    };
    tables.payment_methods.push(method.clone());
    Ok((method, true))
  }
}
