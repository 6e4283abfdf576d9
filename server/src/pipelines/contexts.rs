// src/pipelines/contexts.rs

//! Data structs the pipelines operate on. Handlers receive them wrapped in
//! `electro_flow::ContextData`.

use crate::models::{Account, AccountChanges, RoleSummary, User};
use crate::services::role_policy::RoleChange;
use crate::state::AppState;
use uuid::Uuid;

#[derive(Clone)]
pub struct RegistrationCtxData {
  pub app_state: AppState,
  pub username: String,
  pub email: String,
  pub password: String,
  pub password2: String,
  pub account: Option<Account>,
  pub verification_link: Option<String>,
  pub verification_email_sent: bool,
}

impl RegistrationCtxData {
  pub fn new(app_state: AppState, username: String, email: String, password: String, password2: String) -> Self {
    Self {
      app_state,
      username,
      email,
      password,
      password2,
      account: None,
      verification_link: None,
      verification_email_sent: false,
    }
  }
}

/// Why a verification attempt was turned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationFailure {
  MalformedIdentifier,
  UnknownUser,
  InvalidToken,
}

#[derive(Clone)]
pub struct VerificationCtxData {
  pub app_state: AppState,
  pub encoded_uid: String,
  pub token: String,
  pub user_id: Option<Uuid>,
  pub subject: Option<User>,
  pub activated: Option<Account>,
  pub failure: Option<VerificationFailure>,
}

impl VerificationCtxData {
  pub fn new(app_state: AppState, encoded_uid: String, token: String) -> Self {
    Self {
      app_state,
      encoded_uid,
      token,
      user_id: None,
      subject: None,
      activated: None,
      failure: None,
    }
  }
}

#[derive(Clone)]
pub struct SigninCtxData {
  pub app_state: AppState,
  pub username: String,
  pub password: String,
  pub account: Option<Account>,
  pub token: Option<String>,
}

impl SigninCtxData {
  pub fn new(app_state: AppState, username: String, password: String) -> Self {
    Self {
      app_state,
      username,
      password,
      account: None,
      token: None,
    }
  }
}

#[derive(Clone)]
pub struct ProfileUpdateCtxData {
  pub app_state: AppState,
  pub user_id: Uuid,
  pub changes: AccountChanges,
  pub updated: Option<Account>,
}

impl ProfileUpdateCtxData {
  pub fn new(app_state: AppState, user_id: Uuid, changes: AccountChanges) -> Self {
    Self {
      app_state,
      user_id,
      changes,
      updated: None,
    }
  }
}

/// Role requested for an admin-provisioned account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminRole {
  Admin,
  SuperAdmin,
}

impl AdminRole {
  pub fn parse(value: &str) -> Option<Self> {
    match value {
      "admin" => Some(Self::Admin),
      "superadmin" => Some(Self::SuperAdmin),
      _ => None,
    }
  }
}

#[derive(Clone)]
pub struct AdminProvisioningCtxData {
  pub app_state: AppState,
  pub requester: Account,
  pub name: String,
  pub email: String,
  pub password: String,
  pub role: String,
  pub created: Option<Account>,
}

#[derive(Clone)]
pub struct AdminRolesCtxData {
  pub app_state: AppState,
  pub holders: Vec<User>,
  pub plan: Vec<RoleChange>,
  pub summary: Option<RoleSummary>,
}

impl AdminRolesCtxData {
  pub fn new(app_state: AppState) -> Self {
    Self {
      app_state,
      holders: Vec::new(),
      plan: Vec::new(),
      summary: None,
    }
  }
}
