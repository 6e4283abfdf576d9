// src/web/handlers/account_handlers.rs

use actix_web::{web, HttpResponse};
use electro_flow::{ContextData, PipelineResult};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::models::AccountChanges;
use crate::pipelines::contexts::{AdminProvisioningCtxData, ProfileUpdateCtxData};
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;
use crate::web::permissions::require_staff;

#[derive(Deserialize, Debug, Default)]
pub struct ProfileFieldsPayload {
  #[serde(default, deserialize_with = "crate::models::present")]
  pub phone: Option<Option<String>>,
  #[serde(default, deserialize_with = "crate::models::present")]
  pub address: Option<Option<String>>,
}

#[derive(Deserialize, Debug, Default)]
pub struct ProfileUpdatePayload {
  pub first_name: Option<String>,
  pub last_name: Option<String>,
  pub email: Option<String>,
  #[serde(default)]
  pub profile: Option<ProfileFieldsPayload>,
}

/// Blank or null clears an optional profile field.
fn normalize_optional(value: Option<Option<String>>) -> Option<Option<String>> {
  value.map(|inner| inner.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()))
}

impl From<ProfileUpdatePayload> for AccountChanges {
  fn from(payload: ProfileUpdatePayload) -> Self {
    let profile = payload.profile.unwrap_or_default();
    AccountChanges {
      first_name: payload.first_name,
      last_name: payload.last_name,
      email: payload.email.map(|e| e.trim().to_string()),
      phone: normalize_optional(profile.phone),
      address: normalize_optional(profile.address),
    }
  }
}

fn default_role() -> String {
  "admin".to_string()
}

#[derive(Deserialize, Debug)]
pub struct CreateAdminPayload {
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub email: String,
  #[serde(default)]
  pub password: String,
  #[serde(default = "default_role")]
  pub role: String,
}

#[instrument(name = "handler::current_user", skip(auth_user), fields(user_id = %auth_user.0.id()))]
pub async fn current_user_handler(auth_user: AuthenticatedUser) -> HttpResponse {
  HttpResponse::Ok().json(auth_user.0)
}

#[instrument(name = "handler::check_staff", skip(auth_user), fields(user_id = %auth_user.0.id()))]
pub async fn check_staff_handler(auth_user: AuthenticatedUser) -> HttpResponse {
  HttpResponse::Ok().json(json!({ "is_staff": auth_user.0.user.is_staff }))
}

#[instrument(
    name = "handler::update_profile",
    skip(app_state, auth_user, req_payload),
    fields(user_id = %auth_user.0.id())
)]
pub async fn update_profile_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  req_payload: web::Json<ProfileUpdatePayload>,
) -> Result<HttpResponse, AppError> {
  let changes = AccountChanges::from(req_payload.into_inner());
  if changes.is_empty() {
    return Ok(HttpResponse::Ok().json(auth_user.0));
  }

  let ctx_data = ContextData::new(ProfileUpdateCtxData::new(
    app_state.get_ref().clone(),
    auth_user.0.id(),
    changes,
  ));
  match app_state.flows.run(ctx_data.clone()).await? {
    PipelineResult::Completed => {
      let account = ctx_data
        .with(|c| c.updated.clone())
        .ok_or_else(|| AppError::Internal("Profile update completed without a result.".to_string()))?;
      Ok(HttpResponse::Ok().json(account))
    }
    PipelineResult::Stopped => Err(AppError::Internal(
      "Profile update was halted by an internal step.".to_string(),
    )),
  }
}

#[instrument(
    name = "handler::create_admin",
    skip(app_state, auth_user, req_payload),
    fields(requester = %auth_user.0.user.username, name = %req_payload.name, role = %req_payload.role)
)]
pub async fn create_admin_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  req_payload: web::Json<CreateAdminPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = req_payload.into_inner();
  let ctx_data = ContextData::new(AdminProvisioningCtxData {
    app_state: app_state.get_ref().clone(),
    requester: auth_user.0,
    name: payload.name,
    email: payload.email,
    password: payload.password,
    role: payload.role,
    created: None,
  });

  match app_state.flows.run(ctx_data.clone()).await? {
    PipelineResult::Completed => {
      let account = ctx_data
        .with(|c| c.created.clone())
        .ok_or_else(|| AppError::Internal("Admin provisioning completed without an account.".to_string()))?;
      info!(user_id = %account.id(), "Admin account provisioned.");
      Ok(HttpResponse::Created().json(account))
    }
    PipelineResult::Stopped => Err(AppError::Internal(
      "Admin provisioning was halted by an internal step.".to_string(),
    )),
  }
}

#[instrument(name = "handler::list_admin_users", skip(app_state, auth_user), fields(user_id = %auth_user.0.id()))]
pub async fn list_admin_users_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  require_staff(&auth_user.0)?;
  let staff = app_state.store.list_staff().await?;
  Ok(HttpResponse::Ok().json(staff))
}
