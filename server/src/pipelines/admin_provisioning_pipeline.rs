// src/pipelines/admin_provisioning_pipeline.rs

use crate::errors::{push_field_error, AppError, FieldErrors, Result as AppResult};
use crate::models::NewUser;
use crate::pipelines::common_steps;
use crate::pipelines::contexts::{AdminProvisioningCtxData, AdminRole};
use crate::services::auth_service;
use electro_flow::{ContextData, FlowResult, Flows, Pipeline, PipelineControl};
use tracing::{info, instrument, warn};

/// Registers creation of staff accounts by a superuser. These accounts skip
/// email verification and are active immediately.
pub fn register_admin_provisioning_pipeline(flows: &Flows<AppError>) -> FlowResult<()> {
  let mut pipeline = Pipeline::<AdminProvisioningCtxData, AppError>::new(&[
    ("authorize_requester", false, None),
    ("validate_admin_input", false, None),
    ("check_existing_account", false, None),
    ("create_admin_account", false, None),
  ]);

  pipeline.on_root("authorize_requester", authorize_requester)?;
  pipeline.on_root("validate_admin_input", validate_admin_input)?;
  pipeline.on_root("check_existing_account", check_existing_account)?;
  pipeline.on_root("create_admin_account", create_admin_account)?;

  flows.register_pipeline(pipeline);
  tracing::info!("Admin provisioning pipeline registered.");
  Ok(())
}

#[instrument(name = "admin_provisioning::authorize_requester", skip_all, err(Display))]
async fn authorize_requester(ctx_data: ContextData<AdminProvisioningCtxData>) -> AppResult<PipelineControl> {
  let (requester, is_superuser) = ctx_data.with(|c| (c.requester.user.username.clone(), c.requester.user.is_superuser));
  if is_superuser {
    Ok(PipelineControl::Continue)
  } else {
    warn!(%requester, "Non-superuser attempted to create an admin account.");
    Err(AppError::Forbidden("Only superusers can create admin accounts.".to_string()))
  }
}

#[instrument(name = "admin_provisioning::validate_input", skip_all, err(Display))]
async fn validate_admin_input(ctx_data: ContextData<AdminProvisioningCtxData>) -> AppResult<PipelineControl> {
  let (name, email, password, role) =
    ctx_data.with(|c| (c.name.clone(), c.email.clone(), c.password.clone(), c.role.clone()));

  let mut errors = FieldErrors::new();
  if name.trim().is_empty() {
    push_field_error(&mut errors, "name", common_steps::BLANK_FIELD);
  } else {
    let mut username_errors = FieldErrors::new();
    common_steps::check_username(&mut username_errors, &name);
    for message in username_errors.into_values().flatten() {
      push_field_error(&mut errors, "name", message);
    }
  }
  common_steps::check_email(&mut errors, &email);
  if password.is_empty() {
    push_field_error(&mut errors, "password", common_steps::BLANK_FIELD);
  }
  if AdminRole::parse(&role).is_none() {
    push_field_error(&mut errors, "role", format!("\"{}\" is not a valid choice.", role));
  }

  if errors.is_empty() {
    Ok(PipelineControl::Continue)
  } else {
    Err(AppError::Validation(errors))
  }
}

#[instrument(name = "admin_provisioning::check_existing_account", skip_all, err(Display))]
async fn check_existing_account(ctx_data: ContextData<AdminProvisioningCtxData>) -> AppResult<PipelineControl> {
  let (store, name, email) = ctx_data.with(|c| (c.app_state.store.clone(), c.name.clone(), c.email.clone()));
  common_steps::ensure_account_available(store.as_ref(), &name, &email)
    .await
    .map_err(|e| match e {
      // The request calls the username `name`.
      AppError::Validation(mut errors) => {
        if let Some(messages) = errors.remove("username") {
          errors.insert("name".to_string(), messages);
        }
        AppError::Validation(errors)
      }
      other => other,
    })?;
  Ok(PipelineControl::Continue)
}

#[instrument(name = "admin_provisioning::create_account", skip_all, err(Display))]
async fn create_admin_account(ctx_data: ContextData<AdminProvisioningCtxData>) -> AppResult<PipelineControl> {
  let (store, name, email, password, role) = ctx_data.with(|c| {
    (
      c.app_state.store.clone(),
      c.name.clone(),
      c.email.clone(),
      c.password.clone(),
      c.role.clone(),
    )
  });
  let role = AdminRole::parse(&role).ok_or_else(|| AppError::field("role", "Invalid role."))?;

  let password_hash = auth_service::hash_password(&password)?;
  let account = store
    .insert_account(NewUser {
      username: name,
      email,
      first_name: String::new(),
      last_name: String::new(),
      password_hash,
      is_active: true,
      is_staff: true,
      is_superuser: role == AdminRole::SuperAdmin,
      email_verified: true,
    })
    .await?;
  info!(user_id = %account.id(), username = %account.user.username, ?role, "Admin account created.");

  ctx_data.write().created = Some(account);
  Ok(PipelineControl::Continue)
}
