// src/pipelines/profile_pipeline.rs

use crate::errors::{push_field_error, AppError, FieldErrors, Result as AppResult};
use crate::pipelines::common_steps;
use crate::pipelines::contexts::ProfileUpdateCtxData;
use electro_flow::{ContextData, FlowResult, Flows, Pipeline, PipelineControl, SkipCondition};
use std::sync::Arc;
use tracing::{info, instrument};

const MAX_NAME_LENGTH: usize = 150;
const MAX_PHONE_LENGTH: usize = 20;

pub fn register_profile_pipeline(flows: &Flows<AppError>) -> FlowResult<()> {
  let email_unchanged: SkipCondition<ProfileUpdateCtxData> =
    Arc::new(|ctx_data: ContextData<ProfileUpdateCtxData>| ctx_data.with(|c| c.changes.email.is_none()));

  let mut pipeline = Pipeline::<ProfileUpdateCtxData, AppError>::new(&[
    ("validate_profile_changes", false, None),
    ("check_email_available", false, Some(email_unchanged)),
    ("persist_profile_changes", false, None),
  ]);

  pipeline.on_root("validate_profile_changes", validate_profile_changes)?;
  pipeline.on_root("check_email_available", check_email_available)?;
  pipeline.on_root("persist_profile_changes", persist_profile_changes)?;

  flows.register_pipeline(pipeline);
  tracing::info!("Profile update pipeline registered.");
  Ok(())
}

#[instrument(name = "profile::validate_changes", skip_all, err(Display))]
async fn validate_profile_changes(ctx_data: ContextData<ProfileUpdateCtxData>) -> AppResult<PipelineControl> {
  let changes = ctx_data.with(|c| c.changes.clone());
  let mut errors = FieldErrors::new();

  for (field, value) in [("first_name", &changes.first_name), ("last_name", &changes.last_name)] {
    if value.as_ref().is_some_and(|v| v.chars().count() > MAX_NAME_LENGTH) {
      push_field_error(&mut errors, field, "Ensure this field has no more than 150 characters.");
    }
  }
  if let Some(email) = &changes.email {
    common_steps::check_email(&mut errors, email);
  }
  if let Some(Some(phone)) = &changes.phone {
    if phone.chars().count() > MAX_PHONE_LENGTH {
      push_field_error(&mut errors, "profile.phone", "Ensure this field has no more than 20 characters.");
    }
  }

  if errors.is_empty() {
    Ok(PipelineControl::Continue)
  } else {
    Err(AppError::Validation(errors))
  }
}

#[instrument(name = "profile::check_email_available", skip_all, err(Display))]
async fn check_email_available(ctx_data: ContextData<ProfileUpdateCtxData>) -> AppResult<PipelineControl> {
  let (store, user_id, email) = ctx_data.with(|c| (c.app_state.store.clone(), c.user_id, c.changes.email.clone()));
  if let Some(email) = email {
    if store.email_exists(&email, Some(user_id)).await? {
      return Err(AppError::field("email", "A user with that email already exists."));
    }
  }
  Ok(PipelineControl::Continue)
}

/// User and profile columns are written in a single store transaction.
#[instrument(name = "profile::persist_changes", skip_all, err(Display))]
async fn persist_profile_changes(ctx_data: ContextData<ProfileUpdateCtxData>) -> AppResult<PipelineControl> {
  let (store, user_id, changes) = ctx_data.with(|c| (c.app_state.store.clone(), c.user_id, c.changes.clone()));
  let account = store.update_account(user_id, &changes).await?;
  info!(%user_id, "Profile updated.");
  ctx_data.write().updated = Some(account);
  Ok(PipelineControl::Continue)
}
