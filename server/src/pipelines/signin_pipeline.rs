// src/pipelines/signin_pipeline.rs

use crate::errors::{push_field_error, AppError, FieldErrors, Result as AppResult};
use crate::pipelines::common_steps::BLANK_FIELD;
use crate::pipelines::contexts::SigninCtxData;
use crate::services::auth_service;
use electro_flow::{ContextData, FlowResult, Flows, Pipeline, PipelineControl};
use tracing::{debug, info, instrument, warn};

/// Same message for unknown users, wrong passwords and unverified accounts.
pub const INVALID_CREDENTIALS: &str = "Unable to log in with provided credentials.";

pub fn register_signin_pipeline(flows: &Flows<AppError>) -> FlowResult<()> {
  let mut pipeline = Pipeline::<SigninCtxData, AppError>::new(&[
    ("validate_signin_input", false, None),
    ("fetch_user", false, None),
    ("verify_password", false, None),
    ("ensure_active", false, None),
    ("issue_auth_token", false, None),
  ]);

  pipeline.on_root("validate_signin_input", validate_signin_input)?;
  pipeline.on_root("fetch_user", fetch_user)?;
  pipeline.on_root("verify_password", verify_password)?;
  pipeline.on_root("ensure_active", ensure_active)?;
  pipeline.on_root("issue_auth_token", issue_auth_token)?;

  flows.register_pipeline(pipeline);
  tracing::info!("Sign-in pipeline registered.");
  Ok(())
}

#[instrument(name = "signin::validate_input", skip_all, err(Display))]
async fn validate_signin_input(ctx_data: ContextData<SigninCtxData>) -> AppResult<PipelineControl> {
  let (username_blank, password_blank) = ctx_data.with(|c| (c.username.trim().is_empty(), c.password.is_empty()));
  let mut errors = FieldErrors::new();
  if username_blank {
    push_field_error(&mut errors, "username", BLANK_FIELD);
  }
  if password_blank {
    push_field_error(&mut errors, "password", BLANK_FIELD);
  }
  if errors.is_empty() {
    Ok(PipelineControl::Continue)
  } else {
    Err(AppError::Validation(errors))
  }
}

#[instrument(name = "signin::fetch_user", skip_all, err(Display))]
async fn fetch_user(ctx_data: ContextData<SigninCtxData>) -> AppResult<PipelineControl> {
  let (store, username) = ctx_data.with(|c| (c.app_state.store.clone(), c.username.clone()));
  match store.find_account_by_username(&username).await? {
    Some(account) => {
      ctx_data.write().account = Some(account);
      Ok(PipelineControl::Continue)
    }
    None => {
      warn!(%username, "Sign-in attempt for unknown username.");
      Err(AppError::non_field(INVALID_CREDENTIALS))
    }
  }
}

#[instrument(name = "signin::verify_password", skip_all, err(Display))]
async fn verify_password(ctx_data: ContextData<SigninCtxData>) -> AppResult<PipelineControl> {
  let (password_hash, password) = ctx_data.with(|c| {
    (
      c.account.as_ref().map(|a| a.user.password_hash.clone()).unwrap_or_default(),
      c.password.clone(),
    )
  });
  if auth_service::verify_password(&password_hash, &password)? {
    debug!("Password verified.");
    Ok(PipelineControl::Continue)
  } else {
    warn!("Sign-in attempt with wrong password.");
    Err(AppError::non_field(INVALID_CREDENTIALS))
  }
}

#[instrument(name = "signin::ensure_active", skip_all, err(Display))]
async fn ensure_active(ctx_data: ContextData<SigninCtxData>) -> AppResult<PipelineControl> {
  let is_active = ctx_data.with(|c| c.account.as_ref().is_some_and(|a| a.user.is_active));
  if is_active {
    Ok(PipelineControl::Continue)
  } else {
    warn!("Sign-in attempt for an account that is not active.");
    Err(AppError::non_field(INVALID_CREDENTIALS))
  }
}

#[instrument(name = "signin::issue_auth_token", skip_all, err(Display))]
async fn issue_auth_token(ctx_data: ContextData<SigninCtxData>) -> AppResult<PipelineControl> {
  let (store, user_id) = ctx_data.with(|c| (c.app_state.store.clone(), c.account.as_ref().map(|a| a.id())));
  let user_id = user_id.ok_or_else(|| AppError::Internal("Token requested without an authenticated user.".to_string()))?;
  let token = store.issue_auth_token(user_id).await?;
  info!(%user_id, "Sign-in successful.");
  ctx_data.write().token = Some(token);
  Ok(PipelineControl::Continue)
}
