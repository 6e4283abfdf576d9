// src/pipelines/registration_pipeline.rs

use crate::errors::{push_field_error, AppError, FieldErrors, Result as AppResult};
use crate::models::NewUser;
use crate::pipelines::common_steps;
use crate::pipelines::contexts::RegistrationCtxData;
use crate::services::verification_token::encode_uid;
use crate::services::{auth_service, password_policy};
use electro_flow::{ContextData, FlowResult, Flows, Pipeline, PipelineControl};
use tracing::{info, instrument, warn};

/// Registers self-service registration: an inactive account plus one verification email.
pub fn register_registration_pipeline(flows: &Flows<AppError>) -> FlowResult<()> {
  let mut pipeline = Pipeline::<RegistrationCtxData, AppError>::new(&[
    ("validate_registration_input", false, None),
    ("check_existing_account", false, None),
    ("create_pending_user", false, None),
    ("issue_verification_token", false, None),
    // Delivery problems must not undo the account created above.
    ("send_verification_email", true, None),
  ]);

  pipeline.on_root("validate_registration_input", validate_registration_input)?;
  pipeline.on_root("check_existing_account", check_existing_account)?;
  pipeline.on_root("create_pending_user", create_pending_user)?;
  pipeline.on_root("issue_verification_token", issue_verification_token)?;
  pipeline.on_root("send_verification_email", send_verification_email)?;

  flows.register_pipeline(pipeline);
  tracing::info!("Registration pipeline registered.");
  Ok(())
}

#[instrument(name = "registration::validate_input", skip_all, err(Display))]
async fn validate_registration_input(ctx_data: ContextData<RegistrationCtxData>) -> AppResult<PipelineControl> {
  let (username, email, password, password2) = ctx_data.with(|c| {
    (
      c.username.clone(),
      c.email.clone(),
      c.password.clone(),
      c.password2.clone(),
    )
  });

  let mut errors = FieldErrors::new();
  common_steps::check_username(&mut errors, &username);
  common_steps::check_email(&mut errors, &email);
  if password.is_empty() {
    push_field_error(&mut errors, "password", common_steps::BLANK_FIELD);
  } else if password != password2 {
    push_field_error(&mut errors, "password", "Password fields didn't match.");
  } else {
    for problem in password_policy::check_password(&password, &[&username, &email]) {
      push_field_error(&mut errors, "password", problem);
    }
  }

  if errors.is_empty() {
    Ok(PipelineControl::Continue)
  } else {
    warn!(fields = ?errors.keys().collect::<Vec<_>>(), "Registration input rejected.");
    Err(AppError::Validation(errors))
  }
}

#[instrument(name = "registration::check_existing_account", skip_all, err(Display))]
async fn check_existing_account(ctx_data: ContextData<RegistrationCtxData>) -> AppResult<PipelineControl> {
  let (store, username, email) = ctx_data.with(|c| (c.app_state.store.clone(), c.username.clone(), c.email.clone()));
  common_steps::ensure_account_available(store.as_ref(), &username, &email).await?;
  Ok(PipelineControl::Continue)
}

#[instrument(name = "registration::create_pending_user", skip_all, err(Display))]
async fn create_pending_user(ctx_data: ContextData<RegistrationCtxData>) -> AppResult<PipelineControl> {
  let (store, username, email, password) = ctx_data.with(|c| {
    (
      c.app_state.store.clone(),
      c.username.clone(),
      c.email.clone(),
      c.password.clone(),
    )
  });

  let password_hash = auth_service::hash_password(&password)?;
  let account = store.insert_account(NewUser::pending(username, email, password_hash)).await?;
  info!(user_id = %account.id(), username = %account.user.username, "Pending account created.");

  ctx_data.write().account = Some(account);
  Ok(PipelineControl::Continue)
}

#[instrument(name = "registration::issue_verification_token", skip_all, err(Display))]
async fn issue_verification_token(ctx_data: ContextData<RegistrationCtxData>) -> AppResult<PipelineControl> {
  let (tokens, base_url, account) = ctx_data.with(|c| {
    (
      c.app_state.tokens.clone(),
      c.app_state.config.app_base_url.clone(),
      c.account.clone(),
    )
  });
  let account = account.ok_or_else(|| AppError::Internal("Verification token requested before account creation.".to_string()))?;

  let token = tokens.make_token(&account.user)?;
  let link = format!("{}/api/users/verify/{}/{}/", base_url, encode_uid(account.id()), token);

  ctx_data.write().verification_link = Some(link);
  Ok(PipelineControl::Continue)
}

#[instrument(name = "registration::send_verification_email", skip_all)]
async fn send_verification_email(ctx_data: ContextData<RegistrationCtxData>) -> AppResult<PipelineControl> {
  let (app_state, account, link) = ctx_data.with(|c| (c.app_state.clone(), c.account.clone(), c.verification_link.clone()));
  let (Some(account), Some(link)) = (account, link) else {
    warn!("Skipping verification email: account or link missing from context.");
    return Ok(PipelineControl::Continue);
  };

  let sent = match common_steps::send_verification_email(&app_state, &account.user.email, &account.user.username, &link).await {
    Ok(_) => true,
    Err(e) => {
      warn!(error = %e, user_id = %account.id(), "Verification email could not be sent; the account stays pending.");
      false
    }
  };
  ctx_data.write().verification_email_sent = sent;
  Ok(PipelineControl::Continue)
}
