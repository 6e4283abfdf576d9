// src/pipelines/common_steps.rs

//! Checks and side effects shared by more than one pipeline.

use crate::errors::{push_field_error, AppError, FieldErrors, Result as AppResult};
use crate::services::email::{self, SentEmailInfo};
use crate::state::AppState;
use crate::store::Store;
use tracing::{info, instrument, warn};
use validator::ValidateEmail;

pub const BLANK_FIELD: &str = "This field may not be blank.";
const MAX_USERNAME_LENGTH: usize = 150;

/// Username rules: required, at most 150 characters, letters, digits and `@.+-_` only.
pub fn check_username(errors: &mut FieldErrors, username: &str) {
  if username.trim().is_empty() {
    push_field_error(errors, "username", BLANK_FIELD);
  } else if username.chars().count() > MAX_USERNAME_LENGTH {
    push_field_error(errors, "username", "Ensure this field has no more than 150 characters.");
  } else if !username.chars().all(|c| c.is_alphanumeric() || "@.+-_".contains(c)) {
    push_field_error(
      errors,
      "username",
      "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
    );
  }
}

pub fn check_email(errors: &mut FieldErrors, email: &str) {
  if email.trim().is_empty() {
    push_field_error(errors, "email", BLANK_FIELD);
  } else if !email.validate_email() {
    push_field_error(errors, "email", "Enter a valid email address.");
  }
}

/// Fails with field errors if the username or email is already taken.
#[instrument(name = "common_step::ensure_account_available", skip(store), err(Display))]
pub async fn ensure_account_available(store: &dyn Store, username: &str, email: &str) -> AppResult<()> {
  let mut errors = FieldErrors::new();
  if store.username_exists(username).await? {
    push_field_error(&mut errors, "username", "A user with that username already exists.");
  }
  if store.email_exists(email, None).await? {
    push_field_error(&mut errors, "email", "A user with that email already exists.");
  }
  if errors.is_empty() {
    Ok(())
  } else {
    warn!(?errors, "Account identifiers already in use.");
    Err(AppError::Validation(errors))
  }
}

/// Sends the verification link to a newly registered user.
#[instrument(name = "common_step::send_verification_email", skip(app_state, link), err(Display))]
pub async fn send_verification_email(
  app_state: &AppState,
  recipient_email: &str,
  username: &str,
  link: &str,
) -> AppResult<SentEmailInfo> {
  let message = email::verification_email(&app_state.config, recipient_email, username, link);
  let sent_info = app_state.mailer.send(message).await?;
  info!(
    "Verification email sent to {}. Message ID: {}",
    sent_info.to, sent_info.message_id
  );
  Ok(sent_info)
}
