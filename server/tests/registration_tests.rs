// tests/registration_tests.rs

mod common;

use common::{test_state, RecordingMailer, TEST_PASSWORD};
use electro_flow::{ContextData, PipelineResult};
use std::sync::Arc;
use todo_electro::errors::AppError;
use todo_electro::models::AccountStatus;
use todo_electro::pipelines::contexts::RegistrationCtxData;
use todo_electro::state::AppState;

async fn register(
  state: &AppState,
  username: &str,
  email: &str,
  password: &str,
  password2: &str,
) -> (ContextData<RegistrationCtxData>, Result<PipelineResult, AppError>) {
  let ctx_data = ContextData::new(RegistrationCtxData::new(
    state.clone(),
    username.to_string(),
    email.to_string(),
    password.to_string(),
    password2.to_string(),
  ));
  let result = state.flows.run(ctx_data.clone()).await;
  (ctx_data, result)
}

#[tokio::test]
async fn valid_registration_creates_pending_user_and_sends_one_email() {
  let mailer = Arc::new(RecordingMailer::default());
  let state = test_state(mailer.clone());

  let (ctx_data, result) = register(&state, "maria", "maria@example.com", TEST_PASSWORD, TEST_PASSWORD).await;
  assert_eq!(result.unwrap(), PipelineResult::Completed);

  let account = ctx_data.with(|c| c.account.clone()).unwrap();
  assert!(!account.user.is_active);
  assert!(!account.profile.is_email_verified);
  assert_eq!(account.status(), AccountStatus::Pending);
  assert_ne!(account.user.password_hash, TEST_PASSWORD);
  assert!(ctx_data.with(|c| c.verification_email_sent));

  let sent = mailer.sent();
  assert_eq!(sent.len(), 1);
  assert_eq!(sent[0].to, "maria@example.com");
  assert!(sent[0].body.contains("http://api.test/api/users/verify/"));
}

#[tokio::test]
async fn mismatched_passwords_fail_without_creating_user() {
  let mailer = Arc::new(RecordingMailer::default());
  let state = test_state(mailer.clone());

  let (_, result) = register(&state, "maria", "maria@example.com", TEST_PASSWORD, "Otra-Clave-99").await;
  let err = result.unwrap_err();
  let fields = err.field_errors().expect("validation error");
  assert_eq!(fields["password"], vec!["Password fields didn't match.".to_string()]);

  assert!(!state.store.username_exists("maria").await.unwrap());
  assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn duplicate_email_and_username_are_reported_together() {
  let mailer = Arc::new(RecordingMailer::default());
  let state = test_state(mailer.clone());
  let (_, first) = register(&state, "maria", "maria@example.com", TEST_PASSWORD, TEST_PASSWORD).await;
  first.unwrap();

  let (_, second) = register(&state, "maria", "maria@example.com", TEST_PASSWORD, TEST_PASSWORD).await;
  let err = second.unwrap_err();
  let fields = err.field_errors().unwrap();
  assert!(fields.contains_key("email"));
  assert!(fields.contains_key("username"));
  assert_eq!(mailer.sent().len(), 1);
}

#[tokio::test]
async fn weak_password_and_bad_email_are_rejected() {
  let state = test_state(Arc::new(RecordingMailer::default()));

  let (_, result) = register(&state, "maria", "not-an-email", "12345", "12345").await;
  let err = result.unwrap_err();
  let fields = err.field_errors().unwrap();
  assert_eq!(fields["email"], vec!["Enter a valid email address.".to_string()]);
  assert!(fields["password"].len() >= 2);
  assert!(!state.store.username_exists("maria").await.unwrap());
}

#[tokio::test]
async fn email_failure_keeps_the_pending_account() {
  let mailer = Arc::new(RecordingMailer::failing());
  let state = test_state(mailer.clone());

  let (ctx_data, result) = register(&state, "maria", "maria@example.com", TEST_PASSWORD, TEST_PASSWORD).await;
  assert_eq!(result.unwrap(), PipelineResult::Completed);
  assert!(!ctx_data.with(|c| c.verification_email_sent));

  let stored = state.store.find_account_by_username("maria").await.unwrap().unwrap();
  assert_eq!(stored.status(), AccountStatus::Pending);
}
