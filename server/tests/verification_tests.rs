// tests/verification_tests.rs

mod common;

use actix_web::http::header::LOCATION;
use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use chrono::Utc;
use common::{test_state, verification_parts, RecordingMailer, TEST_PASSWORD};
use electro_flow::{ContextData, PipelineResult};
use std::sync::Arc;
use todo_electro::models::{Account, AccountStatus};
use todo_electro::pipelines::contexts::{RegistrationCtxData, VerificationCtxData, VerificationFailure};
use todo_electro::services::verification_token::encode_uid;
use todo_electro::state::AppState;
use uuid::Uuid;

async fn register_maria(state: &AppState) -> Account {
  let ctx_data = ContextData::new(RegistrationCtxData::new(
    state.clone(),
    "maria".to_string(),
    "maria@example.com".to_string(),
    TEST_PASSWORD.to_string(),
    TEST_PASSWORD.to_string(),
  ));
  state.flows.run(ctx_data.clone()).await.unwrap();
  ctx_data.with(|c| c.account.clone()).unwrap()
}

async fn verify(state: &AppState, uid: &str, token: &str) -> ContextData<VerificationCtxData> {
  let ctx_data = ContextData::new(VerificationCtxData::new(state.clone(), uid.to_string(), token.to_string()));
  state.flows.run(ctx_data.clone()).await.unwrap();
  ctx_data
}

#[tokio::test]
async fn token_activates_once_and_is_then_rejected() {
  let mailer = Arc::new(RecordingMailer::default());
  let state = test_state(mailer.clone());
  let account = register_maria(&state).await;
  let (uid, token) = verification_parts(&mailer);

  let first = verify(&state, &uid, &token).await;
  let activated = first.with(|c| c.activated.clone()).expect("account activated");
  assert_eq!(activated.id(), account.id());
  assert!(activated.user.is_active);
  assert!(activated.profile.is_email_verified);

  let second = verify(&state, &uid, &token).await;
  assert_eq!(second.with(|c| c.failure), Some(VerificationFailure::InvalidToken));
  assert!(second.with(|c| c.activated.is_none()));

  let stored = state.store.find_account(account.id()).await.unwrap().unwrap();
  assert_eq!(stored.status(), AccountStatus::Active);
}

#[tokio::test]
async fn concurrent_uses_of_one_link_activate_once() {
  let mailer = Arc::new(RecordingMailer::default());
  let state = test_state(mailer.clone());
  register_maria(&state).await;
  let (uid, token) = verification_parts(&mailer);

  let (a, b) = tokio::join!(verify(&state, &uid, &token), verify(&state, &uid, &token));
  let activations = [&a, &b].iter().filter(|run| run.with(|c| c.activated.is_some())).count();
  assert_eq!(activations, 1);
  let failures: Vec<_> = [&a, &b].iter().filter_map(|run| run.with(|c| c.failure)).collect();
  assert_eq!(failures, vec![VerificationFailure::InvalidToken]);
}

#[tokio::test]
async fn activation_applies_only_to_inactive_accounts() {
  let state = test_state(Arc::new(RecordingMailer::default()));
  let account = register_maria(&state).await;

  let activated = state.store.activate_account(account.id()).await.unwrap();
  assert!(activated.is_some_and(|a| a.user.is_active && a.profile.is_email_verified));
  assert!(state.store.activate_account(account.id()).await.unwrap().is_none());
  assert!(state.store.activate_account(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn malformed_unknown_and_tampered_inputs_fail_without_side_effects() {
  let mailer = Arc::new(RecordingMailer::default());
  let state = test_state(mailer.clone());
  let account = register_maria(&state).await;
  let (uid, token) = verification_parts(&mailer);

  let malformed = verify(&state, "%%%", &token).await;
  assert_eq!(malformed.with(|c| c.failure), Some(VerificationFailure::MalformedIdentifier));

  let unknown = verify(&state, &encode_uid(Uuid::new_v4()), &token).await;
  assert_eq!(unknown.with(|c| c.failure), Some(VerificationFailure::UnknownUser));

  let mut tampered = token.clone();
  let last = tampered.pop().unwrap();
  tampered.push(if last == 'a' { 'b' } else { 'a' });
  let tampered_run = verify(&state, &uid, &tampered).await;
  assert_eq!(tampered_run.with(|c| c.failure), Some(VerificationFailure::InvalidToken));

  let stored = state.store.find_account(account.id()).await.unwrap().unwrap();
  assert_eq!(stored.status(), AccountStatus::Pending);
}

#[tokio::test]
async fn expired_token_is_rejected() {
  let mailer = Arc::new(RecordingMailer::default());
  let state = test_state(mailer.clone());
  let account = register_maria(&state).await;

  let ttl = state.config.verification_token_ttl_secs;
  let issued_at = Utc::now().timestamp() as u64 - ttl - 60;
  let stale = state.tokens.make_token_at(&account.user, issued_at).unwrap();

  let run = verify(&state, &encode_uid(account.id()), &stale).await;
  assert_eq!(run.with(|c| c.failure), Some(VerificationFailure::InvalidToken));
}

#[tokio::test]
async fn stopped_verification_reports_stopped() {
  let state = test_state(Arc::new(RecordingMailer::default()));
  let ctx_data = ContextData::new(VerificationCtxData::new(state.clone(), "bad".to_string(), "1-00".to_string()));
  assert_eq!(state.flows.run(ctx_data).await.unwrap(), PipelineResult::Stopped);
}

#[actix_rt::test]
async fn verify_endpoint_redirects_to_frontend_login() {
  let mailer = Arc::new(RecordingMailer::default());
  let state = test_state(mailer.clone());
  register_maria(&state).await;
  let (uid, token) = verification_parts(&mailer);

  let app = test::init_service(
    App::new()
      .app_data(web::Data::new(state.clone()))
      .configure(todo_electro::web::configure_app_routes),
  )
  .await;

  let uri = format!("/api/users/verify/{}/{}/", uid, token);
  let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
  assert_eq!(resp.status(), StatusCode::FOUND);
  assert_eq!(resp.headers().get(LOCATION).unwrap(), "http://front.test/login?verified=1");

  let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
  assert_eq!(resp.headers().get(LOCATION).unwrap(), "http://front.test/login?verified=0");
}
