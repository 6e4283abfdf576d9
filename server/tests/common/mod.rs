// tests/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use todo_electro::config::{AppConfig, LogFormat};
use todo_electro::errors::{AppError, Result as AppResult};
use todo_electro::models::{Account, NewUser};
use todo_electro::services::auth_service;
use todo_electro::services::email::{Mailer, OutgoingEmail, SentEmailInfo};
use todo_electro::state::AppState;
use todo_electro::store::MemoryStore;
use tracing::Level;

pub const TEST_PASSWORD: &str = "Tostadora-2024!";

/// Keeps every message it is asked to send; can be told to fail instead.
#[derive(Default)]
pub struct RecordingMailer {
  sent: Mutex<Vec<OutgoingEmail>>,
  fail: AtomicBool,
}

impl RecordingMailer {
  pub fn failing() -> Self {
    let mailer = Self::default();
    mailer.fail.store(true, Ordering::SeqCst);
    mailer
  }

  pub fn sent(&self) -> Vec<OutgoingEmail> {
    self.sent.lock().clone()
  }
}

#[async_trait]
impl Mailer for RecordingMailer {
  async fn send(&self, email: OutgoingEmail) -> AppResult<SentEmailInfo> {
    if self.fail.load(Ordering::SeqCst) {
      return Err(AppError::Email("SMTP relay unavailable".to_string()));
    }
    let info = SentEmailInfo {
      to: email.to.clone(),
      subject: email.subject.clone(),
      message_id: format!("test-{}", self.sent.lock().len()),
    };
    self.sent.lock().push(email);
    Ok(info)
  }
}

pub fn test_config() -> AppConfig {
  AppConfig {
    server_host: "127.0.0.1".to_string(),
    server_port: 8000,
    database_url: "memory".to_string(),
    app_base_url: "http://api.test".to_string(),
    frontend_url: "http://front.test".to_string(),
    secret_key: "test-secret-key".to_string(),
    verification_token_ttl_secs: 3 * 24 * 60 * 60,
    email_sender: "noreply@todoelectro.local".to_string(),
    bootstrap_admin_password: "admin".to_string(),
    seed_db: false,
    log_format: LogFormat::Pretty,
  }
}

/// Application state over a fresh in-memory store.
pub fn test_state(mailer: Arc<RecordingMailer>) -> AppState {
  setup_tracing();
  AppState::new(test_config(), Arc::new(MemoryStore::new()), mailer).unwrap()
}

/// Inserts an account directly, bypassing registration.
pub async fn insert_user(state: &AppState, username: &str, is_staff: bool, is_superuser: bool) -> Account {
  state
    .store
    .insert_account(NewUser {
      username: username.to_string(),
      email: format!("{}@example.com", username),
      first_name: String::new(),
      last_name: String::new(),
      password_hash: auth_service::hash_password(TEST_PASSWORD).unwrap(),
      is_active: true,
      is_staff,
      is_superuser,
      email_verified: true,
    })
    .await
    .unwrap()
}

/// `Authorization` header value for `account`.
pub async fn auth_header(state: &AppState, account: &Account) -> (String, String) {
  let key = state.store.issue_auth_token(account.id()).await.unwrap();
  ("Authorization".to_string(), format!("Token {}", key))
}

/// `(uid, token)` from the last verification link sent to `mailer`.
pub fn verification_parts(mailer: &RecordingMailer) -> (String, String) {
  let email = mailer.sent().pop().expect("no email was sent");
  let start = email.body.find("/api/users/verify/").expect("no verification link in email");
  let rest = &email.body[start + "/api/users/verify/".len()..];
  let mut parts = rest.split('/');
  let uid = parts.next().unwrap().to_string();
  let token = parts.next().unwrap().to_string();
  (uid, token)
}

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
