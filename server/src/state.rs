// src/state.rs

use crate::config::AppConfig;
use crate::errors::{AppError, Result as AppResult};
use crate::pipelines;
use crate::services::email::Mailer;
use crate::services::verification_token::TokenGenerator;
use crate::store::Store;
use electro_flow::Flows;
use std::sync::Arc;

/// Shared application state, cloned into every request and pipeline context.
#[derive(Clone)]
pub struct AppState {
  pub store: Arc<dyn Store>,
  pub flows: Arc<Flows<AppError>>,
  pub config: Arc<AppConfig>,
  pub mailer: Arc<dyn Mailer>,
  pub tokens: Arc<TokenGenerator>,
}

impl AppState {
  /// Builds the state and registers every workflow pipeline.
  pub fn new(config: AppConfig, store: Arc<dyn Store>, mailer: Arc<dyn Mailer>) -> AppResult<Self> {
    let flows = Flows::<AppError>::new();
    pipelines::register_all_pipelines(&flows)?;
    let tokens = TokenGenerator::new(&config.secret_key, config.verification_token_ttl_secs);
    Ok(Self {
      store,
      flows: Arc::new(flows),
      config: Arc::new(config),
      mailer,
      tokens: Arc::new(tokens),
    })
  }
}
