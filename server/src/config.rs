// src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;

/// `DATABASE_URL` value that selects the in-process store.
pub const MEMORY_DATABASE_URL: &str = "memory";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
  Pretty,
  Json,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,
  /// Public base URL of this API, used to build verification links.
  pub app_base_url: String,
  /// Frontend base URL; verification redirects land on `{frontend_url}/login`.
  pub frontend_url: String,

  /// Key for signing verification tokens.
  pub secret_key: String,
  pub verification_token_ttl_secs: u64,

  pub email_sender: String,

  /// Password given to the canonical `admin` account by the bootstrap commands.
  pub bootstrap_admin_password: String,

  pub seed_db: bool,
  pub log_format: LogFormat,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();

    let get_env = |var_name: &str| {
      env::var(var_name).map_err(|e| AppError::Config(format!("Missing environment variable '{}': {}", var_name, e)))
    };

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = get_env("SERVER_PORT")
      .unwrap_or_else(|_| "8000".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
    let database_url = get_env("DATABASE_URL")?;
    let app_base_url = get_env("APP_BASE_URL").unwrap_or_else(|_| format!("http://{}:{}", server_host, server_port));
    let frontend_url = get_env("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:5173".to_string());

    let secret_key = get_env("SECRET_KEY")?;
    if secret_key.trim().is_empty() {
      return Err(AppError::Config("SECRET_KEY must not be empty".to_string()));
    }
    let verification_token_ttl_secs = get_env("VERIFICATION_TOKEN_TTL_SECS")
      .unwrap_or_else(|_| "259200".to_string())
      .parse::<u64>()
      .map_err(|e| AppError::Config(format!("Invalid VERIFICATION_TOKEN_TTL_SECS: {}", e)))?;

    let email_sender = get_env("EMAIL_SENDER").unwrap_or_else(|_| "noreply@todoelectro.local".to_string());
    let bootstrap_admin_password = get_env("BOOTSTRAP_ADMIN_PASSWORD").unwrap_or_else(|_| "admin".to_string());

    let seed_db = get_env("SEED_DB")
      .unwrap_or_else(|_| "false".to_string())
      .parse::<bool>()
      .map_err(|e| AppError::Config(format!("Invalid SEED_DB value: {}", e)))?;

    let log_format = match get_env("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()).as_str() {
      "pretty" => LogFormat::Pretty,
      "json" => LogFormat::Json,
      other => return Err(AppError::Config(format!("Invalid LOG_FORMAT '{}': expected 'pretty' or 'json'", other))),
    };

    Ok(Self {
      server_host,
      server_port,
      database_url,
      app_base_url: app_base_url.trim_end_matches('/').to_string(),
      frontend_url: frontend_url.trim_end_matches('/').to_string(),
      secret_key,
      verification_token_ttl_secs,
      email_sender,
      bootstrap_admin_password,
      seed_db,
      log_format,
    })
  }

  pub fn uses_memory_store(&self) -> bool {
    self.database_url == MEMORY_DATABASE_URL
  }

  pub fn server_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }
}
