// src/main.rs

use actix_web::{web as actix_data, App, HttpServer};
use anyhow::Context;
use std::sync::Arc;
use todo_electro::config::AppConfig;
use todo_electro::services::email::LogMailer;
use todo_electro::state::AppState;
use todo_electro::{commands, store, telemetry, web};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  let app_config = AppConfig::from_env().context("Failed to load application configuration")?;
  telemetry::init(app_config.log_format);
  tracing::info!("Starting Todo Electro server...");

  let store = store::connect(&app_config).await.context("Failed to open the data store")?;
  let seed_db = app_config.seed_db;
  let app_state = AppState::new(app_config, store, Arc::new(LogMailer)).context("Failed to build application state")?;

  if seed_db {
    let outcome = commands::seed_demo_data(&app_state).await;
    if !outcome.success {
      tracing::error!(messages = ?outcome.messages, "Database seeding failed.");
    }
  }

  let server_address = app_state.config.server_address();
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .app_data(web::json_config())
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(web::configure_app_routes)
  })
  .bind(&server_address)
  .with_context(|| format!("Failed to bind {}", server_address))?
  .run()
  .await?;

  Ok(())
}
