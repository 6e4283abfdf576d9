// src/bin/electro_admin.rs

//! Administrative commands for the Todo Electro backend.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::sync::Arc;
use todo_electro::commands::{self, CommandOutcome};
use todo_electro::config::AppConfig;
use todo_electro::services::email::LogMailer;
use todo_electro::state::AppState;
use todo_electro::store::{self, PgStore};
use todo_electro::telemetry;

#[derive(Parser, Debug)]
#[command(name = "electro-admin", version, about = "Todo Electro administrative commands")]
struct Cli {
  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Create the `admin` superuser, or restore its rights and reset its password.
  CreateSuperuser,
  /// Keep superuser rights on `admin` only; demote every other superuser to staff.
  EnforceAdminRoles,
  /// Seed the admin account, categories, payment methods and demo products.
  SeedDemoData,
  /// Apply pending database migrations.
  Migrate,
}

fn report(outcome: &CommandOutcome) -> ExitCode {
  for message in &outcome.messages {
    println!("{}", message);
  }
  if outcome.success {
    ExitCode::SUCCESS
  } else {
    ExitCode::FAILURE
  }
}

async fn migrate(config: &AppConfig) -> anyhow::Result<CommandOutcome> {
  anyhow::ensure!(!config.uses_memory_store(), "The in-memory store has no migrations to run");
  let pg = PgStore::connect(&config.database_url).await?;
  pg.migrate().await?;
  Ok(CommandOutcome {
    success: true,
    messages: vec!["Migrations applied.".to_string()],
  })
}

async fn build_state(config: AppConfig) -> anyhow::Result<AppState> {
  let store = store::connect(&config).await.context("Failed to open the data store")?;
  Ok(AppState::new(config, store, Arc::new(LogMailer))?)
}

async fn run(cli: Cli) -> anyhow::Result<CommandOutcome> {
  let config = AppConfig::from_env().context("Failed to load configuration")?;
  telemetry::init(config.log_format);

  match cli.command {
    Command::Migrate => migrate(&config).await,
    Command::CreateSuperuser => Ok(commands::create_superuser(&build_state(config).await?).await),
    Command::EnforceAdminRoles => Ok(commands::enforce_admin_roles(&build_state(config).await?).await),
    Command::SeedDemoData => Ok(commands::seed_demo_data(&build_state(config).await?).await),
  }
}

#[tokio::main]
async fn main() -> ExitCode {
  let cli = Cli::parse();
  match run(cli).await {
    Ok(outcome) => report(&outcome),
    Err(e) => {
      eprintln!("Error: {:#}", e);
      ExitCode::FAILURE
    }
  }
}
