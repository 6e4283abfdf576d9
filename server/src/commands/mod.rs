// src/commands/mod.rs

//! One-shot administrative commands. Each collects human-readable status lines
//! and reports overall success instead of failing outright.

pub mod create_superuser;
pub mod demo_data;
pub mod enforce_admin_roles;

pub use create_superuser::create_superuser;
pub use demo_data::seed_demo_data;
pub use enforce_admin_roles::enforce_admin_roles;

use crate::errors::AppError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutcome {
  pub success: bool,
  pub messages: Vec<String>,
}

impl CommandOutcome {
  fn started() -> Self {
    Self {
      success: true,
      messages: Vec::new(),
    }
  }

  fn say(&mut self, message: impl Into<String>) {
    let message = message.into();
    tracing::info!(%message, "Command status.");
    self.messages.push(message);
  }

  fn finish(mut self, result: Result<(), AppError>, context: &str) -> Self {
    if let Err(e) = result {
      tracing::error!(error = %e, "{} failed.", context);
      self.messages.push(format!("{} failed: {}", context, e));
      self.success = false;
    }
    self
  }
}
