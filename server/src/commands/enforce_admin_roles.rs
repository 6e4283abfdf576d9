// src/commands/enforce_admin_roles.rs

use super::CommandOutcome;
use crate::errors::{AppError, Result as AppResult};
use crate::models::RoleSummary;
use crate::pipelines::contexts::AdminRolesCtxData;
use crate::services::role_policy::CANONICAL_ADMIN_USERNAME;
use crate::state::AppState;
use electro_flow::{ContextData, PipelineResult};
use tracing::instrument;

/// Runs the admin-role enforcement pipeline and returns its summary.
pub async fn run_enforcement(app_state: &AppState) -> AppResult<RoleSummary> {
  let ctx_data = ContextData::new(AdminRolesCtxData::new(app_state.clone()));
  match app_state.flows.run(ctx_data.clone()).await? {
    PipelineResult::Completed => ctx_data
      .with(|c| c.summary.clone())
      .ok_or_else(|| AppError::Internal("Role enforcement finished without a summary.".to_string())),
    PipelineResult::Stopped => Err(AppError::Internal("Role enforcement was halted.".to_string())),
  }
}

#[instrument(name = "command::enforce_admin_roles", skip_all)]
pub async fn enforce_admin_roles(app_state: &AppState) -> CommandOutcome {
  let mut outcome = CommandOutcome::started();
  let result = match run_enforcement(app_state).await {
    Ok(summary) => {
      if !summary.promoted.is_empty() {
        outcome.say(format!("User '{}' updated to superuser.", CANONICAL_ADMIN_USERNAME));
      }
      if !summary.demoted.is_empty() {
        outcome.say(format!(
          "Demoted {} user(s) from superuser to regular admin: {}",
          summary.demoted.len(),
          summary.demoted.join(", ")
        ));
      }
      outcome.say(format!(
        "Current state: {} superuser(s), {} regular admin(s).",
        summary.superusers, summary.staff_admins
      ));
      Ok(())
    }
    Err(e) => Err(e),
  };
  outcome.finish(result, "Adjusting admin roles")
}
