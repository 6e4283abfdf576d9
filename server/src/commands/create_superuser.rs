// src/commands/create_superuser.rs

use super::CommandOutcome;
use crate::errors::Result as AppResult;
use crate::models::NewUser;
use crate::services::auth_service;
use crate::services::role_policy::CANONICAL_ADMIN_USERNAME;
use crate::state::AppState;
use tracing::instrument;

pub const BOOTSTRAP_ADMIN_EMAIL: &str = "admin@example.com";

/// Creates the canonical `admin` superuser, or restores its rights and resets
/// its password to the configured bootstrap password.
#[instrument(name = "command::create_superuser", skip_all)]
pub async fn create_superuser(app_state: &AppState) -> CommandOutcome {
  let mut outcome = CommandOutcome::started();
  let result = run(app_state, &mut outcome).await;
  outcome.finish(result, "Creating the superuser")
}

async fn run(app_state: &AppState, outcome: &mut CommandOutcome) -> AppResult<()> {
  let store = &app_state.store;
  let password_hash = auth_service::hash_password(&app_state.config.bootstrap_admin_password)?;

  match store.find_account_by_username(CANONICAL_ADMIN_USERNAME).await? {
    Some(account) => {
      let promoted = !(account.user.is_superuser && account.user.is_staff);
      store.restore_superuser(account.id(), &password_hash).await?;
      if promoted {
        outcome.say(format!(
          "User '{}' promoted to superuser and its password reset.",
          CANONICAL_ADMIN_USERNAME
        ));
      } else {
        outcome.say(format!("Password of superuser '{}' reset.", CANONICAL_ADMIN_USERNAME));
      }
    }
    None => {
      store
        .insert_account(bootstrap_admin(password_hash))
        .await?;
      outcome.say(format!("Superuser '{}' created.", CANONICAL_ADMIN_USERNAME));
    }
  }
  Ok(())
}

/// The canonical admin as created by the bootstrap commands: active, verified, full rights.
pub(crate) fn bootstrap_admin(password_hash: String) -> NewUser {
  NewUser {
    username: CANONICAL_ADMIN_USERNAME.to_string(),
    email: BOOTSTRAP_ADMIN_EMAIL.to_string(),
    first_name: String::new(),
    last_name: String::new(),
    password_hash,
    is_active: true,
    is_staff: true,
    is_superuser: true,
    email_verified: true,
  }
}
