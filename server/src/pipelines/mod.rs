// src/pipelines/mod.rs

//! Defines and registers the account workflows that run on `electro_flow`.

use crate::errors::AppError;
use electro_flow::{FlowResult, Flows};

pub mod contexts;
pub mod common_steps;

pub mod admin_provisioning_pipeline;
pub mod admin_roles_pipeline;
pub mod profile_pipeline;
pub mod registration_pipeline;
pub mod signin_pipeline;
pub mod verification_pipeline;

/// Registers every pipeline with `flows`. Called once while building `AppState`.
pub fn register_all_pipelines(flows: &Flows<AppError>) -> FlowResult<()> {
  tracing::info!("Registering pipelines...");

  registration_pipeline::register_registration_pipeline(flows)?;
  verification_pipeline::register_verification_pipeline(flows)?;
  signin_pipeline::register_signin_pipeline(flows)?;
  profile_pipeline::register_profile_pipeline(flows)?;
  admin_provisioning_pipeline::register_admin_provisioning_pipeline(flows)?;
  admin_roles_pipeline::register_admin_roles_pipeline(flows)?;

  tracing::info!("All application pipelines registered.");
  Ok(())
}
