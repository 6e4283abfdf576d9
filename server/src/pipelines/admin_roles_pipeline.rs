// src/pipelines/admin_roles_pipeline.rs

//! Brings stored roles in line with the single-superuser rule. Running it
//! again right away plans no changes; concurrent runs converge on the same state.

use crate::errors::{AppError, Result as AppResult};
use crate::models::RoleSummary;
use crate::pipelines::contexts::AdminRolesCtxData;
use crate::services::role_policy::{plan_role_changes, RoleChangeKind, CANONICAL_ADMIN_USERNAME};
use electro_flow::{ContextData, FlowResult, Flows, Pipeline, PipelineControl, SkipCondition};
use std::sync::Arc;
use tracing::{info, instrument};

pub fn register_admin_roles_pipeline(flows: &Flows<AppError>) -> FlowResult<()> {
  let nothing_to_apply: SkipCondition<AdminRolesCtxData> =
    Arc::new(|ctx_data: ContextData<AdminRolesCtxData>| ctx_data.with(|c| c.plan.is_empty()));

  let mut pipeline = Pipeline::<AdminRolesCtxData, AppError>::new(&[
    ("load_role_holders", false, None),
    ("plan_role_changes", false, None),
    ("apply_role_changes", false, Some(nothing_to_apply)),
    ("summarize_roles", false, None),
  ]);

  pipeline.on_root("load_role_holders", load_role_holders)?;
  pipeline.on_root("plan_role_changes", plan_changes)?;
  pipeline.on_root("apply_role_changes", apply_role_changes)?;
  pipeline.on_root("summarize_roles", summarize_roles)?;

  flows.register_pipeline(pipeline);
  tracing::info!("Admin role enforcement pipeline registered.");
  Ok(())
}

#[instrument(name = "admin_roles::load_role_holders", skip_all, err(Display))]
async fn load_role_holders(ctx_data: ContextData<AdminRolesCtxData>) -> AppResult<PipelineControl> {
  let store = ctx_data.with(|c| c.app_state.store.clone());
  let holders = store.list_role_holders(CANONICAL_ADMIN_USERNAME).await?;
  ctx_data.write().holders = holders;
  Ok(PipelineControl::Continue)
}

#[instrument(name = "admin_roles::plan_role_changes", skip_all)]
async fn plan_changes(ctx_data: ContextData<AdminRolesCtxData>) -> AppResult<PipelineControl> {
  let mut guard = ctx_data.write();
  let plan = plan_role_changes(&guard.holders);
  guard.plan = plan;
  info!(changes = guard.plan.len(), "Role changes planned.");
  Ok(PipelineControl::Continue)
}

#[instrument(name = "admin_roles::apply_role_changes", skip_all, err(Display))]
async fn apply_role_changes(ctx_data: ContextData<AdminRolesCtxData>) -> AppResult<PipelineControl> {
  let (store, plan) = ctx_data.with(|c| (c.app_state.store.clone(), c.plan.clone()));
  for change in &plan {
    let (is_staff, is_superuser) = change.target_flags();
    store.set_roles(change.user_id, is_staff, is_superuser).await?;
    info!(username = %change.username, kind = ?change.kind, "Role change applied.");
  }
  Ok(PipelineControl::Continue)
}

#[instrument(name = "admin_roles::summarize_roles", skip_all, err(Display))]
async fn summarize_roles(ctx_data: ContextData<AdminRolesCtxData>) -> AppResult<PipelineControl> {
  let (store, plan) = ctx_data.with(|c| (c.app_state.store.clone(), c.plan.clone()));
  let (superusers, staff_admins) = store.count_roles().await?;

  let usernames = |kind: RoleChangeKind| {
    plan
      .iter()
      .filter(|c| c.kind == kind)
      .map(|c| c.username.clone())
      .collect::<Vec<_>>()
  };
  let summary = RoleSummary {
    superusers,
    staff_admins,
    promoted: usernames(RoleChangeKind::Promote),
    demoted: usernames(RoleChangeKind::Demote),
  };
  info!(superusers, staff_admins, "Admin roles enforced.");
  ctx_data.write().summary = Some(summary);
  Ok(PipelineControl::Continue)
}
