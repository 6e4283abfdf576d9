// src/pipelines/verification_pipeline.rs

//! Email verification. Every rejection stops the pipeline with the reason
//! recorded in the context instead of returning an error.

use crate::errors::{AppError, Result as AppResult};
use crate::pipelines::contexts::{VerificationCtxData, VerificationFailure};
use crate::services::verification_token::decode_uid;
use electro_flow::{ContextData, FlowResult, Flows, Pipeline, PipelineControl};
use tracing::{info, instrument, warn};

pub fn register_verification_pipeline(flows: &Flows<AppError>) -> FlowResult<()> {
  let mut pipeline = Pipeline::<VerificationCtxData, AppError>::new(&[
    ("decode_identifier", false, None),
    ("load_subject", false, None),
    ("check_token", false, None),
    ("activate_account", false, None),
  ]);

  pipeline.on_root("decode_identifier", decode_identifier)?;
  pipeline.on_root("load_subject", load_subject)?;
  pipeline.on_root("check_token", check_token)?;
  pipeline.on_root("activate_account", activate_account)?;

  flows.register_pipeline(pipeline);
  tracing::info!("Verification pipeline registered.");
  Ok(())
}

fn reject(ctx_data: &ContextData<VerificationCtxData>, failure: VerificationFailure) -> PipelineControl {
  warn!(?failure, "Verification rejected.");
  ctx_data.write().failure = Some(failure);
  PipelineControl::Stop
}

#[instrument(name = "verification::decode_identifier", skip_all)]
async fn decode_identifier(ctx_data: ContextData<VerificationCtxData>) -> AppResult<PipelineControl> {
  let encoded = ctx_data.with(|c| c.encoded_uid.clone());
  match decode_uid(&encoded) {
    Some(user_id) => {
      ctx_data.write().user_id = Some(user_id);
      Ok(PipelineControl::Continue)
    }
    None => Ok(reject(&ctx_data, VerificationFailure::MalformedIdentifier)),
  }
}

#[instrument(name = "verification::load_subject", skip_all, err(Display))]
async fn load_subject(ctx_data: ContextData<VerificationCtxData>) -> AppResult<PipelineControl> {
  let (store, user_id) = ctx_data.with(|c| (c.app_state.store.clone(), c.user_id));
  let Some(user_id) = user_id else {
    return Ok(reject(&ctx_data, VerificationFailure::MalformedIdentifier));
  };
  match store.find_account(user_id).await? {
    Some(account) => {
      ctx_data.write().subject = Some(account.user);
      Ok(PipelineControl::Continue)
    }
    None => Ok(reject(&ctx_data, VerificationFailure::UnknownUser)),
  }
}

#[instrument(name = "verification::check_token", skip_all)]
async fn check_token(ctx_data: ContextData<VerificationCtxData>) -> AppResult<PipelineControl> {
  let valid = ctx_data.with(|c| match &c.subject {
    Some(user) => c.app_state.tokens.check_token(user, &c.token),
    None => false,
  });
  if valid {
    Ok(PipelineControl::Continue)
  } else {
    Ok(reject(&ctx_data, VerificationFailure::InvalidToken))
  }
}

#[instrument(name = "verification::activate_account", skip_all, err(Display))]
async fn activate_account(ctx_data: ContextData<VerificationCtxData>) -> AppResult<PipelineControl> {
  let (store, user_id) = ctx_data.with(|c| (c.app_state.store.clone(), c.subject.as_ref().map(|u| u.id)));
  let user_id = user_id.ok_or_else(|| AppError::Internal("Activation reached without a subject.".to_string()))?;

  // A concurrent request with the same link may have activated the account first.
  let Some(account) = store.activate_account(user_id).await? else {
    return Ok(reject(&ctx_data, VerificationFailure::InvalidToken));
  };
  info!(%user_id, "Account activated and email marked verified.");
  ctx_data.write().activated = Some(account);
  Ok(PipelineControl::Continue)
}
