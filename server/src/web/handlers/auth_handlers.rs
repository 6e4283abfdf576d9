// src/web/handlers/auth_handlers.rs

use actix_web::http::header::LOCATION;
use actix_web::{web, HttpResponse};
use electro_flow::{ContextData, PipelineResult};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, instrument, warn};

use crate::errors::AppError;
use crate::models::Account;
use crate::pipelines::contexts::{RegistrationCtxData, SigninCtxData, VerificationCtxData};
use crate::state::AppState;

#[derive(Deserialize, Debug)]
pub struct RegisterRequestPayload {
  #[serde(default)]
  pub username: String,
  #[serde(default)]
  pub email: String,
  #[serde(default)]
  pub password: String,
  #[serde(default)]
  pub password2: String,
}

#[derive(Serialize, Debug)]
pub struct RegisterResponse {
  #[serde(flatten)]
  pub account: Account,
  pub verification_email_sent: bool,
}

#[derive(Deserialize, Debug)]
pub struct TokenRequestPayload {
  #[serde(default)]
  pub username: String,
  #[serde(default)]
  pub password: String,
}

#[instrument(
    name = "handler::register",
    skip(app_state, req_payload),
    fields(username = %req_payload.username)
)]
pub async fn register_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<RegisterRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = req_payload.into_inner();
  let ctx_data = ContextData::new(RegistrationCtxData::new(
    app_state.get_ref().clone(),
    payload.username,
    payload.email,
    payload.password,
    payload.password2,
  ));

  match app_state.flows.run(ctx_data.clone()).await? {
    PipelineResult::Completed => {
      let (account, email_sent) = ctx_data.with(|c| (c.account.clone(), c.verification_email_sent));
      let account = account.ok_or_else(|| {
        AppError::Internal("Registration completed without creating an account.".to_string())
      })?;
      info!(user_id = %account.id(), verification_email_sent = email_sent, "Registration accepted.");
      Ok(HttpResponse::Created().json(RegisterResponse {
        account,
        verification_email_sent: email_sent,
      }))
    }
    PipelineResult::Stopped => {
      warn!("Registration pipeline was stopped by a handler.");
      Err(AppError::Internal("Registration was halted by an internal step.".to_string()))
    }
  }
}

#[instrument(name = "handler::verify_email", skip(app_state, path))]
pub async fn verify_email_handler(
  app_state: web::Data<AppState>,
  path: web::Path<(String, String)>,
) -> HttpResponse {
  let (encoded_uid, token) = path.into_inner();
  let ctx_data = ContextData::new(VerificationCtxData::new(app_state.get_ref().clone(), encoded_uid, token));

  let verified = match app_state.flows.run(ctx_data.clone()).await {
    Ok(PipelineResult::Completed) => ctx_data.with(|c| c.activated.is_some()),
    Ok(PipelineResult::Stopped) => false,
    Err(e) => {
      error!(error = %e, "Verification failed unexpectedly.");
      false
    }
  };

  let target = format!(
    "{}/login?verified={}",
    app_state.config.frontend_url,
    if verified { 1 } else { 0 }
  );
  HttpResponse::Found().insert_header((LOCATION, target)).finish()
}

#[instrument(
    name = "handler::obtain_token",
    skip(app_state, req_payload),
    fields(username = %req_payload.username)
)]
pub async fn obtain_token_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<TokenRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = req_payload.into_inner();
  let ctx_data = ContextData::new(SigninCtxData::new(
    app_state.get_ref().clone(),
    payload.username,
    payload.password,
  ));

  match app_state.flows.run(ctx_data.clone()).await? {
    PipelineResult::Completed => {
      let token = ctx_data
        .with(|c| c.token.clone())
        .ok_or_else(|| AppError::Internal("Sign-in completed without issuing a token.".to_string()))?;
      Ok(HttpResponse::Ok().json(json!({ "token": token })))
    }
    PipelineResult::Stopped => Err(AppError::Internal(
      "Authentication process was unexpectedly halted.".to_string(),
    )),
  }
}
