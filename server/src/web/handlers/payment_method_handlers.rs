// src/web/handlers/payment_method_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::errors::AppError;
use crate::models::{PaymentMethodChanges, PaymentMethodDraft};
use crate::state::AppState;
use crate::web::extractors::MaybeUser;
use crate::web::permissions::check_catalog_permission;

fn not_found(id: Uuid) -> AppError {
  AppError::NotFound(format!("Payment method with ID {} not found.", id))
}

#[instrument(name = "handler::list_payment_methods", skip(app_state))]
pub async fn list_payment_methods_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let methods = app_state.store.list_payment_methods().await?;
  Ok(HttpResponse::Ok().json(methods))
}

#[instrument(name = "handler::get_payment_method", skip(app_state, path), fields(payment_method_id = %path.as_ref()))]
pub async fn get_payment_method_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let id = path.into_inner();
  let method = app_state.store.find_payment_method(id).await?.ok_or_else(|| not_found(id))?;
  Ok(HttpResponse::Ok().json(method))
}

#[instrument(name = "handler::create_payment_method", skip(app_state, req, caller, req_payload))]
pub async fn create_payment_method_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  caller: MaybeUser,
  req_payload: web::Json<PaymentMethodDraft>,
) -> Result<HttpResponse, AppError> {
  check_catalog_permission(req.method(), caller.0.as_ref())?;
  let draft = req_payload.into_inner();
  draft.validate()?;
  let method = app_state.store.create_payment_method(&draft).await?;
  info!(payment_method_id = %method.id, "Payment method created.");
  Ok(HttpResponse::Created().json(method))
}

#[instrument(name = "handler::update_payment_method", skip(app_state, req, caller, path, req_payload), fields(payment_method_id = %path.as_ref()))]
pub async fn update_payment_method_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  caller: MaybeUser,
  path: web::Path<Uuid>,
  req_payload: web::Json<PaymentMethodChanges>,
) -> Result<HttpResponse, AppError> {
  check_catalog_permission(req.method(), caller.0.as_ref())?;
  let id = path.into_inner();
  let changes = req_payload.into_inner();
  changes.validate()?;

  let current = app_state.store.find_payment_method(id).await?.ok_or_else(|| not_found(id))?;
  let draft = changes.apply_to(&current);
  let method = app_state
    .store
    .update_payment_method(id, &draft)
    .await?
    .ok_or_else(|| not_found(id))?;
  Ok(HttpResponse::Ok().json(method))
}

#[instrument(name = "handler::delete_payment_method", skip(app_state, req, caller, path), fields(payment_method_id = %path.as_ref()))]
pub async fn delete_payment_method_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  caller: MaybeUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  check_catalog_permission(req.method(), caller.0.as_ref())?;
  let id = path.into_inner();
  if app_state.store.delete_payment_method(id).await? {
    Ok(HttpResponse::NoContent().finish())
  } else {
    Err(not_found(id))
  }
}
