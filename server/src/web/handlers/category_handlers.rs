// src/web/handlers/category_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::errors::AppError;
use crate::models::{is_valid_slug, CategoryChanges, NewCategory, INVALID_SLUG};
use crate::state::AppState;
use crate::web::extractors::MaybeUser;
use crate::web::permissions::check_catalog_permission;

fn not_found(slug: &str) -> AppError {
  AppError::NotFound(format!("Category '{}' not found.", slug))
}

#[instrument(name = "handler::list_categories", skip(app_state))]
pub async fn list_categories_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let categories = app_state.store.list_categories().await?;
  Ok(HttpResponse::Ok().json(categories))
}

#[instrument(name = "handler::get_category", skip(app_state, path), fields(slug = %path.as_ref()))]
pub async fn get_category_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let slug = path.into_inner();
  let category = app_state.store.find_category_by_slug(&slug).await?.ok_or_else(|| not_found(&slug))?;
  Ok(HttpResponse::Ok().json(category))
}

#[instrument(name = "handler::create_category", skip(app_state, req, caller, req_payload))]
pub async fn create_category_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  caller: MaybeUser,
  req_payload: web::Json<NewCategory>,
) -> Result<HttpResponse, AppError> {
  check_catalog_permission(req.method(), caller.0.as_ref())?;
  let payload = req_payload.into_inner();
  payload.validate()?;

  let slug = payload.resolved_slug();
  if slug.is_empty() {
    return Err(AppError::field("slug", "A slug could not be derived from the name."));
  }
  if !is_valid_slug(&slug) {
    return Err(AppError::field("slug", INVALID_SLUG));
  }
  let category = app_state.store.create_category(payload.name.trim(), &slug).await?;
  info!(category_id = %category.id, slug = %category.slug, "Category created.");
  Ok(HttpResponse::Created().json(category))
}

#[instrument(name = "handler::update_category", skip(app_state, req, caller, path, req_payload), fields(slug = %path.as_ref()))]
pub async fn update_category_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  caller: MaybeUser,
  path: web::Path<String>,
  req_payload: web::Json<CategoryChanges>,
) -> Result<HttpResponse, AppError> {
  check_catalog_permission(req.method(), caller.0.as_ref())?;
  let changes = req_payload.into_inner();
  changes.validate()?;
  if let Some(new_slug) = changes.slug.as_deref() {
    if !is_valid_slug(new_slug) {
      return Err(AppError::field("slug", INVALID_SLUG));
    }
  }

  let slug = path.into_inner();
  let category = app_state
    .store
    .update_category(&slug, &changes)
    .await?
    .ok_or_else(|| not_found(&slug))?;
  Ok(HttpResponse::Ok().json(category))
}

#[instrument(name = "handler::delete_category", skip(app_state, req, caller, path), fields(slug = %path.as_ref()))]
pub async fn delete_category_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  caller: MaybeUser,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  check_catalog_permission(req.method(), caller.0.as_ref())?;
  let slug = path.into_inner();
  if app_state.store.delete_category(&slug).await? {
    info!(%slug, "Category and its products deleted.");
    Ok(HttpResponse::NoContent().finish())
  } else {
    warn!(%slug, "Delete requested for unknown category.");
    Err(not_found(&slug))
  }
}
