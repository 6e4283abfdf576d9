// src/web/handlers/product_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{validate_product, ProductChanges, ProductDraft, ProductInput};
use crate::state::AppState;
use crate::web::extractors::MaybeUser;
use crate::web::permissions::check_catalog_permission;

#[derive(Deserialize, Debug)]
pub struct ListProductsQuery {
  /// Category slug.
  pub category: Option<String>,
}

fn not_found(id: Uuid) -> AppError {
  AppError::NotFound(format!("Product with ID {} not found.", id))
}

async fn ensure_category(app_state: &AppState, draft: &ProductDraft) -> Result<(), AppError> {
  if app_state.store.category_exists(draft.category_id).await? {
    Ok(())
  } else {
    Err(AppError::field(
      "category",
      format!("Invalid pk \"{}\" - object does not exist.", draft.category_id),
    ))
  }
}

#[instrument(name = "handler::list_products", skip(app_state, query_params), fields(category = ?query_params.category))]
pub async fn list_products_handler(
  app_state: web::Data<AppState>,
  query_params: web::Query<ListProductsQuery>,
) -> Result<HttpResponse, AppError> {
  let category = query_params.category.as_deref().filter(|s| !s.is_empty());
  let products = app_state.store.list_products(category).await?;
  info!("Successfully fetched {} products.", products.len());
  Ok(HttpResponse::Ok().json(products))
}

#[instrument(name = "handler::get_product", skip(app_state, path), fields(product_id = %path.as_ref()))]
pub async fn get_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let product_id = path.into_inner();
  let product = app_state.store.find_product(product_id).await?.ok_or_else(|| {
    warn!("Product with ID {} not found.", product_id);
    not_found(product_id)
  })?;
  Ok(HttpResponse::Ok().json(product))
}

#[instrument(name = "handler::create_product", skip(app_state, req, caller, req_payload))]
pub async fn create_product_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  caller: MaybeUser,
  req_payload: web::Json<ProductInput>,
) -> Result<HttpResponse, AppError> {
  check_catalog_permission(req.method(), caller.0.as_ref())?;
  let draft = ProductDraft::from(req_payload.into_inner());
  validate_product(&draft)?;
  ensure_category(&app_state, &draft).await?;

  let product = app_state.store.create_product(&draft).await?;
  info!(product_id = %product.id, "Product created.");
  Ok(HttpResponse::Created().json(product))
}

#[instrument(name = "handler::update_product", skip(app_state, req, caller, path, req_payload), fields(product_id = %path.as_ref()))]
pub async fn update_product_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  caller: MaybeUser,
  path: web::Path<Uuid>,
  req_payload: web::Json<ProductChanges>,
) -> Result<HttpResponse, AppError> {
  check_catalog_permission(req.method(), caller.0.as_ref())?;
  let product_id = path.into_inner();
  let current = app_state.store.find_product(product_id).await?.ok_or_else(|| not_found(product_id))?;

  let draft = req_payload.into_inner().apply_to(&current);
  validate_product(&draft)?;
  if draft.category_id != current.category_id {
    ensure_category(&app_state, &draft).await?;
  }

  let product = app_state
    .store
    .update_product(product_id, &draft)
    .await?
    .ok_or_else(|| not_found(product_id))?;
  Ok(HttpResponse::Ok().json(product))
}

#[instrument(name = "handler::delete_product", skip(app_state, req, caller, path), fields(product_id = %path.as_ref()))]
pub async fn delete_product_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  caller: MaybeUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  check_catalog_permission(req.method(), caller.0.as_ref())?;
  let product_id = path.into_inner();
  if app_state.store.delete_product(product_id).await? {
    Ok(HttpResponse::NoContent().finish())
  } else {
    Err(not_found(product_id))
  }
}
