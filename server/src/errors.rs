// src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use electro_flow::FlowError;
use serde_json::json;
use std::collections::BTreeMap;
use thiserror::Error;

/// Field name to messages, rendered as the body of a 400 response.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Key used for errors that do not belong to a single field.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0:?}")]
  Validation(FieldErrors),

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Permission Denied: {0}")]
  Forbidden(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Migration Error: {0}")]
  Migration(#[from] sqlx::migrate::MigrateError),

  #[error("Email Delivery Error: {0}")]
  Email(String),

  #[error("Workflow Error: {source}")]
  Workflow {
    #[from]
    source: FlowError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl AppError {
  /// A validation error carrying a single message for `field`.
  pub fn field(field: &str, message: impl Into<String>) -> Self {
    let mut errors = FieldErrors::new();
    push_field_error(&mut errors, field, message);
    AppError::Validation(errors)
  }

  pub fn non_field(message: impl Into<String>) -> Self {
    Self::field(NON_FIELD_ERRORS, message)
  }

  /// Field errors of a `Validation` error, if that is what this is.
  pub fn field_errors(&self) -> Option<&FieldErrors> {
    match self {
      AppError::Validation(errors) => Some(errors),
      _ => None,
    }
  }
}

pub fn push_field_error(errors: &mut FieldErrors, field: &str, message: impl Into<String>) {
  errors.entry(field.to_string()).or_default().push(message.into());
}

impl From<validator::ValidationErrors> for AppError {
  fn from(errors: validator::ValidationErrors) -> Self {
    let mut fields = FieldErrors::new();
    for (field, errs) in errors.field_errors() {
      for err in errs {
        let message = match &err.message {
          Some(message) => message.to_string(),
          None => format!("Invalid value ({}).", err.code),
        };
        push_field_error(&mut fields, &field, message);
      }
    }
    AppError::Validation(fields)
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::Forbidden(_) => StatusCode::FORBIDDEN,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Config(_)
      | AppError::Sqlx(_)
      | AppError::Migration(_)
      | AppError::Email(_)
      | AppError::Workflow { .. }
      | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      // Details stay in the log; callers only get a generic message.
      tracing::error!(application_error = %self, "Responding with server error");
    } else {
      tracing::debug!(application_error = %self, "Responding with client error");
    }
    match self {
      AppError::Validation(errors) => HttpResponse::BadRequest().json(errors),
      AppError::Auth(m) => HttpResponse::Unauthorized().json(json!({"error": m})),
      AppError::Forbidden(m) => HttpResponse::Forbidden().json(json!({"error": m})),
      AppError::NotFound(m) => HttpResponse::NotFound().json(json!({"error": m})),
      AppError::Sqlx(_) | AppError::Migration(_) => {
        HttpResponse::InternalServerError().json(json!({"error": "Database operation failed"}))
      }
      AppError::Email(_) => HttpResponse::InternalServerError().json(json!({"error": "Email service error"})),
      AppError::Workflow { .. } => {
        HttpResponse::InternalServerError().json(json!({"error": "Workflow processing error"}))
      }
      AppError::Config(_) | AppError::Internal(_) => {
        HttpResponse::InternalServerError().json(json!({"error": "An internal error occurred"}))
      }
    }
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;
  use actix_web::body::to_bytes;

  #[actix_rt::test]
  async fn server_errors_do_not_leak_details() {
    let err = AppError::Internal("connection string postgres://admin:hunter2@db".to_string());
    let response = err.error_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = to_bytes(response.into_body()).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(!text.contains("hunter2"));
  }

  #[actix_rt::test]
  async fn validation_errors_render_field_map() {
    let mut errors = FieldErrors::new();
    push_field_error(&mut errors, "password", "Passwords do not match.");
    push_field_error(&mut errors, "password", "This password is too short.");
    let response = AppError::Validation(errors).error_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = to_bytes(response.into_body()).await.unwrap();
    let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["password"].as_array().map(Vec::len), Some(2));
  }
}
