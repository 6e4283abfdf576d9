// src/web/extractors.rs

//! Caller identity from `Authorization: Token <key>` (or `Bearer <key>`).

use crate::errors::AppError;
use crate::models::Account;
use crate::state::AppState;
use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

/// The signed-in caller; requests without credentials get a 401.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Account);

/// The caller if credentials were sent. Credentials that do not resolve to an
/// active account are still rejected with a 401.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<Account>);

fn token_from_header(req: &HttpRequest) -> Option<String> {
  let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
  let (scheme, key) = value.trim().split_once(' ')?;
  if scheme.eq_ignore_ascii_case("token") || scheme.eq_ignore_ascii_case("bearer") {
    let key = key.trim();
    (!key.is_empty()).then(|| key.to_string())
  } else {
    None
  }
}

async fn resolve_caller(state: Option<web::Data<AppState>>, key: Option<String>) -> Result<Option<Account>, AppError> {
  let Some(key) = key else {
    return Ok(None);
  };
  let state = state.ok_or_else(|| AppError::Internal("Application state is not configured.".to_string()))?;
  match state.store.account_for_token(&key).await? {
    Some(account) if account.user.is_active => Ok(Some(account)),
    Some(_) => {
      warn!("Token presented for an inactive account.");
      Err(AppError::Auth("User inactive or deleted.".to_string()))
    }
    None => Err(AppError::Auth("Invalid token.".to_string())),
  }
}

impl FromRequest for MaybeUser {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let state = req.app_data::<web::Data<AppState>>().cloned();
    let key = token_from_header(req);
    Box::pin(async move { resolve_caller(state, key).await.map(MaybeUser) })
  }
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let state = req.app_data::<web::Data<AppState>>().cloned();
    let key = token_from_header(req);
    Box::pin(async move {
      resolve_caller(state, key)
        .await?
        .map(AuthenticatedUser)
        .ok_or_else(|| AppError::Auth("Authentication credentials were not provided.".to_string()))
    })
  }
}
