// src/web/permissions.rs

use crate::errors::AppError;
use crate::models::Account;
use actix_web::http::Method;

/// Catalog rule: safe methods are open to everyone, anything else needs a staff caller.
pub fn check_catalog_permission(method: &Method, caller: Option<&Account>) -> Result<(), AppError> {
  if matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS) {
    return Ok(());
  }
  match caller {
    Some(account) if account.user.is_staff => Ok(()),
    Some(_) => Err(AppError::Forbidden(
      "You do not have permission to perform this action.".to_string(),
    )),
    None => Err(AppError::Forbidden(
      "Authentication credentials were not provided.".to_string(),
    )),
  }
}

/// Staff or superuser, as required by the admin user listing.
pub fn require_staff(caller: &Account) -> Result<(), AppError> {
  if caller.user.is_staff || caller.user.is_superuser {
    Ok(())
  } else {
    Err(AppError::Forbidden(
      "You do not have permission to perform this action.".to_string(),
    ))
  }
}
