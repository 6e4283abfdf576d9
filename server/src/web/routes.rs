// src/web/routes.rs

use crate::errors::AppError;
use crate::web::handlers::{
  account_handlers, auth_handlers, category_handlers, payment_method_handlers, product_handlers,
};
use actix_web::{error::JsonPayloadError, web, HttpRequest};

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Malformed or mistyped JSON bodies become a 400 with a `non_field_errors` entry.
pub fn json_config() -> web::JsonConfig {
  web::JsonConfig::default().error_handler(|err: JsonPayloadError, _req: &HttpRequest| {
    tracing::debug!(error = %err, "Rejected request body.");
    AppError::non_field(format!("JSON parse error - {}", err)).into()
  })
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api")
      .route("/health", web::get().to(health_check_handler))
      .route("/token/", web::post().to(auth_handlers::obtain_token_handler))
      .service(
        web::scope("/users")
          .route("/register/", web::post().to(auth_handlers::register_handler))
          .route("/verify/{uid}/{token}/", web::get().to(auth_handlers::verify_email_handler))
          .route("/profile/", web::get().to(account_handlers::current_user_handler))
          .route("/user-data/", web::get().to(account_handlers::current_user_handler))
          .route("/me/", web::get().to(account_handlers::current_user_handler))
          .route("/update-profile/", web::put().to(account_handlers::update_profile_handler))
          .route("/update-profile/", web::patch().to(account_handlers::update_profile_handler))
          .route("/check-staff/", web::get().to(account_handlers::check_staff_handler))
          .route("/admin/", web::post().to(account_handlers::create_admin_handler))
          .route("/admin-users/", web::get().to(account_handlers::list_admin_users_handler)),
      )
      .service(
        web::scope("/products")
          .service(
            web::resource("/categories/")
              .route(web::get().to(category_handlers::list_categories_handler))
              .route(web::post().to(category_handlers::create_category_handler)),
          )
          .service(
            web::resource("/categories/{slug}/")
              .route(web::get().to(category_handlers::get_category_handler))
              .route(web::put().to(category_handlers::update_category_handler))
              .route(web::patch().to(category_handlers::update_category_handler))
              .route(web::delete().to(category_handlers::delete_category_handler)),
          )
          .service(
            web::resource("/products/")
              .route(web::get().to(product_handlers::list_products_handler))
              .route(web::post().to(product_handlers::create_product_handler)),
          )
          .service(
            web::resource("/products/{id}/")
              .route(web::get().to(product_handlers::get_product_handler))
              .route(web::put().to(product_handlers::update_product_handler))
              .route(web::patch().to(product_handlers::update_product_handler))
              .route(web::delete().to(product_handlers::delete_product_handler)),
          )
          .service(
            web::resource("/payment-methods/")
              .route(web::get().to(payment_method_handlers::list_payment_methods_handler))
              .route(web::post().to(payment_method_handlers::create_payment_method_handler)),
          )
          .service(
            web::resource("/payment-methods/{id}/")
              .route(web::get().to(payment_method_handlers::get_payment_method_handler))
              .route(web::put().to(payment_method_handlers::update_payment_method_handler))
              .route(web::patch().to(payment_method_handlers::update_payment_method_handler))
              .route(web::delete().to(payment_method_handlers::delete_payment_method_handler)),
          ),
      ),
  );
}
