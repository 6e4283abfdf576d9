// src/web/handlers/mod.rs

pub mod account_handlers;
pub mod auth_handlers;
pub mod category_handlers;
pub mod payment_method_handlers;
pub mod product_handlers;
