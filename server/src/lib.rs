// src/lib.rs

//! Todo Electro backend: product catalog, customer accounts with email
//! verification, and the admin-role rules, served over a JSON API.

pub mod commands;
pub mod config;
pub mod errors;
pub mod models;
pub mod pipelines;
pub mod services;
pub mod state;
pub mod store;
pub mod telemetry;
pub mod web;
