// src/services/mod.rs

//! Stateless building blocks used by pipelines, handlers and commands.

pub mod auth_service;
pub mod email;
pub mod password_policy;
pub mod role_policy;
pub mod verification_token;
