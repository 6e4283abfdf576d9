// src/services/email.rs

//! Outbound email. Delivery is behind the `Mailer` trait; the built-in
//! implementation only writes the message to the log.

use crate::config::AppConfig;
use crate::errors::Result as AppResult;
use async_trait::async_trait;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
  pub to: String,
  pub from: String,
  pub subject: String,
  pub body: String,
}

#[derive(Debug, Clone)]
pub struct SentEmailInfo {
  pub to: String,
  pub subject: String,
  pub message_id: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
  async fn send(&self, email: OutgoingEmail) -> AppResult<SentEmailInfo>;
}

/// Logs each message instead of delivering it.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
  async fn send(&self, email: OutgoingEmail) -> AppResult<SentEmailInfo> {
    let message_id = format!("log_email_{}", uuid::Uuid::new_v4());
    info!(
      to = %email.to,
      from = %email.from,
      subject = %email.subject,
      %message_id,
      "Email handed to log transport.\n{}",
      email.body
    );
    Ok(SentEmailInfo {
      to: email.to,
      subject: email.subject,
      message_id,
    })
  }
}

/// The message carrying a new account's verification link.
pub fn verification_email(config: &AppConfig, to: &str, username: &str, link: &str) -> OutgoingEmail {
  OutgoingEmail {
    to: to.to_string(),
    from: config.email_sender.clone(),
    subject: "Verifica tu correo electrónico - Todo Electro".to_string(),
    body: format!(
      "Hola {},\n\nGracias por registrarte en Todo Electro. \
       Para activar tu cuenta, verifica tu correo electrónico en el siguiente enlace:\n\n{}\n\n\
       Si no creaste esta cuenta, ignora este mensaje.",
      username, link
    ),
  }
}
