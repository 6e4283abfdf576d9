// src/telemetry.rs

use crate::config::LogFormat;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `RUST_LOG` overrides the default `info` level.
///
/// Calling it again is harmless; the first subscriber stays installed.
pub fn init(log_format: LogFormat) {
  let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(env_filter)
    .with_span_events(FmtSpan::CLOSE);

  let result = match log_format {
    LogFormat::Pretty => builder.try_init(),
    LogFormat::Json => builder.json().flatten_event(true).try_init(),
  };
  if let Err(e) = result {
    tracing::debug!(error = %e, "Tracing subscriber already installed.");
  }
}
