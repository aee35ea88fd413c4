use error_stack::{Result, ResultExt};
use thiserror::Error;
use tracing_error::ErrorLayer;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogStyle, Logging};

#[derive(Debug, Error)]
#[error("Could not initialize logging")]
pub struct InitLoggingError;

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init(config: &Logging) -> Result<(), InitLoggingError> {
  let filter = match EnvFilter::try_from_default_env() {
    Ok(filter) => filter,
    Err(..) => EnvFilter::try_new(&config.level)
      .change_context(InitLoggingError)
      .attach_printable_lazy(|| format!("invalid log filter {:?}", config.level))?,
  };

  let registry = tracing_subscriber::registry()
    .with(filter)
    .with(ErrorLayer::default());

  let result = match config.style {
    LogStyle::Compact => registry.with(fmt::layer().compact()).try_init(),
    LogStyle::Full => registry.with(fmt::layer()).try_init(),
    LogStyle::Pretty => registry.with(fmt::layer().pretty()).try_init(),
  };

  result.change_context(InitLoggingError)
}
