use error_stack::{Context, Report};
use std::fmt::Debug;
use tracing_error::SpanTrace;

use crate::types;

mod impls;

pub type Result<T> = std::result::Result<T, Error>;

/// Error returned by HTTP handlers: the public [error type](types::Error)
/// plus the report and span trace explaining it for the logs.
pub struct Error {
  error_type: types::Error,
  report: Box<dyn Debug + Send + Sync>,
  trace: SpanTrace,
}

impl Error {
  #[must_use]
  pub fn from_context(error_type: types::Error, context: impl Context) -> Self {
    Self::from_report(error_type, Report::new(context))
  }

  #[must_use]
  pub fn from_report(error_type: types::Error, report: Report<impl Context>) -> Self {
    Self {
      error_type,
      report: Box::new(report),
      trace: SpanTrace::capture(),
    }
  }
}

impl Error {
  #[must_use]
  pub fn as_type(&self) -> &types::Error {
    &self.error_type
  }
}

impl Debug for Error {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Error")
      .field("type", &self.error_type)
      .field("report", &self.report)
      .field("trace", &self.trace)
      .finish()
  }
}

impl std::fmt::Display for Error {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}: ", &self.error_type)?;
    writeln!(f, "{:?}", self.report)?;
    std::fmt::Display::fmt(&self.trace, f)
  }
}
