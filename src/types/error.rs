use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Public error type returned by the HTTP API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Error {
  Conflict { message: String },
  Forbidden,
  Internal,
  InvalidRequest { message: String },
  NotFound,
  ReadonlyMode,
  ServiceUnavailable,
}

impl Error {
  #[must_use]
  pub fn invalid_request(message: impl Into<String>) -> Self {
    Self::InvalidRequest {
      message: message.into(),
    }
  }

  #[must_use]
  pub fn conflict(message: impl Into<String>) -> Self {
    Self::Conflict {
      message: message.into(),
    }
  }
}

impl Display for Error {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Error::Conflict { message } | Error::InvalidRequest { message } => f.write_str(message),
      Error::Forbidden => f.write_str("Not allowed to perform this action"),
      Error::Internal => f.write_str("Failed to perform request"),
      Error::NotFound => f.write_str("Could not find the requested resource"),
      Error::ReadonlyMode => f.write_str("Attempt to write read-only database"),
      Error::ServiceUnavailable => f.write_str("A required service is unavailable"),
    }
  }
}
