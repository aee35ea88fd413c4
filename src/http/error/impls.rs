use actix_web::{body::BoxBody, http::StatusCode, HttpResponse};
use error_stack::Report;

use super::Error;
use crate::connections::ConnectionRequestError;
use crate::paths::PathServiceError;
use crate::recommend::RecommendError;
use crate::types::Error as ErrorType;

impl actix_web::ResponseError for Error {
  fn status_code(&self) -> StatusCode {
    match self.error_type {
      ErrorType::Conflict { .. } => StatusCode::CONFLICT,
      ErrorType::Forbidden => StatusCode::FORBIDDEN,
      ErrorType::Internal => StatusCode::INTERNAL_SERVER_ERROR,
      ErrorType::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
      ErrorType::NotFound => StatusCode::NOT_FOUND,
      ErrorType::ReadonlyMode | ErrorType::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
    }
  }

  fn error_response(&self) -> HttpResponse<BoxBody> {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    } else {
      tracing::debug!(error = ?self.error_type, "request rejected");
    }
    HttpResponse::build(status).json(&self.error_type)
  }
}

impl From<Report<RecommendError>> for Error {
  fn from(value: Report<RecommendError>) -> Self {
    match value.current_context() {
      RecommendError::NotFound => Error::from_report(ErrorType::NotFound, value),
      RecommendError::StoreUnavailable => Error::from_report(ErrorType::Internal, value),
    }
  }
}

impl From<Report<ConnectionRequestError>> for Error {
  fn from(value: Report<ConnectionRequestError>) -> Self {
    let error_type = match value.current_context() {
      ConnectionRequestError::SelfConnection => {
        ErrorType::invalid_request("You cannot connect with yourself")
      }
      ConnectionRequestError::UserNotFound | ConnectionRequestError::ConnectionNotFound => {
        ErrorType::NotFound
      }
      ConnectionRequestError::AlreadyExists => {
        ErrorType::conflict("These users are already connected or have a pending request")
      }
      ConnectionRequestError::NotParticipant => ErrorType::Forbidden,
      ConnectionRequestError::NotPending => {
        ErrorType::invalid_request("This connection request is no longer pending")
      }
      ConnectionRequestError::Readonly => ErrorType::ReadonlyMode,
      ConnectionRequestError::StoreUnavailable => ErrorType::Internal,
    };
    Error::from_report(error_type, value)
  }
}

impl From<Report<PathServiceError>> for Error {
  fn from(value: Report<PathServiceError>) -> Self {
    let error_type = match value.current_context() {
      PathServiceError::InvalidQuery => {
        ErrorType::invalid_request("Source and target must be two different people")
      }
      PathServiceError::Setup => ErrorType::Internal,
      PathServiceError::Unreachable | PathServiceError::Rejected | PathServiceError::Malformed => {
        ErrorType::ServiceUnavailable
      }
    };
    Error::from_report(error_type, value)
  }
}
