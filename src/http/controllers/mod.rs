use actix_web::{
  error::{JsonPayloadError, PathError},
  web, HttpRequest, HttpResponse,
};
use thiserror::Error;

use crate::http::Error;
use crate::types::Error as ErrorType;

pub mod connections;
pub mod paths;
pub mod users;

pub fn configure(cfg: &mut web::ServiceConfig) {
  cfg
    .app_data(json_config())
    .app_data(path_config())
    .service(
      web::scope("/users")
        .route(
          "/{email}/recommendations",
          web::get().to(users::recommendations),
        )
        .route("/{email}/connections", web::get().to(users::connections)),
    )
    .service(
      web::scope("/connections")
        .route("", web::post().to(connections::send))
        .route("/{id}/accept", web::post().to(connections::accept))
        .route("/{id}/reject", web::post().to(connections::reject))
        .route("/{id}/cancel", web::post().to(connections::cancel)),
    )
    .route("/paths", web::post().to(paths::find));
}

#[tracing::instrument(skip_all)]
pub async fn not_found(req: HttpRequest) -> Result<HttpResponse, Error> {
  #[derive(Debug, Error)]
  #[error("Route not found: {0}")]
  struct RouteNotFound(String);
  Err(Error::from_context(
    ErrorType::NotFound,
    RouteNotFound(req.path().to_string()),
  ))
}

#[derive(Debug, Error)]
#[error("Invalid request body or path")]
struct MalformedRequest;

fn json_config() -> web::JsonConfig {
  web::JsonConfig::default().error_handler(|err: JsonPayloadError, _req| {
    let message = err.to_string();
    Error::from_context(ErrorType::invalid_request(message), MalformedRequest).into()
  })
}

fn path_config() -> web::PathConfig {
  web::PathConfig::default().error_handler(|err: PathError, _req| {
    let message = err.to_string();
    Error::from_context(ErrorType::invalid_request(message), MalformedRequest).into()
  })
}
