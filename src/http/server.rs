use actix_web::{
  body::MessageBody,
  dev::{ServiceFactory, ServiceRequest, ServiceResponse},
  web, HttpServer,
};
use error_stack::{Result, ResultExt};
use thiserror::Error;
use tracing::info;
use tracing_actix_web::TracingLogger;

use super::controllers;
use crate::{config, App};

#[derive(Debug, Error)]
#[error("Could not start Coryfi Connect HTTP server")]
pub struct StartServerError;

/// Builds the actix-web application serving every route.
pub fn build_http_app(
  app: App,
) -> actix_web::App<
  impl ServiceFactory<
    ServiceRequest,
    Config = (),
    Response = ServiceResponse<impl MessageBody>,
    Error = actix_web::Error,
    InitError = (),
  >,
> {
  actix_web::App::new()
    .app_data(web::Data::new(app))
    .wrap(TracingLogger::default())
    .configure(controllers::configure)
    .default_service(web::to(controllers::not_found))
}

#[tracing::instrument(skip_all, name = "server.run")]
pub async fn serve(config: config::Server) -> Result<(), StartServerError> {
  let app = App::new(config).await.change_context(StartServerError)?;
  let (ip, port, workers) = (app.config.ip, app.config.port, app.config.workers);

  let server = HttpServer::new({
    let app = app.clone();
    move || build_http_app(app.clone())
  })
  .workers(workers)
  .bind((ip, port))
  .change_context(StartServerError)
  .attach_printable("could not bind server with address and port")?;

  for addr in server.addrs() {
    info!("Coryfi Connect HTTP server is listening at http://{addr} with {workers} workers");
  }

  server
    .run()
    .await
    .change_context(StartServerError)
    .attach_printable("could not serve Coryfi Connect HTTP service")?;

  info!("Coryfi Connect HTTP server has shut down");
  Ok(())
}
