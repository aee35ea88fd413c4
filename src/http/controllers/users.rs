use actix_web::{web, HttpResponse};

use crate::{
  connections::ListConnections, http::Error, recommend::RecommendConnections,
  util::Sensitive, App,
};

#[tracing::instrument(skip_all, name = "http.users.recommendations")]
pub async fn recommendations(
  app: web::Data<App>,
  path: web::Path<String>,
) -> Result<HttpResponse, Error> {
  let request = RecommendConnections {
    email: Sensitive::new(path.into_inner()),
  };
  let recommendation = request.perform(app.store()).await?;
  Ok(HttpResponse::Ok().json(recommendation))
}

#[tracing::instrument(skip_all, name = "http.users.connections")]
pub async fn connections(
  app: web::Data<App>,
  path: web::Path<String>,
) -> Result<HttpResponse, Error> {
  let request = ListConnections {
    email: Sensitive::new(path.into_inner()),
  };
  let connections = request.perform(app.store()).await?;
  Ok(HttpResponse::Ok().json(connections))
}
