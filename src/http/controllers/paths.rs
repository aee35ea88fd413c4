use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::http::Error;
use crate::paths::FindPath;
use crate::util::Sensitive;
use crate::App;

#[derive(Debug, Deserialize)]
pub struct FindBody {
  pub source: Sensitive<String>,
  pub target: Sensitive<String>,
}

#[tracing::instrument(skip_all, name = "http.paths.find")]
pub async fn find(app: web::Data<App>, body: web::Json<FindBody>) -> Result<HttpResponse, Error> {
  let body = body.into_inner();
  let request = FindPath {
    source: body.source,
    target: body.target,
  };
  let paths = request.perform(app.paths()).await?;
  Ok(HttpResponse::Ok().json(paths))
}
