use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::connections::{
  CancelConnectionRequest, Decision, RespondConnectionRequest, SendConnectionRequest,
};
use crate::http::Error;
use crate::types::id::{ConnectionId, UserId};
use crate::App;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendBody {
  pub requester_id: UserId,
  pub recipient_id: UserId,
}

/// Identifies who is acting on an existing connection request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorBody {
  pub user_id: UserId,
}

#[tracing::instrument(skip(app), name = "http.connections.send")]
pub async fn send(app: web::Data<App>, body: web::Json<SendBody>) -> Result<HttpResponse, Error> {
  let body = body.into_inner();
  let request = SendConnectionRequest {
    requester: body.requester_id,
    recipient: body.recipient_id,
  };
  let connection = request.perform(app.store()).await?;
  Ok(HttpResponse::Created().json(connection))
}

pub async fn accept(
  app: web::Data<App>,
  path: web::Path<ConnectionId>,
  body: web::Json<ActorBody>,
) -> Result<HttpResponse, Error> {
  respond(app, path.into_inner(), body.user_id, Decision::Accept).await
}

pub async fn reject(
  app: web::Data<App>,
  path: web::Path<ConnectionId>,
  body: web::Json<ActorBody>,
) -> Result<HttpResponse, Error> {
  respond(app, path.into_inner(), body.user_id, Decision::Reject).await
}

#[tracing::instrument(skip(app), name = "http.connections.respond")]
async fn respond(
  app: web::Data<App>,
  connection: ConnectionId,
  actor: UserId,
  decision: Decision,
) -> Result<HttpResponse, Error> {
  let request = RespondConnectionRequest {
    connection,
    actor,
    decision,
  };
  let connection = request.perform(app.store()).await?;
  Ok(HttpResponse::Ok().json(connection))
}

#[tracing::instrument(skip(app), name = "http.connections.cancel")]
pub async fn cancel(
  app: web::Data<App>,
  path: web::Path<ConnectionId>,
  body: web::Json<ActorBody>,
) -> Result<HttpResponse, Error> {
  let request = CancelConnectionRequest {
    connection: path.into_inner(),
    actor: body.user_id,
  };
  let connection = request.perform(app.store()).await?;
  Ok(HttpResponse::Ok().json(connection))
}

#[cfg(test)]
mod tests {
  use actix_web::{http::StatusCode, test};
  use assert_json_diff::{assert_json_eq, assert_json_include};
  use serde_json::{json, Value};
  use std::sync::Arc;

  use crate::http::build_http_app;
  use crate::schema::ConnectionStatus;
  use crate::store::InMemoryStore;
  use crate::test_utils;

  #[actix_web::test]
  async fn sends_and_accepts_a_request() {
    let store = Arc::new(InMemoryStore::new());
    let alice = test_utils::user(&store, "alice").await;
    let bob = test_utils::user(&store, "bob").await;
    let service = test::init_service(build_http_app(test_utils::app(store.clone()))).await;

    let request = test::TestRequest::post()
      .uri("/connections")
      .set_json(json!({ "requesterId": alice.0, "recipientId": bob.0 }))
      .to_request();
    let response = test::call_service(&service, request).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let created: Value = test::read_body_json(response).await;
    assert_json_include!(
      actual: created.clone(),
      expected: json!({ "requesterId": alice.0, "recipientId": bob.0, "status": "PENDING" })
    );

    let id = created["id"].as_i64().unwrap();
    let request = test::TestRequest::post()
      .uri(&format!("/connections/{id}/accept"))
      .set_json(json!({ "userId": bob.0 }))
      .to_request();
    let response = test::call_service(&service, request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let accepted: Value = test::read_body_json(response).await;
    assert_eq!(accepted["status"], json!("APPROVED"));
  }

  #[actix_web::test]
  async fn duplicate_request_is_a_conflict() {
    let store = Arc::new(InMemoryStore::new());
    let alice = test_utils::user(&store, "alice").await;
    let bob = test_utils::user(&store, "bob").await;
    test_utils::connect(&store, bob, alice, ConnectionStatus::Pending).await;
    let service = test::init_service(build_http_app(test_utils::app(store))).await;

    let request = test::TestRequest::post()
      .uri("/connections")
      .set_json(json!({ "requesterId": alice.0, "recipientId": bob.0 }))
      .to_request();
    let response = test::call_service(&service, request).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["type"], json!("conflict"));
  }

  #[actix_web::test]
  async fn requester_cannot_accept_own_request() {
    let store = Arc::new(InMemoryStore::new());
    let alice = test_utils::user(&store, "alice").await;
    let bob = test_utils::user(&store, "bob").await;
    let pending = test_utils::connect(&store, alice, bob, ConnectionStatus::Pending).await;
    let service = test::init_service(build_http_app(test_utils::app(store))).await;

    let request = test::TestRequest::post()
      .uri(&format!("/connections/{}/accept", pending.id))
      .set_json(json!({ "userId": alice.0 }))
      .to_request();
    let response = test::call_service(&service, request).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body: Value = test::read_body_json(response).await;
    assert_json_eq!(body, json!({ "type": "forbidden" }));
  }

  #[actix_web::test]
  async fn cancelled_request_cannot_be_rejected() {
    let store = Arc::new(InMemoryStore::new());
    let alice = test_utils::user(&store, "alice").await;
    let bob = test_utils::user(&store, "bob").await;
    let pending = test_utils::connect(&store, alice, bob, ConnectionStatus::Pending).await;
    let service = test::init_service(build_http_app(test_utils::app(store))).await;

    let request = test::TestRequest::post()
      .uri(&format!("/connections/{}/cancel", pending.id))
      .set_json(json!({ "userId": alice.0 }))
      .to_request();
    let response = test::call_service(&service, request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let request = test::TestRequest::post()
      .uri(&format!("/connections/{}/reject", pending.id))
      .set_json(json!({ "userId": bob.0 }))
      .to_request();
    let response = test::call_service(&service, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
  }

  #[actix_web::test]
  async fn malformed_body_is_an_invalid_request() {
    let store = Arc::new(InMemoryStore::new());
    let service = test::init_service(build_http_app(test_utils::app(store))).await;

    let request = test::TestRequest::post()
      .uri("/connections")
      .set_json(json!({ "requesterId": "alice" }))
      .to_request();
    let response = test::call_service(&service, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["type"], json!("invalid_request"));
  }

  #[actix_web::test]
  async fn non_numeric_connection_id_is_an_invalid_request() {
    let store = Arc::new(InMemoryStore::new());
    let service = test::init_service(build_http_app(test_utils::app(store))).await;

    let request = test::TestRequest::post()
      .uri("/connections/abc/accept")
      .set_json(json!({ "userId": 1 }))
      .to_request();
    let response = test::call_service(&service, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
  }
}
