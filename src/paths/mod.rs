//! Gateway to the external path-ranking service.
//!
//! Finding introduction paths between two people is not computed here.
//! Queries are forwarded as-is and the service's JSON answer is handed
//! back untouched.
use error_stack::{Report, Result, ResultExt};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::config;
use crate::util::Sensitive;

#[derive(Debug, Error)]
pub enum PathServiceError {
  #[error("invalid path query")]
  InvalidQuery,
  #[error("could not set up the path service client")]
  Setup,
  #[error("path service is unreachable")]
  Unreachable,
  #[error("path service rejected the query")]
  Rejected,
  #[error("path service returned a malformed response")]
  Malformed,
}

/// Body sent to the path service.
#[derive(Debug, Serialize)]
pub struct PathQuery {
  pub source: Sensitive<String>,
  pub target: Sensitive<String>,
}

#[derive(Debug, Clone)]
pub struct PathClient {
  http: reqwest::Client,
  url: Url,
}

impl PathClient {
  pub fn new(cfg: &config::PathService) -> Result<Self, PathServiceError> {
    let url = Url::parse(&cfg.url)
      .change_context(PathServiceError::Setup)
      .attach_printable_lazy(|| format!("invalid path service URL {:?}", cfg.url))?;

    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(cfg.timeout_secs.get()))
      .user_agent(concat!("coryfi-connect/", env!("CARGO_PKG_VERSION")))
      .build()
      .change_context(PathServiceError::Setup)?;

    Ok(Self { http, url })
  }

  #[must_use]
  pub fn url(&self) -> &Url {
    &self.url
  }

  #[tracing::instrument(skip(self), name = "paths.client.query")]
  pub async fn query(&self, query: &PathQuery) -> Result<serde_json::Value, PathServiceError> {
    let response = self
      .http
      .post(self.url.clone())
      .json(query)
      .send()
      .await
      .change_context(PathServiceError::Unreachable)?;

    let status = response.status();
    if !status.is_success() {
      return Err(
        Report::new(PathServiceError::Rejected)
          .attach_printable(format!("path service responded with {status}")),
      );
    }

    response
      .json::<serde_json::Value>()
      .await
      .change_context(PathServiceError::Malformed)
  }
}

#[derive(Debug)]
pub struct FindPath {
  pub source: Sensitive<String>,
  pub target: Sensitive<String>,
}

impl FindPath {
  #[tracing::instrument(skip(client), name = "services.paths.find")]
  pub async fn perform(self, client: &PathClient) -> Result<serde_json::Value, PathServiceError> {
    let source = self.source.trim();
    let target = self.target.trim();

    if source.is_empty() || target.is_empty() {
      return Err(
        Report::new(PathServiceError::InvalidQuery)
          .attach_printable("source and target must not be empty"),
      );
    }

    if source.eq_ignore_ascii_case(target) {
      return Err(
        Report::new(PathServiceError::InvalidQuery)
          .attach_printable("source and target must be different people"),
      );
    }

    let query = PathQuery {
      source: Sensitive::new(source.to_string()),
      target: Sensitive::new(target.to_string()),
    };
    client.query(&query).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_utils;
  use assert_json_diff::assert_json_eq;
  use serde_json::json;
  use std::net::SocketAddr;
  use std::num::NonZeroU64;

  fn client_for(addr: SocketAddr, route: &str) -> PathClient {
    PathClient::new(&config::PathService {
      url: format!("http://{addr}{route}"),
      timeout_secs: NonZeroU64::new(5).unwrap(),
    })
    .unwrap()
  }

  fn find(source: &str, target: &str) -> FindPath {
    FindPath {
      source: Sensitive::new(source.into()),
      target: Sensitive::new(target.into()),
    }
  }

  #[actix_web::test]
  async fn forwards_query_and_returns_body_unchanged() {
    let client = client_for(test_utils::spawn_path_service(), "/api/path");

    let body = find(" a@coryfi.com ", "b@coryfi.com")
      .perform(&client)
      .await
      .unwrap();

    assert_json_eq!(
      body,
      json!({
        "received": { "source": "a@coryfi.com", "target": "b@coryfi.com" },
        "paths": [{ "hops": ["a@coryfi.com", "b@coryfi.com"], "strength": 0.8 }],
      })
    );
  }

  #[actix_web::test]
  async fn non_success_status_is_rejected() {
    let client = client_for(test_utils::spawn_path_service(), "/api/failing");
    let error = find("a@coryfi.com", "b@coryfi.com")
      .perform(&client)
      .await
      .unwrap_err();

    assert!(matches!(
      error.current_context(),
      PathServiceError::Rejected
    ));
  }

  #[actix_web::test]
  async fn undecodable_body_is_malformed() {
    let client = client_for(test_utils::spawn_path_service(), "/api/garbled");
    let error = find("a@coryfi.com", "b@coryfi.com")
      .perform(&client)
      .await
      .unwrap_err();

    assert!(matches!(
      error.current_context(),
      PathServiceError::Malformed
    ));
  }

  #[actix_web::test]
  async fn unreachable_service() {
    // port 9 (discard) is not expected to run an HTTP server
    let client = PathClient::new(&config::Server::for_tests().paths).unwrap();
    let error = find("a@coryfi.com", "b@coryfi.com")
      .perform(&client)
      .await
      .unwrap_err();

    assert!(matches!(
      error.current_context(),
      PathServiceError::Unreachable
    ));
  }

  #[tokio::test]
  async fn rejects_invalid_queries_before_calling_out() {
    let client = PathClient::new(&config::Server::for_tests().paths).unwrap();
    let cases = [
      ("", "b@coryfi.com"),
      ("a@coryfi.com", "  "),
      ("A@coryfi.com", "a@coryfi.com"),
    ];

    for (source, target) in cases {
      let error = find(source, target).perform(&client).await.unwrap_err();
      assert!(matches!(
        error.current_context(),
        PathServiceError::InvalidQuery
      ));
    }
  }
}
