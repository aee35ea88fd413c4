use serde::Deserialize;
use std::num::NonZeroU64;

/// Connection settings for the external path-ranking service.
#[derive(Debug, Clone, Deserialize)]
pub struct PathService {
  /// Endpoint receiving path queries.
  ///
  /// **Environment variables**:
  /// - `CORYFI_PATHS_URL`
  #[serde(default = "PathService::default_url")]
  pub url: String,
  /// **Environment variables**:
  /// - `CORYFI_PATHS_TIMEOUT_SECS`
  #[serde(default = "PathService::default_timeout_secs")]
  pub timeout_secs: NonZeroU64,
}

impl PathService {
  const DEFAULT_TIMEOUT_SECS: u64 = 10;

  fn default_url() -> String {
    "https://neo.coryfi.com/api/path".into()
  }

  const fn default_timeout_secs() -> NonZeroU64 {
    match NonZeroU64::new(Self::DEFAULT_TIMEOUT_SECS) {
      Some(n) => n,
      None => panic!("DEFAULT_TIMEOUT_SECS is accidentally set to 0"),
    }
  }
}

impl Default for PathService {
  fn default() -> Self {
    Self {
      url: Self::default_url(),
      timeout_secs: Self::default_timeout_secs(),
    }
  }
}
