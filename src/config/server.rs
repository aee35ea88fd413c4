use error_stack::{Report, Result};
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::num::{NonZeroU64, NonZeroUsize};
use url::Url;

use super::{Database, DbPoolConfig, Logging, ParseError, PathService};
use crate::util::figment::FigmentErrorAttachable;

#[derive(Debug, Clone, Deserialize)]
pub struct Server {
  /// **Environment variables**:
  /// - `CORYFI_IP`
  #[serde(default = "Server::default_ip")]
  pub ip: IpAddr,
  /// **Environment variables**:
  /// - `CORYFI_PORT`
  #[serde(default = "Server::default_port")]
  pub port: u16,
  /// Amount of HTTP workers (and tokio worker threads).
  ///
  /// **Environment variables**:
  /// - `CORYFI_WORKERS`
  #[serde(default = "Server::default_workers")]
  pub workers: usize,
  pub db: Database,
  #[serde(default)]
  pub logging: Logging,
  #[serde(default)]
  pub paths: PathService,
}

impl Server {
  pub fn load() -> Result<Self, ParseError> {
    dotenvy::dotenv().ok();

    let config = Self::figment()
      .extract::<Self>()
      .map_err(|e| Report::new(ParseError).attach_figment_error(e))?;

    config.validate()?;
    Ok(config)
  }

  /// Checks values that deserialize fine but cannot be used.
  pub fn validate(&self) -> Result<(), ParseError> {
    validate_db_url("db.primary.url", &self.db.primary.url)?;
    if let Some(replica) = self.db.replica.as_ref() {
      validate_db_url("db.replica.url", &replica.url)?;
    }

    let paths_url = Url::parse(&self.paths.url).map_err(|e| {
      Report::new(ParseError)
        .attach_printable(format!("{e}"))
        .attach_printable("for key \"paths.url\"")
    })?;

    if !matches!(paths_url.scheme(), "http" | "https") {
      return Err(
        Report::new(ParseError)
          .attach_printable("path service URL must use http or https")
          .attach_printable("for key \"paths.url\""),
      );
    }

    if self.workers == 0 {
      return Err(
        Report::new(ParseError)
          .attach_printable("workers must be at least 1")
          .attach_printable("for key \"workers\""),
      );
    }

    Ok(())
  }

  /// Configuration used by tests. It never touches the environment.
  #[must_use]
  pub fn for_tests() -> Self {
    Self {
      ip: Self::default_ip(),
      port: 0,
      workers: 1,
      db: Database {
        primary: DbPoolConfig::new("postgres://postgres@localhost/coryfi_test"),
        replica: None,
        enforce_tls: false,
        timeout_secs: DbPoolConfig::default_pool_timeout_secs(),
      },
      logging: Logging::default(),
      paths: PathService {
        url: "http://127.0.0.1:9/api/path".into(),
        timeout_secs: NonZeroU64::MIN,
      },
    }
  }
}

fn validate_db_url(key: &str, url: &str) -> Result<(), ParseError> {
  let parsed = Url::parse(url).map_err(|e| {
    Report::new(ParseError)
      .attach_printable(format!("{e}"))
      .attach_printable(format!("for key {key:?}"))
  })?;

  if !matches!(parsed.scheme(), "postgres" | "postgresql") {
    return Err(
      Report::new(ParseError)
        .attach_printable("invalid Postgres connection URL")
        .attach_printable(format!("for key {key:?}")),
    );
  }

  Ok(())
}

impl Server {
  const DEFAULT_CONFIG_FILE: &'static str = "coryfi.toml";
  const DEFAULT_PORT: u16 = 8080;

  fn default_ip() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
  }

  const fn default_port() -> u16 {
    Self::DEFAULT_PORT
  }

  fn default_workers() -> usize {
    std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
  }

  /// Creates a default [`Figment`] object to load server
  /// configuration. Exposed to the crate for testing.
  ///
  /// [`Figment`]: figment::Figment
  pub(crate) fn figment() -> figment::Figment {
    use figment::{
      providers::{Env, Format, Toml},
      Figment,
    };

    Figment::new()
      .merge(Toml::file(Self::DEFAULT_CONFIG_FILE))
      // Fields with underscores in their names cannot be split
      // blindly so they are aliased one by one.
      .merge(Env::prefixed("CORYFI_").map(|v| match v.as_str() {
        "DB_PRIMARY_MIN_IDLE" => "db.primary.min_idle".into(),
        "DB_PRIMARY_POOL_SIZE" => "db.primary.pool_size".into(),

        "DB_REPLICA_MIN_IDLE" => "db.replica.min_idle".into(),
        "DB_REPLICA_POOL_SIZE" => "db.replica.pool_size".into(),

        "DB_ENFORCE_TLS" => "db.enforce_tls".into(),
        "DB_TIMEOUT_SECS" => "db.timeout_secs".into(),

        "PATHS_TIMEOUT_SECS" => "paths.timeout_secs".into(),

        _ => v.as_str().replace('_', ".").into(),
      }))
      // Environment variable aliases
      .merge(
        Env::raw()
          .only(&["DATABASE_URL"])
          .map(|_| "db.primary.url".into()),
      )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::LogStyle;
  use figment::Jail;
  use std::num::{NonZeroU32, NonZeroU64};

  #[test]
  fn env_aliases() {
    Jail::expect_with(|jail| {
      jail.set_env("DATABASE_URL", "postgres://localhost/coryfi");

      jail.set_env("CORYFI_DB_PRIMARY_MIN_IDLE", "100");
      jail.set_env("CORYFI_DB_PRIMARY_POOL_SIZE", "100");

      jail.set_env("CORYFI_DB_REPLICA_URL", "postgres://replica/coryfi");
      jail.set_env("CORYFI_DB_REPLICA_MIN_IDLE", "589");
      jail.set_env("CORYFI_DB_REPLICA_POOL_SIZE", "589");

      jail.set_env("CORYFI_DB_ENFORCE_TLS", "false");
      jail.set_env("CORYFI_DB_TIMEOUT_SECS", "3030");

      jail.set_env("CORYFI_PATHS_TIMEOUT_SECS", "42");
      jail.set_env("CORYFI_LOGGING_STYLE", "pretty");

      let config: Server = Server::figment().extract()?;
      assert_eq!(config.db.primary.url.as_str(), "postgres://localhost/coryfi");
      assert_eq!(
        config.db.primary.min_idle.unwrap(),
        NonZeroU32::new(100).unwrap()
      );
      assert_eq!(config.db.primary.pool_size, NonZeroU32::new(100).unwrap());
      assert_eq!(
        config.db.replica.as_ref().unwrap().min_idle.unwrap(),
        NonZeroU32::new(589).unwrap()
      );
      assert_eq!(
        config.db.replica.as_ref().unwrap().pool_size,
        NonZeroU32::new(589).unwrap()
      );

      assert!(!config.db.enforce_tls);
      assert_eq!(config.db.timeout_secs, NonZeroU64::new(3030).unwrap());
      assert_eq!(config.paths.timeout_secs, NonZeroU64::new(42).unwrap());
      assert_eq!(config.logging.style, LogStyle::Pretty);

      Ok(())
    });
  }

  #[test]
  fn reads_config_file_with_defaults() {
    Jail::expect_with(|jail| {
      jail.create_file(
        "coryfi.toml",
        r#"
          port = 3000

          [db.primary]
          url = "postgres://localhost/coryfi"
        "#,
      )?;

      let config: Server = Server::figment().extract()?;
      assert_eq!(config.port, 3000);
      assert_eq!(config.ip, Server::default_ip());
      assert!(config.db.enforce_tls);
      assert!(config.db.replica.is_none());
      assert_eq!(config.logging.level, "info");
      assert_eq!(config.paths.url, "https://neo.coryfi.com/api/path");
      assert!(config.validate().is_ok());

      Ok(())
    });
  }

  #[test]
  fn rejects_non_postgres_database_url() {
    let mut config = Server::for_tests();
    config.db.primary = DbPoolConfig::new("mysql://localhost/coryfi");
    assert!(config.validate().is_err());
  }

  #[test]
  fn rejects_non_http_path_service_url() {
    let mut config = Server::for_tests();
    config.paths.url = "ftp://neo.coryfi.com".into();
    assert!(config.validate().is_err());

    config.paths.url = "not a url".into();
    assert!(config.validate().is_err());
  }

  #[test]
  fn test_config_is_valid() {
    assert!(Server::for_tests().validate().is_ok());
  }
}
