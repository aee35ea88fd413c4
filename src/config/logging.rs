use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Logging {
  /// Default filter directive used when `RUST_LOG` is not set.
  ///
  /// **Environment variables**:
  /// - `CORYFI_LOGGING_LEVEL`
  #[serde(default = "Logging::default_level")]
  pub level: String,
  /// **Environment variables**:
  /// - `CORYFI_LOGGING_STYLE`
  #[serde(default)]
  pub style: LogStyle,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogStyle {
  Compact,
  #[default]
  Full,
  Pretty,
}

impl Logging {
  fn default_level() -> String {
    "info".into()
  }
}

impl Default for Logging {
  fn default() -> Self {
    Self {
      level: Self::default_level(),
      style: LogStyle::default(),
    }
  }
}
