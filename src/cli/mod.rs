use clap::Parser;
use error_stack::{Result, ResultExt};
use thiserror::Error;

mod migrate;
mod recommend;
mod server;

/// Command line options for Coryfi Connect.
#[derive(Debug, Parser)]
#[command(
  about = "Utility suite for the Coryfi Connect backend",
  version,
  author,
  long_about
)]
pub struct Cli {
  #[clap(subcommand)]
  pub subcommand: Subcommand,
}

#[derive(Debug, Error)]
#[error("Coryfi Connect command failed")]
pub struct CliError;

impl Cli {
  pub fn run(self) -> Result<(), CliError> {
    match self.subcommand {
      Subcommand::Server(args) => self::server::run(args).change_context(CliError),
      Subcommand::Migrate(args) => self::migrate::run(args).change_context(CliError),
      Subcommand::Recommend(args) => self::recommend::run(args).change_context(CliError),
    }
  }
}

#[derive(Debug, Parser)]
pub enum Subcommand {
  Server(self::server::ServerCommand),
  Migrate(self::migrate::MigrateCommand),
  Recommend(self::recommend::RecommendCommand),
}

/// Runs a one-off task on a fresh current-thread runtime.
fn block_on<F: std::future::Future>(future: F) -> std::io::Result<F::Output> {
  let runtime = tokio::runtime::Builder::new_current_thread()
    .enable_all()
    .build()?;
  Ok(runtime.block_on(future))
}
