use clap::Parser;
use coryfi_connect::{config::Server as Config, database::migrations, logging, store::PgStore};
use error_stack::{Result, ResultExt};
use thiserror::Error;

/// Apply pending database migrations to the primary database
#[derive(Debug, Parser)]
pub struct MigrateCommand {}

#[derive(Debug, Error)]
#[error("Could not migrate the database")]
pub struct MigrateError;

pub fn run(_args: MigrateCommand) -> Result<(), MigrateError> {
  let config = Config::load().change_context(MigrateError)?;
  logging::init(&config.logging).change_context(MigrateError)?;

  super::block_on(async {
    let store = PgStore::connect(&config.db)
      .await
      .change_context(MigrateError)?;

    migrations::run_pending(store.primary())
      .await
      .change_context(MigrateError)
  })
  .change_context(MigrateError)
  .attach_printable("could not build tokio runtime")?
}
