use error_stack::ResultExt;
use sqlx::migrate::Migrator;
use tokio::time::Instant;
use tracing::info;

use super::{Error, Pool, Result};

/// Schema migrations embedded from the `migrations` directory.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[tracing::instrument(skip_all, name = "db.migrations.run_pending")]
pub async fn run_pending(pool: &Pool) -> Result<()> {
  let now = Instant::now();
  info!("Performing database migrations... (this may take a while)");

  MIGRATOR
    .run(pool.as_inner())
    .await
    .change_context(Error::Migration)?;

  let elapsed = now.elapsed();
  info!("Successfully performed database migrations! took {elapsed:.2?}");

  Ok(())
}
