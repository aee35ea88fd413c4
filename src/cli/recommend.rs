use clap::Parser;
use coryfi_connect::{
  config::Server as Config, logging, recommend::RecommendConnections, store::PgStore,
  util::Sensitive,
};
use error_stack::{Result, ResultExt};
use thiserror::Error;

/// Print connection recommendations for a user as JSON
#[derive(Debug, Parser)]
pub struct RecommendCommand {
  #[clap(long)]
  pub email: String,
}

#[derive(Debug, Error)]
#[error("Could not compute recommendations")]
pub struct RecommendCommandError;

pub fn run(args: RecommendCommand) -> Result<(), RecommendCommandError> {
  let config = Config::load().change_context(RecommendCommandError)?;
  logging::init(&config.logging).change_context(RecommendCommandError)?;

  let recommendation = super::block_on(async {
    let store = PgStore::connect(&config.db)
      .await
      .change_context(RecommendCommandError)?;

    RecommendConnections {
      email: Sensitive::new(args.email),
    }
    .perform(&store)
    .await
    .change_context(RecommendCommandError)
  })
  .change_context(RecommendCommandError)
  .attach_printable("could not build tokio runtime")??;

  let output = serde_json::to_string_pretty(&recommendation).change_context(RecommendCommandError)?;
  println!("{output}");
  Ok(())
}
