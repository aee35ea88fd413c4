use clap::Parser;
use coryfi_connect::{config::Server as Config, http::StartServerError, logging};
use error_stack::{Result, ResultExt};
use std::net::IpAddr;
use std::num::NonZeroUsize;

/// Expose the Coryfi Connect HTTP API
#[derive(Debug, Parser)]
pub struct ServerCommand {
  #[clap(long)]
  pub address: Option<IpAddr>,
  #[clap(long)]
  pub port: Option<u16>,
  #[clap(long)]
  pub workers: Option<NonZeroUsize>,
}

pub fn run(args: ServerCommand) -> Result<(), StartServerError> {
  let mut config = Config::load().change_context(StartServerError)?;
  args.override_config(&mut config);

  logging::init(&config.logging).change_context(StartServerError)?;
  tokio::runtime::Builder::new_multi_thread()
    .enable_all()
    .worker_threads(config.workers)
    .build()
    .change_context(StartServerError)
    .attach_printable("could not build tokio runtime")?
    .block_on(coryfi_connect::http::serve(config))
}

impl ServerCommand {
  fn override_config(&self, config: &mut Config) {
    // cli flags win over the config file and environment
    if let Some(address) = self.address {
      config.ip = address;
    }

    if let Some(port) = self.port {
      config.port = port;
    }

    if let Some(workers) = self.workers {
      config.workers = workers.get();
    }
  }
}
