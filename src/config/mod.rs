use thiserror::Error;

mod database;
mod logging;
mod paths;
mod server;

pub use database::{Database, DbPoolConfig};
pub use logging::{LogStyle, Logging};
pub use paths::PathService;
pub use server::Server;

#[derive(Debug, Error)]
#[error("Failed to load configuration")]
pub struct ParseError;
