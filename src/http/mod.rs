pub mod controllers;
pub mod error;

mod server;

pub use error::Error;
pub use server::{build_http_app, serve, StartServerError};
