//! Coryfi Connect: connection recommendations and connection requests
//! for the Coryfi people network.
pub mod app;
pub mod config;
pub mod connections;
pub mod database;
pub mod http;
pub mod logging;
pub mod paths;
pub mod recommend;
pub mod schema;
pub mod store;
pub mod types;
pub mod util;

pub use app::App;

#[cfg(test)]
mod test_utils;
