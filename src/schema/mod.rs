mod connection;
mod user;

pub use connection::{Connection, ConnectionStatus, GroupedCount};
pub use user::User;
