pub mod connection;
pub mod history;
pub mod metadata;
pub mod models;
pub mod ratings;
pub mod setup;

pub use connection::{create_pool, get_connection, DbConn, DbPool};
pub use models::*;
