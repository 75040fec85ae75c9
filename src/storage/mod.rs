//! Storage Module
//!
//! Adapter over the embedded SQLite store: opening connections, the table
//! schema, the statements the cache runs, and the connection pool.

mod pool;
mod schema;
pub(crate) mod table;

pub use pool::{ConnectionPool, PooledConnection};
pub use schema::{init_schema, open_connection, StoreTarget, INDEX_NAME, TABLE_NAME};
