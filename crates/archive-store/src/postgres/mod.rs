//! PostgreSQL-backed store.

pub mod connection;
pub mod migration;
pub mod rows;
pub mod store;

pub use connection::DatabasePool;
pub use store::PgResourceStore;
