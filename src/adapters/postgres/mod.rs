//! PostgreSQL adapters.

mod user_store;

pub use user_store::PostgresUserStore;
