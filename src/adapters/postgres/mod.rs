//! PostgreSQL adapter - the store behind the relational RPC endpoint.

mod schema;
mod store;

pub use store::PostgresStore;
