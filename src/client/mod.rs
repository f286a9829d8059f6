//! Database client layer

pub mod executor;
pub mod postgres;

pub use executor::QueryExecutor;
pub use postgres::PgExecutor;
