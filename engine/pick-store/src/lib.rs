//! PickStore - PostgreSQL persistence for PickEngine
//!
//! Implements the engine's [`SeasonProvider`](pick_engine::SeasonProvider),
//! [`LeagueDirectory`](pick_engine::LeagueDirectory) and
//! [`PickSink`](pick_engine::PickSink) traits over a sqlx connection pool.
//! Schema migrations live in `migrations/` and are embedded at build time.

pub mod config;
pub mod error;
pub mod postgres;

pub use config::DatabaseConfig;
pub use error::StoreError;
pub use postgres::PgPickStore;

/// Result type alias
pub type Result<T> = std::result::Result<T, StoreError>;
