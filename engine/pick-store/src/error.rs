//! Error types for PickStore

use pick_engine::ProviderError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Value out of range for column {column}: {value}")]
    OutOfRange { column: &'static str, value: i64 },
}

impl From<StoreError> for ProviderError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Database(sqlx::Error::RowNotFound) => ProviderError::lookup(err.to_string()),
            other => ProviderError::storage(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_is_lookup_failure() {
        let err = ProviderError::from(StoreError::Database(sqlx::Error::RowNotFound));
        assert!(matches!(err, ProviderError::Lookup(_)));
    }

    #[test]
    fn test_pool_timeout_is_storage_failure() {
        let err = ProviderError::from(StoreError::Database(sqlx::Error::PoolTimedOut));
        assert!(matches!(err, ProviderError::Storage(_)));
    }

    #[test]
    fn test_out_of_range_message() {
        let err = StoreError::OutOfRange { column: "week", value: 4_294_967_296 };
        assert_eq!(err.to_string(), "Value out of range for column week: 4294967296");
    }
}
