//! Engine error types.

use upkeep_core::DomainError;
use upkeep_storage::StorageError;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors surfaced by the schedule engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Input rejected before anything was written
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Storage failure while working on a schedule year
    #[error("storage failure for asset {asset}, year {year}: {source}")]
    Schedule {
        /// Asset code
        asset: String,
        /// Schedule year being processed
        year: i32,
        /// Underlying storage error
        #[source]
        source: StorageError,
    },

    /// Storage failure outside a specific schedule year
    #[error("storage failure for {context}: {source}")]
    Storage {
        /// What was being read or written
        context: String,
        /// Underlying storage error
        #[source]
        source: StorageError,
    },
}

impl EngineError {
    pub(crate) fn schedule(asset: &str, year: i32) -> impl FnOnce(StorageError) -> Self + '_ {
        move |source| EngineError::Schedule {
            asset: asset.to_string(),
            year,
            source,
        }
    }

    pub(crate) fn storage(context: impl Into<String>) -> impl FnOnce(StorageError) -> Self {
        let context = context.into();
        move |source| EngineError::Storage { context, source }
    }
}
