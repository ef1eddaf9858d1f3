//! Error types for playlist generation

use std::time::Duration;
use thiserror::Error;

/// Failures reported by a [`Catalog`](crate::catalog::Catalog) implementation
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The backing store could not be reached
    #[error("Catalog unreachable: {0}")]
    Unreachable(String),

    /// A query did not answer in time
    #[error("Catalog query timed out after {0:?}")]
    Timeout(Duration),

    /// The requested object does not exist
    #[error("Object not found: {0}")]
    ObjectNotFound(i64),

    /// Catalog data could not be decoded
    #[error("Malformed catalog data: {0}")]
    Malformed(String),
}

/// Fatal errors of a single generation run
///
/// Anything not listed here degrades into the result's diagnostics instead
/// of aborting the run.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// An external query failed or timed out; the caller may retry
    #[error("Data unavailable: {0}")]
    DataUnavailable(#[from] CatalogError),

    /// Configuration rejected before any placement happened
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The run was cancelled while waiting on the catalog
    #[error("Generation cancelled")]
    Cancelled,
}

/// Track pool loader failures
#[derive(Debug, Error)]
pub enum PoolError {
    /// No eligible music although some duration was requested
    #[error("No eligible music tracks for object {object_id}")]
    Empty { object_id: i64 },

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Result type for generation runs
pub type Result<T> = std::result::Result<T, GeneratorError>;
