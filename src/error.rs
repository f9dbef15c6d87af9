//! Error types for dataset loading

use thiserror::Error;

/// Failure while fetching or reshaping one of the source tables.
///
/// Either variant is fatal at startup: the dashboard has nothing to render
/// without the full dataset.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Network error, non-success HTTP status, or a CSV body that cannot be read
    #[error("source unavailable ({source_url}): {reason}")]
    SourceUnavailable { source_url: String, reason: String },

    /// The CSV was readable but lacks an expected region or date column
    #[error("schema mismatch ({source_url}): {reason}")]
    SchemaMismatch { source_url: String, reason: String },
}

impl LoadError {
    pub fn unavailable(source_url: &str, reason: impl ToString) -> Self {
        Self::SourceUnavailable {
            source_url: source_url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn schema(source_url: &str, reason: impl ToString) -> Self {
        Self::SchemaMismatch {
            source_url: source_url.to_string(),
            reason: reason.to_string(),
        }
    }
}
