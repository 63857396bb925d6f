//! Error taxonomy for loading, filtering, and querying trip data.

use thiserror::Error;

use crate::city::City;

/// Errors surfaced by the core pipeline.
///
/// A missing optional column is not an error; see [`crate::stats::Capability`].
#[derive(Debug, Error)]
pub enum ExplorerError {
    /// The city's source could not be found or read. Nothing was loaded.
    #[error("trip data for {city} is unavailable: {reason}")]
    SourceUnavailable { city: City, reason: String },

    /// A required field failed to parse. The whole load is aborted.
    #[error("malformed row at line {line}: {reason}")]
    MalformedRow { line: u64, reason: String },

    /// A city, month, or day outside the fixed tables.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// A statistic that needs at least one record was asked of an empty set.
    #[error("no trips match the selected filters ({0} needs at least one record)")]
    EmptyDataset(&'static str),
}

impl ExplorerError {
    pub(crate) fn unavailable(city: City, reason: impl ToString) -> Self {
        Self::SourceUnavailable {
            city,
            reason: reason.to_string(),
        }
    }

    pub(crate) fn malformed(line: u64, reason: impl ToString) -> Self {
        Self::MalformedRow {
            line,
            reason: reason.to_string(),
        }
    }
}

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, ExplorerError>;
