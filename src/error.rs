//! Error taxonomy for the table core.
//!
//! Programming errors (out-of-range arguments at the public API boundary)
//! and construction failures are surfaced as errors. Vetoed transitions and
//! missing insert/delete handlers are normal control flow and come back as
//! `Ok(false)` from the corresponding operations, never as errors.

/// Failure to construct a row view from the factory. Fatal to the viewport:
/// the table cannot function without its row prototype.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unable to construct row control: {message}")]
pub struct ConstructionError {
    pub message: String,
}

impl ConstructionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Failure inside a content provider while populating a row. Recovered
/// locally: the affected row displays an error marker instead of data.
#[derive(Debug, Clone, thiserror::Error)]
#[error("content provider failed: {message}")]
pub struct ProviderError {
    pub message: String,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors surfaced by the public table API.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TableError {
    /// `set_top_row` argument outside `[0, collection_size)`. The public API
    /// rejects rather than clamps; internal recomputes clamp defensively.
    #[error("top row {requested} outside legal range 0..{collection_size}")]
    TopRowOutOfRange {
        requested: usize,
        collection_size: usize,
    },

    /// `set_selection` target outside the collection or the row's columns.
    #[error("selection (column {column}, row {row}) outside legal range")]
    SelectionOutOfRange { column: usize, row: isize },

    /// A row control was passed that is not currently materialized.
    #[error("row control is not currently visible inside the table")]
    RowNotVisible,

    #[error(transparent)]
    Construction(#[from] ConstructionError),
}
