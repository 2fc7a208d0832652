use thiserror::Error;

/// Core error type shared across Datasim crates.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// The schema violates the submission rules.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    /// A field index outside the schema's field list.
    #[error("field index {0} out of range")]
    FieldIndex(usize),
    /// Removing the last remaining field is rejected.
    #[error("a schema must retain at least one field")]
    LastField,
}

/// Convenience alias for results returned by Datasim crates.
pub type Result<T> = std::result::Result<T, Error>;
