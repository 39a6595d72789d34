use std::fmt;

use cinema_schema::FieldErrors;

#[derive(Debug)]
pub enum StoreError {
    /// The embedded dataset could not be loaded.
    Bootstrap(String),
    /// A record in the embedded dataset failed validation.
    InvalidRecord { id: String, errors: FieldErrors },
    DuplicateId(String),
    IndexOutOfBounds { index: usize, len: usize },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Bootstrap(msg) => write!(f, "bootstrap error: {msg}"),
            StoreError::InvalidRecord { id, errors } => {
                write!(f, "bootstrap record {id} is invalid: {errors}")
            }
            StoreError::DuplicateId(id) => write!(f, "duplicate movie id: {id}"),
            StoreError::IndexOutOfBounds { index, len } => {
                write!(f, "index {index} out of bounds for store of {len} movies")
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::InvalidRecord { errors, .. } => Some(errors),
            _ => None,
        }
    }
}
