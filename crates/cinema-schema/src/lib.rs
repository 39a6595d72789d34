mod error;
mod movie;
mod validate;

pub use error::{FieldError, FieldErrors, IssueCode, PathSegment};
pub use movie::{Genre, Movie, MoviePatch, NewMovie};
pub use validate::{DEFAULT_RATE, MAX_RATE, MAX_YEAR, MIN_RATE, MIN_YEAR, validate_full, validate_partial};
