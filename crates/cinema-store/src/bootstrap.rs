use cinema_schema::{Movie, validate_full};
use serde_json::Value;

use crate::error::StoreError;

const DATASET: &str = include_str!("../data/movies.json");

pub(crate) fn load() -> Result<Vec<Movie>, StoreError> {
    parse(DATASET)
}

pub(crate) fn parse(raw: &str) -> Result<Vec<Movie>, StoreError> {
    let entries: Vec<Value> = serde_json::from_str(raw)
        .map_err(|e| StoreError::Bootstrap(format!("malformed dataset: {e}")))?;

    entries
        .iter()
        .enumerate()
        .map(|(position, entry)| {
            let id = entry
                .get("id")
                .and_then(Value::as_str)
                .ok_or_else(|| StoreError::Bootstrap(format!("entry {position} has no string id")))?;
            let movie = validate_full(entry).map_err(|errors| StoreError::InvalidRecord {
                id: id.to_string(),
                errors,
            })?;
            Ok(Movie::from_new(id, movie))
        })
        .collect()
}
