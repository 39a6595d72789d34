use cinema_schema::{Movie, NewMovie};
use uuid::Uuid;

use crate::bootstrap;
use crate::error::StoreError;

/// Ordered, in-memory collection of movies.
///
/// There is no internal locking. Callers that share a store across threads
/// must hold one lock around every lookup that feeds a later `update` or
/// `remove_at`, otherwise the index can go stale in between.
#[derive(Debug, Default, Clone)]
pub struct MovieStore {
    movies: Vec<Movie>,
}

impl MovieStore {
    pub fn new() -> Self {
        Self { movies: Vec::new() }
    }

    /// Load the dataset bundled with the crate. Every record is run through
    /// full validation and keeps its own id.
    pub fn bootstrap() -> Result<Self, StoreError> {
        Self::from_records(bootstrap::load()?)
    }

    pub fn from_records(records: Vec<Movie>) -> Result<Self, StoreError> {
        let mut store = Self::with_capacity(records.len());
        for movie in records {
            store.append(movie)?;
        }
        Ok(store)
    }

    fn with_capacity(capacity: usize) -> Self {
        Self {
            movies: Vec::with_capacity(capacity),
        }
    }

    pub fn all(&self) -> &[Movie] {
        &self.movies
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    pub fn append(&mut self, movie: Movie) -> Result<(), StoreError> {
        if self.find_index_by_id(&movie.id).is_some() {
            return Err(StoreError::DuplicateId(movie.id));
        }
        self.movies.push(movie);
        Ok(())
    }

    /// Assign a fresh id to a validated movie and append it.
    pub fn create(&mut self, movie: NewMovie) -> &Movie {
        let id = self.fresh_id();
        let index = self.movies.len();
        self.movies.push(Movie::from_new(id, movie));
        &self.movies[index]
    }

    fn fresh_id(&self) -> String {
        loop {
            let id = Uuid::new_v4().to_string();
            if self.find_index_by_id(&id).is_none() {
                return id;
            }
        }
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Movie> {
        self.movies.iter().find(|m| m.id == id)
    }

    pub fn find_index_by_id(&self, id: &str) -> Option<usize> {
        self.movies.iter().position(|m| m.id == id)
    }

    pub fn get(&self, index: usize) -> Option<&Movie> {
        self.movies.get(index)
    }

    pub fn update(&mut self, index: usize, movie: Movie) -> Result<&Movie, StoreError> {
        let len = self.movies.len();
        let slot = self
            .movies
            .get_mut(index)
            .ok_or(StoreError::IndexOutOfBounds { index, len })?;
        *slot = movie;
        Ok(&*slot)
    }

    pub fn remove_at(&mut self, index: usize) -> Result<Movie, StoreError> {
        if index >= self.movies.len() {
            return Err(StoreError::IndexOutOfBounds {
                index,
                len: self.movies.len(),
            });
        }
        Ok(self.movies.remove(index))
    }

    /// Movies tagged with `tag`, compared case-insensitively against whole
    /// genre names.
    pub fn filter_by_genre(&self, tag: &str) -> Vec<&Movie> {
        self.movies.iter().filter(|m| m.has_genre(tag)).collect()
    }
}
