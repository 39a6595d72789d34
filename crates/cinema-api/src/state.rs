use std::sync::{Arc, Mutex, MutexGuard};

use cinema_store::MovieStore;

use crate::cors::OriginPolicy;
use crate::error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Mutex<MovieStore>>,
    pub cors: Arc<OriginPolicy>,
}

impl AppState {
    pub fn new(store: MovieStore, cors: OriginPolicy) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            cors: Arc::new(cors),
        }
    }

    /// Lock the store. Hold the guard across any index lookup that feeds an
    /// update or removal.
    pub fn store(&self) -> Result<MutexGuard<'_, MovieStore>, ApiError> {
        self.store
            .lock()
            .map_err(|e| ApiError::Internal(format!("store lock poisoned: {e}")))
    }
}
