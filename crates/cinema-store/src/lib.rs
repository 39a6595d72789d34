mod bootstrap;
mod error;
mod store;

pub use error::StoreError;
pub use store::MovieStore;
