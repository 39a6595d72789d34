pub mod config;
pub mod cors;
pub mod error;
pub mod routes;
pub mod state;

use axum::Router;

use crate::state::AppState;

/// The full HTTP surface, bound to its state.
pub fn app(state: AppState) -> Router {
    routes::router().with_state(state)
}
