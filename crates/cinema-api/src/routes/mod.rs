mod movies;
mod root;

use axum::Router;
use axum::routing::get;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root::hello))
        .route("/movies", get(movies::list).post(movies::create))
        .route(
            "/movies/{id}",
            get(movies::get)
                .patch(movies::update)
                .delete(movies::delete)
                .options(movies::preflight),
        )
}
