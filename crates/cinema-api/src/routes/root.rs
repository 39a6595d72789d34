use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};

use crate::cors::{OriginRule, request_origin};
use crate::state::AppState;

pub async fn hello(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let cors = state
        .cors
        .headers(request_origin(&headers), OriginRule::AllowListed);
    (cors, Json(serde_json::json!({ "message": "Hello World" }))).into_response()
}
