use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use cinema_schema::{Movie, validate_full, validate_partial};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::cors::{OriginRule, request_origin};
use crate::error::ApiError;
use crate::state::AppState;

pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    let cors = state
        .cors
        .headers(request_origin(&headers), OriginRule::AllowListed);
    // A repeated `genre` key filters by its first value.
    let genre = params
        .iter()
        .find(|(key, _)| key == "genre")
        .map(|(_, value)| value.as_str());
    (cors, list_movies(&state, genre)).into_response()
}

fn list_movies(state: &AppState, genre: Option<&str>) -> Result<Json<Vec<Movie>>, ApiError> {
    let store = state.store()?;
    let movies = match genre.filter(|g| !g.is_empty()) {
        Some(tag) => store.filter_by_genre(tag).into_iter().cloned().collect(),
        None => store.all().to_vec(),
    };
    Ok(Json(movies))
}

pub async fn get(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let cors = state
        .cors
        .headers(request_origin(&headers), OriginRule::AllowListedOrAbsent);
    (cors, get_movie(&state, &id)).into_response()
}

fn get_movie(state: &AppState, id: &str) -> Result<Json<Movie>, ApiError> {
    let store = state.store()?;
    match store.find_by_id(id) {
        Some(movie) => Ok(Json(movie.clone())),
        None => Err(ApiError::movie_not_found()),
    }
}

pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let cors = state
        .cors
        .headers(request_origin(&headers), OriginRule::AllowListed);
    (cors, create_movie(&state, &headers, &body)).into_response()
}

fn create_movie(
    state: &AppState,
    headers: &HeaderMap,
    body: &Bytes,
) -> Result<(StatusCode, Json<Movie>), ApiError> {
    let payload = json_payload(headers, body)?;
    let movie = validate_full(&payload).inspect_err(|errors| {
        debug!(errors = %errors, "rejected movie");
    })?;

    let mut store = state.store()?;
    let created = store.create(movie).clone();
    info!(id = %created.id, title = %created.title, "movie created");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    let cors = state
        .cors
        .headers(request_origin(&headers), OriginRule::AllowListed);
    (cors, update_movie(&state, &id, &headers, &body)).into_response()
}

fn update_movie(
    state: &AppState,
    id: &str,
    headers: &HeaderMap,
    body: &Bytes,
) -> Result<Json<Movie>, ApiError> {
    let payload = json_payload(headers, body)?;
    let patch = validate_partial(&payload).inspect_err(|errors| {
        debug!(%id, errors = %errors, "rejected movie update");
    })?;

    // Lookup and write happen under one lock so the index cannot go stale.
    let mut store = state.store()?;
    let Some(index) = store.find_index_by_id(id) else {
        return Err(ApiError::NotFound("movie not found".to_string()));
    };

    let mut movie = store
        .get(index)
        .cloned()
        .ok_or_else(|| ApiError::NotFound("movie not found".to_string()))?;
    patch.apply(&mut movie);
    let updated = store.update(index, movie)?.clone();
    info!(%id, "movie updated");
    Ok(Json(updated))
}

pub async fn delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let cors = state
        .cors
        .headers(request_origin(&headers), OriginRule::AllowListedOrAbsent);
    (cors, delete_movie(&state, &id)).into_response()
}

fn delete_movie(state: &AppState, id: &str) -> Result<Json<Value>, ApiError> {
    let mut store = state.store()?;
    let index = store
        .find_index_by_id(id)
        .ok_or_else(ApiError::movie_not_found)?;
    let removed = store.remove_at(index)?;
    info!(id = %removed.id, title = %removed.title, "movie deleted");
    Ok(Json(serde_json::json!({ "message": "Movie deleted" })))
}

pub async fn preflight(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    debug!(%id, "preflight");
    let cors = state.cors.preflight_headers(request_origin(&headers));
    (StatusCode::OK, cors, "OK").into_response()
}

/// Reads a write payload. An empty body, or one not sent as JSON, is an empty
/// object; a JSON body that does not parse is a bad request.
fn json_payload(headers: &HeaderMap, body: &Bytes) -> Result<Value, ApiError> {
    if body.is_empty() || !is_json(headers) {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("Failed to parse the request body as JSON: {e}")))
}

fn is_json(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "application/json" || mime.ends_with("+json")
}
