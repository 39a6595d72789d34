use std::collections::HashSet;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE, ORIGIN,
};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use cinema_api::cors::OriginPolicy;
use cinema_api::state::AppState;
use cinema_schema::{Genre, Movie, NewMovie};
use cinema_store::MovieStore;
use serde_json::{Value, json};
use tower::ServiceExt;

const ALLOWED: &str = "http://localhost:3001";
const FOREIGN: &str = "http://evil.example";

fn movie(id: &str, title: &str, genre: Vec<Genre>) -> Movie {
    Movie::from_new(
        id,
        NewMovie {
            title: title.to_string(),
            year: 1999,
            director: "Lana Wachowski".to_string(),
            duration: 136,
            poster: "https://img.example.com/poster.jpg".to_string(),
            genre,
            rate: 8.7,
        },
    )
}

fn seeded_app() -> Router {
    let store = MovieStore::from_records(vec![
        movie("m-1", "The Matrix", vec![Genre::Action]),
        movie("m-2", "Amelie", vec![Genre::Comedy, Genre::Drama]),
        movie("m-3", "Se7en", vec![Genre::Crime, Genre::Drama]),
    ])
    .unwrap();
    cinema_api::app(AppState::new(store, OriginPolicy::default()))
}

fn request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn request_from(method: Method, uri: &str, origin: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(ORIGIN, origin)
        .body(Body::empty())
        .unwrap()
}

fn json_request(method: Method, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
}

async fn send(app: &Router, req: Request<Body>) -> Reply {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    Reply {
        status,
        headers,
        body,
    }
}

fn ids(body: &Value) -> Vec<String> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_str().unwrap().to_string())
        .collect()
}

fn example_payload() -> Value {
    json!({
        "title": "X",
        "year": 2020,
        "director": "D",
        "duration": 90,
        "poster": "http://a.com/p.jpg",
        "genre": ["Drama"]
    })
}

// ── GET / ───────────────────────────────────────────────────────

#[tokio::test]
async fn root_says_hello() {
    let app = seeded_app();
    let reply = send(&app, request(Method::GET, "/")).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, json!({ "message": "Hello World" }));
}

// ── GET /movies ─────────────────────────────────────────────────

#[tokio::test]
async fn list_returns_all_in_insertion_order() {
    let app = seeded_app();
    let reply = send(&app, request(Method::GET, "/movies")).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(ids(&reply.body), vec!["m-1", "m-2", "m-3"]);
}

#[tokio::test]
async fn list_includes_created_movies_last() {
    let app = seeded_app();
    let created = send(&app, json_request(Method::POST, "/movies", &example_payload())).await;
    assert_eq!(created.status, StatusCode::CREATED);

    let reply = send(&app, request(Method::GET, "/movies")).await;
    let listed = ids(&reply.body);
    assert_eq!(listed.len(), 4);
    assert_eq!(listed[3], created.body["id"].as_str().unwrap());
}

#[tokio::test]
async fn list_filters_by_genre_case_insensitively() {
    let app = seeded_app();

    let reply = send(&app, request(Method::GET, "/movies?genre=Drama")).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(ids(&reply.body), vec!["m-2", "m-3"]);

    let reply = send(&app, request(Method::GET, "/movies?genre=dRaMa")).await;
    assert_eq!(ids(&reply.body), vec!["m-2", "m-3"]);

    let reply = send(&app, request(Method::GET, "/movies?genre=action")).await;
    assert_eq!(ids(&reply.body), vec!["m-1"]);
}

#[tokio::test]
async fn list_filter_without_matches_is_empty() {
    let app = seeded_app();
    let reply = send(&app, request(Method::GET, "/movies?genre=Western")).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, json!([]));

    let reply = send(&app, request(Method::GET, "/movies?genre=Dram")).await;
    assert_eq!(reply.body, json!([]));
}

#[tokio::test]
async fn list_with_empty_genre_returns_everything() {
    let app = seeded_app();
    let reply = send(&app, request(Method::GET, "/movies?genre=")).await;
    assert_eq!(ids(&reply.body).len(), 3);
}

#[tokio::test]
async fn list_with_repeated_genre_uses_first_value() {
    let app = seeded_app();
    let reply = send(
        &app,
        request_from(Method::GET, "/movies?genre=Drama&genre=Action", ALLOWED),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(ids(&reply.body), vec!["m-2", "m-3"]);
    assert_eq!(reply.headers[ACCESS_CONTROL_ALLOW_ORIGIN], ALLOWED);
}

#[tokio::test]
async fn list_grants_only_allow_listed_origins() {
    let app = seeded_app();

    let reply = send(&app, request_from(Method::GET, "/movies", ALLOWED)).await;
    assert_eq!(reply.headers[ACCESS_CONTROL_ALLOW_ORIGIN], ALLOWED);

    let reply = send(&app, request_from(Method::GET, "/movies", FOREIGN)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(!reply.headers.contains_key(ACCESS_CONTROL_ALLOW_ORIGIN));

    let reply = send(&app, request(Method::GET, "/movies")).await;
    assert!(!reply.headers.contains_key(ACCESS_CONTROL_ALLOW_ORIGIN));
}

// ── GET /movies/{id} ────────────────────────────────────────────

#[tokio::test]
async fn get_returns_movie() {
    let app = seeded_app();
    let reply = send(&app, request(Method::GET, "/movies/m-2")).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["title"], "Amelie");
    assert_eq!(reply.body["genre"], json!(["Comedy", "Drama"]));
    assert_eq!(reply.body["rate"].as_f64(), Some(8.7));
}

#[tokio::test]
async fn get_missing_movie_is_not_found() {
    let app = seeded_app();
    let reply = send(&app, request(Method::GET, "/movies/does-not-exist")).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.body, json!({ "message": "Movie not found" }));
}

// ── POST /movies ────────────────────────────────────────────────

#[tokio::test]
async fn create_defaults_rate_and_assigns_id() {
    let app = seeded_app();
    let reply = send(&app, json_request(Method::POST, "/movies", &example_payload())).await;
    assert_eq!(reply.status, StatusCode::CREATED);

    let body = &reply.body;
    assert_eq!(body["title"], "X");
    assert_eq!(body["year"], 2020);
    assert_eq!(body["director"], "D");
    assert_eq!(body["duration"], 90);
    assert_eq!(body["poster"], "http://a.com/p.jpg");
    assert_eq!(body["genre"], json!(["Drama"]));
    assert_eq!(body["rate"].as_f64(), Some(5.0));

    let id = body["id"].as_str().unwrap();
    assert!(!id.is_empty());
    assert!(!["m-1", "m-2", "m-3"].contains(&id));

    let fetched = send(&app, request(Method::GET, &format!("/movies/{id}"))).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(&fetched.body, body);
}

#[tokio::test]
async fn create_ignores_client_id() {
    let app = seeded_app();
    let mut payload = example_payload();
    payload["id"] = json!("m-1");

    let reply = send(&app, json_request(Method::POST, "/movies", &payload)).await;
    assert_eq!(reply.status, StatusCode::CREATED);
    assert_ne!(reply.body["id"], "m-1");
}

#[tokio::test]
async fn created_ids_are_unique() {
    let app = seeded_app();
    let mut seen: HashSet<String> = ["m-1", "m-2", "m-3"].iter().map(|s| s.to_string()).collect();

    for _ in 0..20 {
        let reply = send(&app, json_request(Method::POST, "/movies", &example_payload())).await;
        let id = reply.body["id"].as_str().unwrap().to_string();
        assert!(seen.insert(id));
    }
}

#[tokio::test]
async fn create_missing_field_is_bad_request() {
    let app = seeded_app();
    for field in ["title", "year", "director", "duration", "poster", "genre"] {
        let mut payload = example_payload();
        payload.as_object_mut().unwrap().remove(field);

        let reply = send(&app, json_request(Method::POST, "/movies", &payload)).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST, "missing {field}");
        let errors = reply.body["error"].as_array().unwrap();
        assert!(
            errors.iter().any(|e| e["path"][0] == field),
            "no error for {field}: {errors:?}"
        );
    }

    let reply = send(&app, request(Method::GET, "/movies")).await;
    assert_eq!(ids(&reply.body).len(), 3);
}

#[tokio::test]
async fn create_constraint_violations_name_the_field() {
    let app = seeded_app();
    let cases = [
        ("year", json!(1850)),
        ("year", json!(2030)),
        ("duration", json!(0)),
        ("rate", json!(11)),
        ("poster", json!("not-a-url")),
        ("genre", json!(["Western"])),
        ("title", json!(42)),
    ];
    for (field, value) in cases {
        let mut payload = example_payload();
        payload[field] = value;

        let reply = send(&app, json_request(Method::POST, "/movies", &payload)).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST, "{field}");
        let errors = reply.body["error"].as_array().unwrap();
        assert!(errors.iter().any(|e| e["path"][0] == field), "{field}: {errors:?}");
        assert!(errors.iter().all(|e| e["message"].is_string()));
    }
}

#[tokio::test]
async fn create_malformed_json_is_bad_request() {
    let app = seeded_app();
    let req = Request::builder()
        .method(Method::POST)
        .uri("/movies")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let reply = send(&app, req).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(reply.body["error"].is_string());
}

#[tokio::test]
async fn create_without_body_lists_missing_fields() {
    let app = seeded_app();
    let reply = send(&app, request(Method::POST, "/movies")).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let errors = reply.body["error"].as_array().unwrap();
    let fields: Vec<&str> = errors.iter().filter_map(|e| e["path"][0].as_str()).collect();
    assert_eq!(
        fields,
        vec!["title", "year", "director", "duration", "poster", "genre"]
    );
}

#[tokio::test]
async fn create_duration_beyond_integer_range_is_bad_request() {
    let app = seeded_app();
    let mut payload = example_payload();
    payload["duration"] = json!(u64::MAX);

    let reply = send(&app, json_request(Method::POST, "/movies", &payload)).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["error"][0]["path"], json!(["duration"]));
    assert_eq!(reply.body["error"][0]["code"], "too_big");

    let list = send(&app, request(Method::GET, "/movies")).await;
    assert_eq!(ids(&list.body).len(), 3);
}

// ── PATCH /movies/{id} ──────────────────────────────────────────

#[tokio::test]
async fn patch_with_empty_body_changes_nothing() {
    let app = seeded_app();
    let before = send(&app, request(Method::GET, "/movies/m-3")).await;

    let reply = send(&app, json_request(Method::PATCH, "/movies/m-3", &json!({}))).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, before.body);
}

#[tokio::test]
async fn patch_without_body_changes_nothing() {
    let app = seeded_app();
    let before = send(&app, request(Method::GET, "/movies/m-1")).await;

    let reply = send(&app, request(Method::PATCH, "/movies/m-1")).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, before.body);
}

#[tokio::test]
async fn patch_ignores_body_not_sent_as_json() {
    let app = seeded_app();
    let before = send(&app, request(Method::GET, "/movies/m-2")).await;

    let req = Request::builder()
        .method(Method::PATCH)
        .uri("/movies/m-2")
        .header(CONTENT_TYPE, "text/plain")
        .body(Body::from(r#"{"year": 1999}"#))
        .unwrap();
    let reply = send(&app, req).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, before.body);
}

#[tokio::test]
async fn patch_year_changes_only_year() {
    let app = seeded_app();
    let before = send(&app, request(Method::GET, "/movies/m-1")).await;

    let reply = send(&app, json_request(Method::PATCH, "/movies/m-1", &json!({ "year": 2003 }))).await;
    assert_eq!(reply.status, StatusCode::OK);

    let mut expected = before.body.clone();
    expected["year"] = json!(2003);
    assert_eq!(reply.body, expected);

    let after = send(&app, request(Method::GET, "/movies/m-1")).await;
    assert_eq!(after.body, expected);
}

#[tokio::test]
async fn patch_keeps_position_and_id() {
    let app = seeded_app();
    let reply = send(
        &app,
        json_request(Method::PATCH, "/movies/m-2", &json!({ "id": "hijack", "title": "Amélie" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["id"], "m-2");
    assert_eq!(reply.body["title"], "Amélie");

    let list = send(&app, request(Method::GET, "/movies")).await;
    assert_eq!(ids(&list.body), vec!["m-1", "m-2", "m-3"]);
}

#[tokio::test]
async fn patch_invalid_field_is_bad_request() {
    let app = seeded_app();
    let reply = send(&app, json_request(Method::PATCH, "/movies/m-1", &json!({ "rate": -1 }))).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["error"][0]["path"], json!(["rate"]));

    let unchanged = send(&app, request(Method::GET, "/movies/m-1")).await;
    assert_eq!(unchanged.body["rate"].as_f64(), Some(8.7));
}

#[tokio::test]
async fn patch_missing_movie_is_not_found() {
    let app = seeded_app();
    let reply = send(&app, json_request(Method::PATCH, "/movies/nope", &json!({ "year": 2000 }))).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.body, json!({ "message": "movie not found" }));
}

#[tokio::test]
async fn patch_validates_before_lookup() {
    let app = seeded_app();
    let reply = send(&app, json_request(Method::PATCH, "/movies/nope", &json!({ "year": 1 }))).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

// ── DELETE /movies/{id} ─────────────────────────────────────────

#[tokio::test]
async fn delete_then_get_is_not_found() {
    let app = seeded_app();
    let reply = send(&app, request(Method::DELETE, "/movies/m-2")).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, json!({ "message": "Movie deleted" }));

    let reply = send(&app, request(Method::GET, "/movies/m-2")).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);

    let list = send(&app, request(Method::GET, "/movies")).await;
    assert_eq!(ids(&list.body), vec!["m-1", "m-3"]);
}

#[tokio::test]
async fn delete_missing_movie_is_not_found() {
    let app = seeded_app();
    let reply = send(&app, request(Method::DELETE, "/movies/nope")).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.body, json!({ "message": "Movie not found" }));
}

#[tokio::test]
async fn delete_grants_allow_listed_or_absent_origin() {
    let app = seeded_app();

    let reply = send(&app, request(Method::DELETE, "/movies/m-1")).await;
    assert_eq!(reply.headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");

    let reply = send(&app, request_from(Method::DELETE, "/movies/m-2", ALLOWED)).await;
    assert_eq!(reply.headers[ACCESS_CONTROL_ALLOW_ORIGIN], ALLOWED);

    let reply = send(&app, request_from(Method::DELETE, "/movies/m-3", FOREIGN)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(!reply.headers.contains_key(ACCESS_CONTROL_ALLOW_ORIGIN));
}

#[tokio::test]
async fn not_found_responses_keep_cors_headers() {
    let app = seeded_app();
    let reply = send(&app, request_from(Method::DELETE, "/movies/nope", ALLOWED)).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.headers[ACCESS_CONTROL_ALLOW_ORIGIN], ALLOWED);
}

// ── OPTIONS /movies/{id} ────────────────────────────────────────

#[tokio::test]
async fn preflight_from_allowed_origin() {
    let app = seeded_app();
    let reply = send(&app, request_from(Method::OPTIONS, "/movies/m-1", ALLOWED)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.headers[ACCESS_CONTROL_ALLOW_ORIGIN], ALLOWED);
    assert_eq!(reply.headers[ACCESS_CONTROL_ALLOW_METHODS], "GET, DELETE, PATCH");
    assert_eq!(reply.body, json!("OK"));
}

#[tokio::test]
async fn preflight_without_origin() {
    let app = seeded_app();
    let reply = send(&app, request(Method::OPTIONS, "/movies/anything")).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(reply.headers[ACCESS_CONTROL_ALLOW_METHODS], "GET, DELETE, PATCH");
}

#[tokio::test]
async fn preflight_from_foreign_origin_is_still_ok() {
    let app = seeded_app();
    let reply = send(&app, request_from(Method::OPTIONS, "/movies/m-1", FOREIGN)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(!reply.headers.contains_key(ACCESS_CONTROL_ALLOW_ORIGIN));
    assert!(!reply.headers.contains_key(ACCESS_CONTROL_ALLOW_METHODS));
}

// ── bootstrap ───────────────────────────────────────────────────

#[tokio::test]
async fn bootstrap_store_serves_dramas() {
    let store = MovieStore::bootstrap().unwrap();
    let total = store.len();
    let app = cinema_api::app(AppState::new(store, OriginPolicy::default()));

    let all = send(&app, request(Method::GET, "/movies")).await;
    assert_eq!(ids(&all.body).len(), total);

    let dramas = send(&app, request(Method::GET, "/movies?genre=drama")).await;
    let dramas = dramas.body.as_array().unwrap().clone();
    assert!(!dramas.is_empty());
    for movie in dramas {
        let genres = movie["genre"].as_array().unwrap();
        assert!(genres.iter().any(|g| g.as_str().unwrap().eq_ignore_ascii_case("drama")));
    }
}
