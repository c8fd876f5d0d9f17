//! TMDB client tests against a local fake TMDB server

mod helpers;

use axum::{
    extract::{Path, Query},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use helpers::{test_pool, wait_until};
use reel_catalog::config::{ServiceSettings, TMDB_API_KEY_ENV_VARS};
use reel_catalog::db::movies;
use reel_catalog::services::tmdb_client::{CatalogSource, TmdbClient, TmdbConfig, TmdbError};
use reel_catalog::{build_router, AppState};
use reel_common::config::{ImportDefaults, TomlConfig};
use reel_common::events::EventBus;
use serde_json::{json, Value};
use serial_test::serial;
use std::collections::HashMap;
use std::time::Duration;
use tower::util::ServiceExt;

const TEST_KEY: &str = "test-key";

async fn discover(Query(query): Query<HashMap<String, String>>) -> Response {
    if query.get("api_key").map(String::as_str) != Some(TEST_KEY) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"status_message": "Invalid API key"})),
        )
            .into_response();
    }
    if query.get("sort_by").map(String::as_str) != Some("revenue.desc") {
        return StatusCode::BAD_REQUEST.into_response();
    }

    let page: u32 = query.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let results: Vec<Value> = if page == 1 {
        vec![
            json!({"id": 19995, "title": "Avatar", "release_date": "2009-12-15", "poster_path": "/avatar.jpg"}),
            json!({"id": 299534, "title": "Avengers: Endgame", "release_date": "2019-04-24", "poster_path": null}),
            json!({"id": 597, "title": "Titanic", "release_date": "1997-11-18", "poster_path": "/titanic.jpg"}),
        ]
    } else {
        Vec::new()
    };

    Json(json!({"page": page, "results": results, "total_pages": 1})).into_response()
}

async fn credits(Path(id): Path<i64>) -> Json<Value> {
    Json(json!({
        "id": id,
        "cast": [
            {"name": format!("Star {}", id), "character": "Lead"},
            {"name": "Support", "character": "Friend"}
        ],
        "crew": [
            {"name": "First Director", "job": "Director"},
            {"name": format!("Producer {}", id), "job": "Producer"},
            {"name": format!("Director {}", id), "job": "Director"}
        ]
    }))
}

async fn details(Path(id): Path<i64>) -> Json<Value> {
    Json(json!({"id": id, "poster_path": format!("/details{}.jpg", id)}))
}

fn fake_tmdb() -> Router {
    Router::new()
        .route("/discover/movie", get(discover))
        .route("/movie/:id/credits", get(credits))
        .route("/movie/:id", get(details))
}

/// Serve `router` on an ephemeral local port and return its base URL
async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn client(base_url: String, api_key: &str) -> TmdbClient {
    TmdbClient::new(TmdbConfig {
        api_key: Some(api_key.to_string()),
        base_url,
        ..Default::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_discover_page_parses_results() {
    let base_url = spawn_server(fake_tmdb()).await;
    let client = client(base_url, TEST_KEY);

    let results = client.discover_page(1).await.unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].external_id(), "19995");
    assert_eq!(results[0].poster_path.as_deref(), Some("/avatar.jpg"));
    assert!(results[1].poster_path.is_none());

    assert!(client.discover_page(2).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_non_success_status_is_reported() {
    let base_url = spawn_server(fake_tmdb()).await;
    let client = client(base_url, "wrong-key");

    let err = client.discover_page(1).await.unwrap_err();
    assert!(matches!(err, TmdbError::Status(401)));
    assert_eq!(err.to_string(), "status 401");
}

#[tokio::test]
async fn test_malformed_body_is_parse_error() {
    let router = Router::new().route("/discover/movie", get(|| async { "not json" }));
    let base_url = spawn_server(router).await;

    let err = client(base_url, TEST_KEY).discover_page(1).await.unwrap_err();
    assert!(matches!(err, TmdbError::Parse(_)));
}

#[tokio::test]
async fn test_credits_and_poster_lookup() {
    let base_url = spawn_server(fake_tmdb()).await;
    let client = client(base_url, TEST_KEY);

    let credits = client.fetch_credits("597").await.unwrap();
    assert_eq!(credits.cast.len(), 2);
    assert_eq!(credits.crew.len(), 3);

    let poster = client.fetch_poster_path("597").await.unwrap();
    assert_eq!(poster.as_deref(), Some("/details597.jpg"));
}

#[tokio::test]
async fn test_hanging_server_times_out() {
    let router = Router::new().route(
        "/movie/:id/credits",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({"cast": [], "crew": []}))
        }),
    );
    let base_url = spawn_server(router).await;

    let client = TmdbClient::new(TmdbConfig {
        api_key: Some(TEST_KEY.to_string()),
        base_url,
        credits_timeout: Duration::from_millis(200),
        ..Default::default()
    })
    .unwrap();

    let err = client.fetch_credits("1").await.unwrap_err();
    assert!(matches!(err, TmdbError::Timeout));
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    // Bind then drop to get a port nobody listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(format!("http://{}", addr), TEST_KEY)
        .discover_page(1)
        .await
        .unwrap_err();
    assert!(matches!(err, TmdbError::Network(_)));
}

fn settings_for(base_url: String) -> ServiceSettings {
    ServiceSettings::new(TomlConfig {
        tmdb_api_key: Some(TEST_KEY.to_string()),
        tmdb_base_url: Some(base_url),
        import: ImportDefaults {
            page_delay_ms: 0,
            max_pages: 500,
        },
        ..Default::default()
    })
}

#[tokio::test]
#[serial]
async fn test_service_import_end_to_end() {
    for name in TMDB_API_KEY_ENV_VARS {
        std::env::remove_var(name);
    }
    let base_url = spawn_server(fake_tmdb()).await;
    let pool = test_pool().await;

    let state = AppState::new(pool.clone(), EventBus::new(100), settings_for(base_url));
    let supervisor = state.supervisor.clone();
    let app = build_router(state);

    let request = Request::builder()
        .method("POST")
        .uri("/import/start")
        .header("content-type", "application/json")
        .body(axum::body::Body::from(r#"{"limit": 10}"#))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    wait_until(|| !supervisor.is_running()).await;
    let status = supervisor.status();
    assert!(status.succeeded(), "import failed: {:?}", status.last_error);
    assert_eq!(status.inserted, 3);

    let avatar = movies::find_by_external_id(&pool, "19995").await.unwrap().unwrap();
    assert_eq!(avatar.title, "Avatar");
    assert_eq!(avatar.year.as_deref(), Some("2009"));
    assert_eq!(avatar.director.as_deref(), Some("Director 19995"));
    assert_eq!(avatar.producer.as_deref(), Some("Producer 19995"));
    assert_eq!(avatar.cast.as_deref(), Some("Star 19995, Support"));
    assert_eq!(avatar.poster_url, "https://image.tmdb.org/t/p/w500/avatar.jpg");

    let endgame = movies::find_by_external_id(&pool, "299534").await.unwrap().unwrap();
    assert_eq!(endgame.poster_url, movies::DEFAULT_POSTER_URL);
}

#[tokio::test]
#[serial]
async fn test_admin_create_looks_up_poster() {
    for name in TMDB_API_KEY_ENV_VARS {
        std::env::remove_var(name);
    }
    let base_url = spawn_server(fake_tmdb()).await;
    let pool = test_pool().await;
    let app = build_router(AppState::new(pool, EventBus::new(100), settings_for(base_url)));

    let request = Request::builder()
        .method("POST")
        .uri("/api/movies")
        .header("content-type", "application/json")
        .body(axum::body::Body::from(r#"{"title": "Titanic", "external_id": "597"}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let bytes = http_body_util::BodyExt::collect(response.into_body())
        .await
        .unwrap()
        .to_bytes();
    let movie: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(
        movie["poster_url"],
        "https://image.tmdb.org/t/p/w500/details597.jpg"
    );
}
