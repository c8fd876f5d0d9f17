//! Movie catalog API handlers
//!
//! Browse/search plus the admin create, update and delete operations.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use reel_common::events::{CatalogEvent, MovieChange};
use serde::{Deserialize, Serialize};

use crate::db::movies::{self, Movie, MovieUpdate, NewMovie};
use crate::error::{ApiError, ApiResult};
use crate::pagination::{calculate_pagination, Pagination, PAGE_SIZE};
use crate::services::tmdb_client::{poster_url_from_path, CatalogSource};
use crate::AppState;

/// GET /api/movies query parameters
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub page: Option<i64>,
}

/// GET /api/movies response
#[derive(Debug, Serialize)]
pub struct MovieListResponse {
    pub movies: Vec<Movie>,
    pub total: i64,
    #[serde(flatten)]
    pub pagination: Pagination,
    pub query: String,
}

/// POST /api/movies request
#[derive(Debug, Default, Deserialize)]
pub struct CreateMovieRequest {
    pub title: String,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub box_office: Option<String>,
    #[serde(default)]
    pub director: Option<String>,
    #[serde(default)]
    pub producer: Option<String>,
    #[serde(default)]
    pub cast: Option<String>,
    #[serde(default)]
    pub poster_url: Option<String>,
    #[serde(default)]
    pub external_id: Option<String>,
}

/// PUT /api/movies/:id request
///
/// There is no `external_id` here; it cannot be edited.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateMovieRequest {
    pub title: String,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub box_office: Option<String>,
    #[serde(default)]
    pub director: Option<String>,
    #[serde(default)]
    pub producer: Option<String>,
    #[serde(default)]
    pub cast: Option<String>,
    #[serde(default)]
    pub poster_url: Option<String>,
}

fn require_title(title: &str) -> ApiResult<()> {
    if title.trim().is_empty() {
        return Err(ApiError::BadRequest("title is required".to_string()));
    }
    Ok(())
}

fn announce(state: &AppState, movie_id: i64, change: MovieChange) {
    state.event_bus.emit_lossy(CatalogEvent::MovieChanged {
        movie_id,
        change,
        timestamp: Utc::now(),
    });
}

/// GET /api/movies?q=&page=
pub async fn list_movies(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> ApiResult<Json<MovieListResponse>> {
    let query = params.q.unwrap_or_default().trim().to_string();

    let total = movies::count_movies(&state.db, &query).await?;
    let pagination = calculate_pagination(total, params.page.unwrap_or(1));
    let movies = movies::search_movies(&state.db, &query, PAGE_SIZE, pagination.offset).await?;

    Ok(Json(MovieListResponse {
        movies,
        total,
        pagination,
        query,
    }))
}

/// GET /api/movies/:id
pub async fn get_movie(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Movie>> {
    movies::load_movie(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Movie not found: {}", id)))
}

/// Best-effort TMDB poster for a movie created with an external id
async fn lookup_poster(state: &AppState, external_id: &str) -> Option<String> {
    let client = match crate::config::build_tmdb_client(&state.db, &state.settings).await {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!(error = %e, "TMDB client unavailable, skipping poster lookup");
            return None;
        }
    };

    if !client.is_configured() {
        return None;
    }

    match client.fetch_poster_path(external_id).await {
        Ok(Some(path)) => Some(poster_url_from_path(Some(&path))),
        Ok(None) => None,
        Err(e) => {
            tracing::warn!(external_id, error = %e, "Poster lookup failed, using default poster");
            None
        }
    }
}

/// POST /api/movies
///
/// Returns 201 with the stored movie, 409 when the external id is taken.
pub async fn create_movie(
    State(state): State<AppState>,
    Json(request): Json<CreateMovieRequest>,
) -> ApiResult<(StatusCode, Json<Movie>)> {
    require_title(&request.title)?;

    let external_id = movies::non_empty(request.external_id);
    let mut poster_url = movies::non_empty(request.poster_url);

    if let Some(external_id) = &external_id {
        if movies::find_by_external_id(&state.db, external_id).await?.is_some() {
            return Err(ApiError::Conflict(format!(
                "Movie with external id {} already exists",
                external_id
            )));
        }
        if poster_url.is_none() {
            poster_url = lookup_poster(&state, external_id).await;
        }
    }

    let new_movie = NewMovie {
        title: request.title,
        year: request.year,
        box_office: request.box_office,
        director: request.director,
        producer: request.producer,
        cast: request.cast,
        poster_url,
        external_id: external_id.clone(),
    };

    // The index still decides if an import committed the same id meanwhile
    let id = movies::insert_movie(&state.db, &new_movie)
        .await?
        .ok_or_else(|| {
            ApiError::Conflict(format!(
                "Movie with external id {} already exists",
                external_id.as_deref().unwrap_or_default()
            ))
        })?;

    let movie = movies::load_movie(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::Internal(format!("Movie {} vanished after insert", id)))?;

    tracing::info!(movie_id = id, title = %movie.title, "Movie created");
    announce(&state, id, MovieChange::Created);

    Ok((StatusCode::CREATED, Json(movie)))
}

/// PUT /api/movies/:id
pub async fn update_movie(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateMovieRequest>,
) -> ApiResult<Json<Movie>> {
    require_title(&request.title)?;

    let update = MovieUpdate {
        title: request.title,
        year: request.year,
        box_office: request.box_office,
        director: request.director,
        producer: request.producer,
        cast: request.cast,
        poster_url: request.poster_url,
    };

    if !movies::update_movie(&state.db, id, &update).await? {
        return Err(ApiError::NotFound(format!("Movie not found: {}", id)));
    }

    let movie = movies::load_movie(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Movie not found: {}", id)))?;

    tracing::info!(movie_id = id, "Movie updated");
    announce(&state, id, MovieChange::Updated);

    Ok(Json(movie))
}

/// DELETE /api/movies/:id
pub async fn delete_movie(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if !movies::delete_movie(&state.db, id).await? {
        return Err(ApiError::NotFound(format!("Movie not found: {}", id)));
    }

    tracing::info!(movie_id = id, "Movie deleted");
    announce(&state, id, MovieChange::Deleted);

    Ok(StatusCode::NO_CONTENT)
}

/// Build movie routes
pub fn movie_routes() -> Router<AppState> {
    Router::new()
        .route("/api/movies", get(list_movies).post(create_movie))
        .route(
            "/api/movies/:id",
            get(get_movie).put(update_movie).delete(delete_movie),
        )
}
