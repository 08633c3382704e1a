use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::{AdminUser, AppPath, AppQuery},
    models::movie::{Movie, MovieFilter},
    services::schedule,
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/movies", get(list_movies))
        .route("/movies/filter", get(filter_movies))
        .route("/movies/popular", get(popular_movies))
        .route("/movies/now-showing", get(now_showing))
        .route("/movies/coming-soon", get(coming_soon))
        .route("/movies/featured", get(featured))
        .route("/movies/fetch", post(fetch_from_tmdb))
        .route("/movies/{id}", get(get_movie))
        .route("/movies/{id}/showtimes", get(movie_showtimes))
}

fn movie_list(movies: Vec<Movie>) -> Json<serde_json::Value> {
    Json(json!({ "success": true, "count": movies.len(), "movies": movies }))
}

// GET /api/movies
async fn list_movies(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    movie_list(state.catalog.all().await)
}

// GET /api/movies/filter?isNowShowing=&isComingSoon=&isFeatured=
async fn filter_movies(
    State(state): State<Arc<AppState>>,
    AppQuery(filter): AppQuery<MovieFilter>,
) -> impl IntoResponse {
    movie_list(state.catalog.filter(filter).await)
}

async fn popular_movies(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    movie_list(state.catalog.popular().await)
}

async fn now_showing(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    movie_list(state.catalog.filter(MovieFilter { is_now_showing: Some(true), ..Default::default() }).await)
}

async fn coming_soon(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    movie_list(state.catalog.filter(MovieFilter { is_coming_soon: Some(true), ..Default::default() }).await)
}

async fn featured(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    movie_list(state.catalog.filter(MovieFilter { is_featured: Some(true), ..Default::default() }).await)
}

// GET /api/movies/{id}
async fn get_movie(State(state): State<Arc<AppState>>, AppPath(id): AppPath<String>) -> AppResult<impl IntoResponse> {
    let movie = state
        .catalog
        .get(&id)
        .await
        .ok_or_else(|| AppError::not_found("Movie not found"))?;
    Ok(Json(json!({ "success": true, "movie": movie })))
}

#[derive(Debug, Deserialize)]
struct FetchParams {
    append: Option<String>,
}

// POST /api/movies/fetch?append=true
async fn fetch_from_tmdb(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    AppQuery(params): AppQuery<FetchParams>,
) -> AppResult<impl IntoResponse> {
    let append = matches!(params.append.as_deref(), Some("true" | "1"));
    tracing::info!("Admin {} started a TMDB import", admin.id);
    let summary = state.tmdb.import(&state.catalog, append).await?;
    Ok(Json(json!({
        "success": true,
        "message": format!("Fetched {} movies from TMDB", summary.success),
        "results": summary,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShowtimeParams {
    room_id: Option<String>,
    date: Option<String>,
}

// GET /api/movies/{id}/showtimes?roomId=&date=
async fn movie_showtimes(
    State(state): State<Arc<AppState>>,
    AppPath(movie_id): AppPath<String>,
    AppQuery(params): AppQuery<ShowtimeParams>,
) -> AppResult<impl IntoResponse> {
    let room_id = params
        .room_id
        .filter(|r| !r.is_empty())
        .ok_or_else(|| AppError::validation("Room ID is required"))?;
    let date = match params.date.as_deref().filter(|d| !d.is_empty()) {
        Some(d) => NaiveDate::parse_from_str(d, "%Y-%m-%d")
            .map_err(|_| AppError::validation("Invalid date, expected YYYY-MM-DD"))?,
        None => Utc::now().date_naive(),
    };
    let showtimes = schedule::showtimes(&state.db.pool, &movie_id, &room_id, date).await?;
    Ok(Json(json!({ "success": true, "showtimes": showtimes })))
}
