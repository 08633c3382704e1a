//! TMDB import.
//!
//! Pulls the four public movie lists, de-duplicates them, enriches each new
//! title with its details and credits and writes the result into the
//! catalog. Every HTTP call passes through a consecutive-failures circuit
//! breaker so an unreachable TMDB is given up on quickly.

use chrono::{Months, NaiveDate, Utc};
use failsafe::{
    backoff::{self, Constant},
    failure_policy::{self, ConsecutiveFailures},
    futures::CircuitBreaker as _,
    StateMachine,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::{
    config::TmdbConfig,
    error::AppError,
    models::movie::Movie,
    services::catalog::MovieCatalog,
};

pub const MOVIE_LISTS: [&str; 4] = ["popular", "now_playing", "upcoming", "top_rated"];

const POSTER_SIZE: &str = "w500";
const BACKDROP_SIZE: &str = "w1280";
const DEFAULT_DURATION: u32 = 120;
const CAST_LIMIT: usize = 4;

type Breaker = StateMachine<ConsecutiveFailures<Constant>, ()>;

#[derive(Debug, thiserror::Error)]
pub enum TmdbError {
    #[error("TMDB request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("TMDB is temporarily unavailable")]
    Unavailable,
}

impl From<TmdbError> for AppError {
    fn from(e: TmdbError) -> Self {
        AppError::Upstream(e.to_string())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Genre {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Person {
    pub name: String,
    pub job: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Credits {
    pub cast: Vec<Person>,
    pub crew: Vec<Person>,
}

/// A movie as TMDB returns it, from either a list page or the details endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TmdbMovie {
    pub id: i64,
    pub title: Option<String>,
    pub name: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<String>,
    pub first_air_date: Option<String>,
    pub vote_average: Option<f64>,
    pub popularity: Option<f64>,
    pub runtime: Option<u32>,
    pub genres: Option<Vec<Genre>>,
    pub genre_ids: Option<Vec<i64>>,
    pub imdb_id: Option<String>,
    pub credits: Option<Credits>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Image {
    pub file_path: Option<String>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Images {
    pub posters: Vec<Image>,
    pub backdrops: Vec<Image>,
}

#[derive(Debug, Default, Deserialize)]
struct Page {
    #[serde(default)]
    results: Vec<TmdbMovie>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub success: usize,
    pub failed: usize,
    pub movies: usize,
}

fn non_empty(s: &Option<String>) -> Option<&str> {
    s.as_deref().filter(|s| !s.trim().is_empty())
}

/// File path of the best-voted image: highest `vote_average`, then highest
/// `vote_count`. Earlier entries win ties.
pub fn best_image(images: &[Image]) -> Option<&str> {
    let score = |i: &Image| (i.vote_average.unwrap_or(0.0), i.vote_count.unwrap_or(0));
    let mut best: Option<&Image> = None;
    for image in images {
        let better = best.map_or(true, |current| {
            let ((va, vc), (ba, bc)) = (score(image), score(current));
            va > ba || (va == ba && vc > bc)
        });
        if better {
            best = Some(image);
        }
    }
    best.and_then(|i| non_empty(&i.file_path))
}

/// Maps a TMDB record onto a catalog movie, classifying it against `today`.
pub fn convert(tmdb: &TmdbMovie, image_base_url: &str, today: NaiveDate) -> Movie {
    let release = non_empty(&tmdb.release_date).or_else(|| non_empty(&tmdb.first_air_date));
    let released_on = release.and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());
    let six_months_ago = today.checked_sub_months(Months::new(6)).unwrap_or(NaiveDate::MIN);

    let vote = tmdb.vote_average.unwrap_or(0.0);
    let popularity = tmdb.popularity.unwrap_or(0.0);
    let runtime = tmdb.runtime.filter(|r| *r > 0);

    let genre = match (&tmdb.genres, &tmdb.genre_ids) {
        (Some(genres), _) => genres.iter().map(|g| g.name.clone()).collect(),
        (None, Some(_)) => Vec::new(),
        (None, None) => vec!["Drama".to_string()],
    };

    let credits = tmdb.credits.as_ref();
    let director = credits
        .and_then(|c| c.crew.iter().find(|p| p.job.as_deref() == Some("Director")))
        .map(|p| p.name.clone())
        .unwrap_or_else(|| "Unknown".to_string());
    let mut cast: Vec<String> = credits
        .map(|c| c.cast.iter().take(CAST_LIMIT).map(|p| p.name.clone()).collect())
        .unwrap_or_default();
    if cast.is_empty() {
        cast.push("Unknown".to_string());
    }

    Movie {
        id: tmdb.id.to_string(),
        title: non_empty(&tmdb.title)
            .or_else(|| non_empty(&tmdb.name))
            .unwrap_or("Untitled")
            .to_string(),
        poster: non_empty(&tmdb.poster_path).map(|p| format!("{image_base_url}/{POSTER_SIZE}{p}")),
        backdrop: non_empty(&tmdb.backdrop_path).map(|p| format!("{image_base_url}/{BACKDROP_SIZE}{p}")),
        synopsis: non_empty(&tmdb.overview)
            .unwrap_or("No synopsis available.")
            .to_string(),
        duration: runtime.unwrap_or(DEFAULT_DURATION),
        rating: (vote * 10.0).round() / 10.0,
        genre,
        release_date: release
            .map(str::to_string)
            .unwrap_or_else(|| today.format("%Y-%m-%d").to_string()),
        director,
        cast,
        trailer_url: None,
        imdb_id: non_empty(&tmdb.imdb_id).map(str::to_string),
        year: release.and_then(|d| d.split('-').next()).map(str::to_string),
        runtime: runtime.map(|r| format!("{r} min")),
        is_now_showing: released_on.is_some_and(|d| d <= today && d >= six_months_ago),
        is_coming_soon: released_on.is_some_and(|d| d > today),
        is_featured: vote >= 7.5 || popularity > 50.0,
    }
}

pub struct TmdbClient {
    http: reqwest::Client,
    config: TmdbConfig,
    breaker: Breaker,
}

impl TmdbClient {
    pub fn new(config: &TmdbConfig) -> Result<Self, TmdbError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()?;
        let policy = failure_policy::consecutive_failures(
            config.failure_threshold,
            backoff::constant(config.retry_after),
        );
        let breaker = failsafe::Config::new().failure_policy(policy).build();
        Ok(Self { http, config: config.clone(), breaker })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T, TmdbError> {
        let mut request = self
            .http
            .get(format!("{}{}", self.config.base_url, path))
            .header(reqwest::header::ACCEPT, "application/json")
            .query(query);
        if !self.config.access_token.is_empty() {
            request = request.bearer_auth(&self.config.access_token);
        }

        let call = async move { request.send().await?.error_for_status()?.json::<T>().await };
        match self.breaker.call(call).await {
            Ok(body) => Ok(body),
            Err(failsafe::Error::Inner(e)) => Err(TmdbError::Http(e)),
            Err(failsafe::Error::Rejected) => {
                warn!("TMDB circuit breaker is open, skipping {}", path);
                Err(TmdbError::Unavailable)
            }
        }
    }

    pub async fn list(&self, list: &str) -> Result<Vec<TmdbMovie>, TmdbError> {
        let page: Page = self
            .get(&format!("/movie/{list}"), &[("page", "1"), ("language", "en-US")])
            .await?;
        Ok(page.results)
    }

    pub async fn details(&self, id: i64) -> Result<TmdbMovie, TmdbError> {
        self.get(&format!("/movie/{id}"), &[("append_to_response", "credits")]).await
    }

    pub async fn images(&self, id: i64) -> Result<Images, TmdbError> {
        self.get(&format!("/movie/{id}/images"), &[("include_image_language", "en,null")])
            .await
    }

    /// Details and images fetched together. The best-voted poster and
    /// backdrop replace the details' own paths; without images those stay.
    pub async fn details_with_images(&self, id: i64) -> Result<TmdbMovie, TmdbError> {
        let (details, images) = tokio::join!(self.details(id), self.images(id));
        let mut movie = details?;
        match images {
            Ok(images) => {
                if let Some(poster) = best_image(&images.posters) {
                    movie.poster_path = Some(poster.to_string());
                }
                if let Some(backdrop) = best_image(&images.backdrops) {
                    movie.backdrop_path = Some(backdrop.to_string());
                }
            }
            Err(e) => debug!("No images for TMDB movie {}, keeping detail paths: {}", id, e),
        }
        Ok(movie)
    }

    /// All four lists fetched concurrently, merged in list order without repeats.
    /// A list that fails contributes nothing.
    pub async fn discover(&self) -> Vec<TmdbMovie> {
        let pages = futures::future::join_all(MOVIE_LISTS.iter().map(|list| self.list(list))).await;
        let mut seen = HashSet::new();
        let mut movies = Vec::new();
        for (list, page) in MOVIE_LISTS.iter().zip(pages) {
            match page {
                Ok(results) => movies.extend(results.into_iter().filter(|m| seen.insert(m.id))),
                Err(e) => warn!("Failed to fetch TMDB {} list: {}", list, e),
            }
        }
        movies
    }

    /// Imports into `catalog`. With `append` only unknown ids are fetched and
    /// added; otherwise the catalog is replaced by the fresh import.
    pub async fn import(&self, catalog: &MovieCatalog, append: bool) -> Result<ImportSummary, AppError> {
        info!("Fetching movies from TMDB (append: {})", append);
        let discovered = self.discover().await;
        if discovered.is_empty() {
            return Err(AppError::Upstream("No movies could be fetched from TMDB".into()));
        }

        let existing = if append { catalog.ids().await } else { HashSet::new() };
        let pending: Vec<TmdbMovie> = discovered
            .into_iter()
            .filter(|m| !existing.contains(&m.id.to_string()))
            .collect();
        info!("{} new movies to import", pending.len());

        let today = Utc::now().date_naive();
        let mut summary = ImportSummary::default();
        let mut imported = Vec::with_capacity(pending.len());
        for (i, item) in pending.iter().enumerate() {
            let source = match self.details_with_images(item.id).await {
                Ok(details) => details,
                Err(e) => {
                    warn!("Details for TMDB movie {} unavailable, using list data: {}", item.id, e);
                    item.clone()
                }
            };
            if non_empty(&source.title).or_else(|| non_empty(&source.name)).is_none() {
                summary.failed += 1;
                continue;
            }
            let movie = convert(&source, &self.config.image_base_url, today);
            debug!("Imported {} ({})", movie.title, movie.id);
            imported.push(movie);
            summary.success += 1;

            if i + 1 < pending.len() && !self.config.request_delay.is_zero() {
                tokio::time::sleep(self.config.request_delay).await;
            }
        }

        summary.movies = if append {
            catalog.append_new(imported).await?
        } else {
            catalog.replace_all(imported).await?
        };
        info!(
            "TMDB import finished: {} imported, {} failed, {} in catalog",
            summary.success, summary.failed, summary.movies
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::{
        matchers::{method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    fn config(base_url: &str, failure_threshold: u32) -> TmdbConfig {
        TmdbConfig {
            base_url: base_url.to_string(),
            image_base_url: "https://img.test/t/p".to_string(),
            access_token: "token".to_string(),
            request_delay: Duration::ZERO,
            failure_threshold,
            retry_after: Duration::from_secs(60),
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn converts_details_with_credits() {
        let tmdb: TmdbMovie = serde_json::from_value(json!({
            "id": 550,
            "title": "Fight Club",
            "overview": "An insomniac office worker...",
            "poster_path": "/p.jpg",
            "backdrop_path": "/b.jpg",
            "release_date": "2024-04-01",
            "vote_average": 8.438,
            "popularity": 12.0,
            "runtime": 139,
            "imdb_id": "tt0137523",
            "genres": [{"id": 18, "name": "Drama"}],
            "credits": {
                "cast": [{"name": "A"}, {"name": "B"}, {"name": "C"}, {"name": "D"}, {"name": "E"}],
                "crew": [{"name": "Writer", "job": "Screenplay"}, {"name": "David Fincher", "job": "Director"}]
            }
        }))
        .unwrap();
        let movie = convert(&tmdb, "https://img.test/t/p", day(2024, 5, 1));
        assert_eq!(movie.id, "550");
        assert_eq!(movie.poster.as_deref(), Some("https://img.test/t/p/w500/p.jpg"));
        assert_eq!(movie.backdrop.as_deref(), Some("https://img.test/t/p/w1280/b.jpg"));
        assert_eq!(movie.rating, 8.4);
        assert_eq!(movie.duration, 139);
        assert_eq!(movie.runtime.as_deref(), Some("139 min"));
        assert_eq!(movie.year.as_deref(), Some("2024"));
        assert_eq!(movie.director, "David Fincher");
        assert_eq!(movie.cast, vec!["A", "B", "C", "D"]);
        assert_eq!(movie.genre, vec!["Drama"]);
        assert!(movie.is_now_showing && !movie.is_coming_soon && movie.is_featured);
    }

    #[test]
    fn list_entries_fall_back_to_defaults() {
        let tmdb: TmdbMovie = serde_json::from_value(json!({
            "id": 7, "title": "Soon", "release_date": "2024-06-01",
            "vote_average": 6.0, "popularity": 10.0, "genre_ids": [28]
        }))
        .unwrap();
        let movie = convert(&tmdb, "https://img.test/t/p", day(2024, 5, 1));
        assert_eq!(movie.duration, 120);
        assert_eq!(movie.director, "Unknown");
        assert_eq!(movie.cast, vec!["Unknown"]);
        assert!(movie.genre.is_empty());
        assert_eq!(movie.poster, None);
        assert_eq!(movie.synopsis, "No synopsis available.");
        assert!(movie.is_coming_soon && !movie.is_now_showing && !movie.is_featured);
    }

    #[test]
    fn old_releases_are_neither_showing_nor_upcoming() {
        let tmdb = TmdbMovie {
            id: 1,
            title: Some("Classic".into()),
            release_date: Some("1999-10-15".into()),
            popularity: Some(60.0),
            ..Default::default()
        };
        let movie = convert(&tmdb, "x", day(2024, 5, 1));
        assert!(!movie.is_now_showing && !movie.is_coming_soon);
        assert!(movie.is_featured);
        assert_eq!(movie.genre, vec!["Drama"]);
    }

    #[test]
    fn best_image_prefers_votes_then_count() {
        let img = |path: &str, avg: Option<f64>, count: Option<u64>| Image {
            file_path: Some(path.to_string()),
            vote_average: avg,
            vote_count: count,
        };
        let images = vec![
            img("/first.jpg", Some(5.2), Some(3)),
            img("/tied-more-votes.jpg", Some(5.6), Some(10)),
            img("/top-average.jpg", Some(5.6), Some(4)),
            img("/unrated.jpg", None, None),
        ];
        assert_eq!(best_image(&images), Some("/tied-more-votes.jpg"));
        let equal = vec![img("/a.jpg", Some(5.0), Some(1)), img("/b.jpg", Some(5.0), Some(1))];
        assert_eq!(best_image(&equal), Some("/a.jpg"));
        assert_eq!(best_image(&[]), None);
    }

    async fn mount_list(server: &MockServer, list: &str, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(format!("/movie/{list}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn import_merges_lists_and_details() {
        let server = MockServer::start().await;
        mount_list(&server, "popular", json!({"results": [{"id": 1, "title": "One"}, {"id": 2, "title": "Two"}]})).await;
        mount_list(&server, "now_playing", json!({"results": [{"id": 2, "title": "Two"}]})).await;
        mount_list(&server, "upcoming", json!({"results": [{"id": 3, "title": "Three"}]})).await;
        Mock::given(method("GET"))
            .and(path("/movie/top_rated"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/movie/1"))
            .and(query_param("append_to_response", "credits"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 1, "title": "One", "runtime": 101,
                "credits": {"cast": [], "crew": [{"name": "Dir", "job": "Director"}]}
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let catalog = MovieCatalog::load(dir.path().join("movies.json")).await.unwrap();
        let client = TmdbClient::new(&config(&server.uri(), 10)).unwrap();

        let summary = client.import(&catalog, false).await.unwrap();
        assert_eq!(summary, ImportSummary { success: 3, failed: 0, movies: 3 });
        let one = catalog.get("1").await.unwrap();
        assert_eq!(one.director, "Dir");
        assert_eq!(one.duration, 101);
        assert_eq!(catalog.get("3").await.unwrap().director, "Unknown");

        let again = client.import(&catalog, true).await.unwrap();
        assert_eq!(again.success, 0);
        assert_eq!(again.movies, 3);
    }

    #[tokio::test]
    async fn images_endpoint_overrides_detail_paths() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/movie/550"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 550, "title": "Fight Club",
                "poster_path": "/details-poster.jpg", "backdrop_path": "/details-backdrop.jpg"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/movie/550/images"))
            .and(query_param("include_image_language", "en,null"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "posters": [
                    {"file_path": "/low.jpg", "vote_average": 5.1, "vote_count": 40},
                    {"file_path": "/best.jpg", "vote_average": 5.8, "vote_count": 2}
                ],
                "backdrops": []
            })))
            .mount(&server)
            .await;
        let client = TmdbClient::new(&config(&server.uri(), 10)).unwrap();

        let movie = client.details_with_images(550).await.unwrap();
        assert_eq!(movie.poster_path.as_deref(), Some("/best.jpg"));
        assert_eq!(movie.backdrop_path.as_deref(), Some("/details-backdrop.jpg"));

        // no images route for this id: the details' paths are kept
        Mock::given(method("GET"))
            .and(path("/movie/551"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 551, "title": "Other", "poster_path": "/own.jpg"
            })))
            .mount(&server)
            .await;
        let other = client.details_with_images(551).await.unwrap();
        assert_eq!(other.poster_path.as_deref(), Some("/own.jpg"));
    }

    #[tokio::test]
    async fn import_uses_best_poster() {
        let server = MockServer::start().await;
        mount_list(&server, "popular", json!({"results": [{"id": 5, "title": "Five", "poster_path": "/list.jpg"}]})).await;
        for list in ["now_playing", "upcoming", "top_rated"] {
            mount_list(&server, list, json!({"results": []})).await;
        }
        Mock::given(method("GET"))
            .and(path("/movie/5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 5, "title": "Five", "poster_path": "/details.jpg"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/movie/5/images"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "posters": [{"file_path": "/voted.jpg", "vote_average": 6.0, "vote_count": 9}]
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let catalog = MovieCatalog::load(dir.path().join("movies.json")).await.unwrap();
        let client = TmdbClient::new(&config(&server.uri(), 10)).unwrap();
        client.import(&catalog, false).await.unwrap();
        let five = catalog.get("5").await.unwrap();
        assert_eq!(five.poster.as_deref(), Some("https://img.test/t/p/w500/voted.jpg"));
    }

    #[tokio::test]
    async fn breaker_opens_after_consecutive_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        let client = TmdbClient::new(&config(&server.uri(), 3)).unwrap();

        for _ in 0..3 {
            assert!(matches!(client.details(1).await, Err(TmdbError::Http(_))));
        }
        assert!(matches!(client.details(1).await, Err(TmdbError::Unavailable)));
    }

    #[tokio::test]
    async fn import_without_any_list_keeps_catalog() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let catalog = MovieCatalog::load(dir.path().join("movies.json")).await.unwrap();
        catalog.replace_all(vec![Movie { id: "9".into(), ..Default::default() }]).await.unwrap();

        let client = TmdbClient::new(&config(&server.uri(), 10)).unwrap();
        assert!(matches!(client.import(&catalog, false).await, Err(AppError::Upstream(_))));
        assert_eq!(catalog.all().await.len(), 1);
    }
}
