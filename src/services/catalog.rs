//! The movie catalog: a JSON file mirrored in memory.

use chrono::Utc;
use std::{
    cmp::Ordering,
    collections::HashSet,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::{
    error::{AppError, AppResult},
    models::movie::{Movie, MovieFilter, MovieId, MoviePatch, NewMovie},
};

pub const POPULAR_MIN_RATING: f64 = 8.0;
pub const POPULAR_LIMIT: usize = 10;

#[derive(Clone)]
pub struct MovieCatalog {
    path: PathBuf,
    movies: Arc<RwLock<Vec<Movie>>>,
}

fn by_rating_desc(a: &Movie, b: &Movie) -> Ordering {
    b.rating.partial_cmp(&a.rating).unwrap_or(Ordering::Equal)
}

impl MovieCatalog {
    /// Loads the catalog file. A missing file is an empty catalog.
    pub async fn load(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        let movies = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<Vec<Movie>>(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Movie catalog {} not found, starting empty", path.display());
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };
        info!("Loaded {} movies from {}", movies.len(), path.display());
        Ok(Self { path, movies: Arc::new(RwLock::new(movies)) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn all(&self) -> Vec<Movie> {
        self.movies.read().await.clone()
    }

    pub async fn filter(&self, filter: MovieFilter) -> Vec<Movie> {
        let mut movies: Vec<Movie> = self
            .movies
            .read()
            .await
            .iter()
            .filter(|m| filter.matches(m))
            .cloned()
            .collect();
        movies.sort_by(by_rating_desc);
        movies
    }

    pub async fn popular(&self) -> Vec<Movie> {
        let mut movies: Vec<Movie> = self
            .movies
            .read()
            .await
            .iter()
            .filter(|m| m.rating >= POPULAR_MIN_RATING)
            .cloned()
            .collect();
        movies.sort_by(by_rating_desc);
        movies.truncate(POPULAR_LIMIT);
        movies
    }

    pub async fn get(&self, id: &str) -> Option<Movie> {
        self.movies.read().await.iter().find(|m| m.id == id).cloned()
    }

    pub async fn create(&self, new: NewMovie) -> AppResult<Movie> {
        let id = new.id.map(MovieId::into_string).filter(|s| !s.trim().is_empty());
        let title = new.title.filter(|s| !s.trim().is_empty());
        let (Some(id), Some(title)) = (id, title) else {
            return Err(AppError::validation("Title and ID are required"));
        };

        let movie = Movie {
            id,
            title,
            poster: Some(new.poster.unwrap_or_default()),
            backdrop: Some(new.backdrop.unwrap_or_default()),
            synopsis: new.synopsis.unwrap_or_else(|| "No synopsis available.".to_string()),
            duration: new.duration.unwrap_or(120),
            rating: new.rating.unwrap_or(0.0),
            genre: new.genre.unwrap_or_default(),
            release_date: new
                .release_date
                .unwrap_or_else(|| Utc::now().date_naive().format("%Y-%m-%d").to_string()),
            director: new.director.unwrap_or_else(|| "Unknown".to_string()),
            cast: new.cast.unwrap_or_default(),
            trailer_url: new.trailer_url,
            is_now_showing: new.is_now_showing.unwrap_or(false),
            is_coming_soon: new.is_coming_soon.unwrap_or(false),
            is_featured: new.is_featured.unwrap_or(false),
            ..Default::default()
        };

        let mut movies = self.movies.write().await;
        if movies.iter().any(|m| m.id == movie.id) {
            return Err(AppError::Conflict("Movie with this ID already exists".into()));
        }
        let mut next = movies.clone();
        next.push(movie.clone());
        self.persist(&next).await?;
        *movies = next;
        info!("Created movie {} ({})", movie.id, movie.title);
        Ok(movie)
    }

    pub async fn update(&self, id: &str, patch: MoviePatch) -> AppResult<Movie> {
        let mut movies = self.movies.write().await;
        let index = movies
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| AppError::not_found("Movie not found"))?;
        let mut next = movies.clone();
        next[index].apply(patch);
        let updated = next[index].clone();
        self.persist(&next).await?;
        *movies = next;
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let mut movies = self.movies.write().await;
        let next: Vec<Movie> = movies.iter().filter(|m| m.id != id).cloned().collect();
        if next.len() == movies.len() {
            return Err(AppError::not_found("Movie not found"));
        }
        self.persist(&next).await?;
        *movies = next;
        info!("Deleted movie {}", id);
        Ok(())
    }

    pub async fn ids(&self) -> HashSet<String> {
        self.movies.read().await.iter().map(|m| m.id.clone()).collect()
    }

    pub async fn replace_all(&self, new_movies: Vec<Movie>) -> AppResult<usize> {
        let mut movies = self.movies.write().await;
        self.persist(&new_movies).await?;
        *movies = new_movies;
        Ok(movies.len())
    }

    /// Appends movies whose id is not yet present. Returns the new catalog size.
    pub async fn append_new(&self, new_movies: Vec<Movie>) -> AppResult<usize> {
        let mut movies = self.movies.write().await;
        let mut seen: HashSet<String> = movies.iter().map(|m| m.id.clone()).collect();
        let mut next = movies.clone();
        next.extend(new_movies.into_iter().filter(|m| seen.insert(m.id.clone())));
        self.persist(&next).await?;
        *movies = next;
        Ok(movies.len())
    }

    /// Writes next to the catalog then renames over it, so readers of the
    /// file never see a partial write.
    async fn persist(&self, movies: &[Movie]) -> AppResult<()> {
        let json = serde_json::to_vec_pretty(movies)?;
        let tmp = self.path.with_extension("json.tmp");
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}
