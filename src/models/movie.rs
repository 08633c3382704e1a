use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Movie {
    pub id: String,
    pub title: String,
    pub poster: Option<String>,
    pub backdrop: Option<String>,
    pub synopsis: String,
    pub duration: u32,
    pub rating: f64,
    pub genre: Vec<String>,
    pub release_date: String,
    pub director: String,
    pub cast: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trailer_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,
    pub is_now_showing: bool,
    pub is_coming_soon: bool,
    pub is_featured: bool,
}

/// Movie ids arrive as either JSON strings or numbers.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MovieId {
    Text(String),
    Number(i64),
}

impl MovieId {
    pub fn into_string(self) -> String {
        match self {
            MovieId::Text(s) => s,
            MovieId::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMovie {
    pub id: Option<MovieId>,
    pub title: Option<String>,
    pub poster: Option<String>,
    pub backdrop: Option<String>,
    pub synopsis: Option<String>,
    pub duration: Option<u32>,
    pub rating: Option<f64>,
    pub genre: Option<Vec<String>>,
    pub release_date: Option<String>,
    pub director: Option<String>,
    pub cast: Option<Vec<String>>,
    pub trailer_url: Option<String>,
    pub is_now_showing: Option<bool>,
    pub is_coming_soon: Option<bool>,
    pub is_featured: Option<bool>,
}

/// Partial update; absent fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoviePatch {
    pub title: Option<String>,
    pub poster: Option<String>,
    pub backdrop: Option<String>,
    pub synopsis: Option<String>,
    pub duration: Option<u32>,
    pub rating: Option<f64>,
    pub genre: Option<Vec<String>>,
    pub release_date: Option<String>,
    pub director: Option<String>,
    pub cast: Option<Vec<String>>,
    pub trailer_url: Option<String>,
    pub is_now_showing: Option<bool>,
    pub is_coming_soon: Option<bool>,
    pub is_featured: Option<bool>,
}

impl Movie {
    pub fn apply(&mut self, patch: MoviePatch) {
        if let Some(v) = patch.title {
            self.title = v;
        }
        if let Some(v) = patch.poster {
            self.poster = Some(v);
        }
        if let Some(v) = patch.backdrop {
            self.backdrop = Some(v);
        }
        if let Some(v) = patch.synopsis {
            self.synopsis = v;
        }
        if let Some(v) = patch.duration {
            self.duration = v;
        }
        if let Some(v) = patch.rating {
            self.rating = v;
        }
        if let Some(v) = patch.genre {
            self.genre = v;
        }
        if let Some(v) = patch.release_date {
            self.release_date = v;
        }
        if let Some(v) = patch.director {
            self.director = v;
        }
        if let Some(v) = patch.cast {
            self.cast = v;
        }
        if let Some(v) = patch.trailer_url {
            self.trailer_url = Some(v);
        }
        if let Some(v) = patch.is_now_showing {
            self.is_now_showing = v;
        }
        if let Some(v) = patch.is_coming_soon {
            self.is_coming_soon = v;
        }
        if let Some(v) = patch.is_featured {
            self.is_featured = v;
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieFilter {
    pub is_now_showing: Option<bool>,
    pub is_coming_soon: Option<bool>,
    pub is_featured: Option<bool>,
}

impl MovieFilter {
    pub fn matches(&self, movie: &Movie) -> bool {
        self.is_now_showing.map_or(true, |v| movie.is_now_showing == v)
            && self.is_coming_soon.map_or(true, |v| movie.is_coming_soon == v)
            && self.is_featured.map_or(true, |v| movie.is_featured == v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_sparse_catalog_entries() {
        let movie: Movie = serde_json::from_str(r#"{"id":"1","title":"Dune","rating":8.8,"isNowShowing":true}"#).unwrap();
        assert_eq!(movie.title, "Dune");
        assert!(movie.is_now_showing);
        assert!(movie.genre.is_empty());
        assert_eq!(movie.poster, None);
    }

    #[test]
    fn numeric_ids_are_accepted() {
        let new: NewMovie = serde_json::from_str(r#"{"id":550,"title":"Fight Club"}"#).unwrap();
        assert_eq!(new.id.map(MovieId::into_string).as_deref(), Some("550"));
    }

    #[test]
    fn filter_requires_every_given_flag() {
        let movie = Movie { is_now_showing: true, is_featured: false, ..Default::default() };
        assert!(MovieFilter::default().matches(&movie));
        assert!(MovieFilter { is_now_showing: Some(true), ..Default::default() }.matches(&movie));
        assert!(!MovieFilter { is_now_showing: Some(true), is_featured: Some(true), ..Default::default() }.matches(&movie));
    }

    #[test]
    fn patch_keeps_untouched_fields() {
        let mut movie = Movie { id: "7".into(), title: "Old".into(), rating: 6.1, ..Default::default() };
        movie.apply(MoviePatch { title: Some("New".into()), ..Default::default() });
        assert_eq!(movie.title, "New");
        assert_eq!(movie.rating, 6.1);
        assert_eq!(movie.id, "7");
    }
}
