use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Genre {
    Action,
    Crime,
    Adventure,
    Comedy,
    Drama,
    Fantasy,
    Horror,
}

impl Genre {
    pub const ALL: [Genre; 7] = [
        Genre::Action,
        Genre::Crime,
        Genre::Adventure,
        Genre::Comedy,
        Genre::Drama,
        Genre::Fantasy,
        Genre::Horror,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Action => "Action",
            Genre::Crime => "Crime",
            Genre::Adventure => "Adventure",
            Genre::Comedy => "Comedy",
            Genre::Drama => "Drama",
            Genre::Fantasy => "Fantasy",
            Genre::Horror => "Horror",
        }
    }

    /// Exact, case-sensitive lookup by canonical name. Payloads must spell
    /// tags exactly; only query filtering is case-insensitive.
    pub fn from_name(name: &str) -> Option<Genre> {
        Genre::ALL.into_iter().find(|g| g.as_str() == name)
    }

    pub fn matches(&self, tag: &str) -> bool {
        self.as_str().eq_ignore_ascii_case(tag)
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: String,
    pub title: String,
    pub year: u16,
    pub director: String,
    pub duration: u64,
    pub poster: String,
    pub genre: Vec<Genre>,
    pub rate: f64,
}

impl Movie {
    pub fn from_new(id: impl Into<String>, movie: NewMovie) -> Self {
        Self {
            id: id.into(),
            title: movie.title,
            year: movie.year,
            director: movie.director,
            duration: movie.duration,
            poster: movie.poster,
            genre: movie.genre,
            rate: movie.rate,
        }
    }

    pub fn has_genre(&self, tag: &str) -> bool {
        self.genre.iter().any(|g| g.matches(tag))
    }
}

/// A fully validated movie that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewMovie {
    pub title: String,
    pub year: u16,
    pub director: String,
    pub duration: u64,
    pub poster: String,
    pub genre: Vec<Genre>,
    pub rate: f64,
}

/// The fields present in a partial update. Absent fields leave the stored
/// record untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MoviePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub director: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<Vec<Genre>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<f64>,
}

impl MoviePatch {
    pub fn is_empty(&self) -> bool {
        *self == MoviePatch::default()
    }

    pub fn apply(self, movie: &mut Movie) {
        if let Some(title) = self.title {
            movie.title = title;
        }
        if let Some(year) = self.year {
            movie.year = year;
        }
        if let Some(director) = self.director {
            movie.director = director;
        }
        if let Some(duration) = self.duration {
            movie.duration = duration;
        }
        if let Some(poster) = self.poster {
            movie.poster = poster;
        }
        if let Some(genre) = self.genre {
            movie.genre = genre;
        }
        if let Some(rate) = self.rate {
            movie.rate = rate;
        }
    }
}
