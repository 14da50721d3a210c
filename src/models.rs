//! Domain models that mirror the SQLite schema plus the request objects the UI
//! hands to the write paths. The structs stay plain data holders so the
//! persistence layer owns every rule about what a valid row looks like.

use std::fmt;

pub const MIN_RELEASE_YEAR: i64 = 1900;
pub const MAX_RELEASE_YEAR: i64 = 2025;
pub const MIN_DURATION: i64 = 1;
pub const MAX_DURATION: i64 = 300;
pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
/// A row in `movies`. The identifier is assigned by SQLite on insert.
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub genre: String,
    /// Bounded to 1900..=2025 both here and by a CHECK constraint.
    pub release_year: i64,
    /// Runtime in minutes, 1..=300.
    pub duration: i64,
}

impl fmt::Display for Movie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A row in `users`. This application never creates users outside the demo
/// seed; they are read to populate the watch form.
pub struct User {
    pub id: i64,
    pub name: String,
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Projection returned by the release-year filter.
pub struct MovieListing {
    pub title: String,
    pub genre: String,
}

/// Everything the "Add Movie" form collects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddMovieRequest {
    pub title: String,
    pub genre: String,
    pub release_year: i64,
    pub duration: i64,
}

/// A watch+rating submission. It carries identifiers rather than display
/// names so two users called "Alex" cannot be confused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchRatingRequest {
    pub user_id: i64,
    pub movie_id: i64,
    pub rating: i64,
}

/// What a committed watch+rating transaction produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchReceipt {
    pub watch_id: i64,
    pub rating_id: i64,
    /// `YYYY-MM-DD`, the same value stamped on both rows.
    pub date: String,
}

/// Threshold for the "released since" table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovieFilter {
    pub min_year: i64,
}

impl MovieFilter {
    pub fn new(min_year: i64) -> Self {
        Self {
            min_year: min_year.clamp(MIN_RELEASE_YEAR, MAX_RELEASE_YEAR),
        }
    }

    /// Move the threshold by `delta` years, staying inside the valid range.
    pub fn shift(&mut self, delta: i64) {
        self.min_year = (self.min_year + delta).clamp(MIN_RELEASE_YEAR, MAX_RELEASE_YEAR);
    }
}
