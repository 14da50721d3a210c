use anyhow::{Context, Result};
use log::{info, warn};
use rusqlite::params;

use crate::error::DashboardError;
use crate::models::{
    AddMovieRequest, Movie, MovieListing, MAX_DURATION, MAX_RELEASE_YEAR, MIN_DURATION,
    MIN_RELEASE_YEAR,
};

use super::connection::Database;
use super::query::run_query_with_param;

const RELEASED_SINCE_SQL: &str = "SELECT title, genre
     FROM movies
     WHERE release_year >= ?1
     ORDER BY release_year, title";

/// Every movie ordered by identifier. Feeds the movie picker in the watch
/// form, so it is re-read each time that form opens.
pub fn fetch_movies(db: &Database) -> Result<Vec<Movie>> {
    let conn = db.connect().context("failed to open SQLite database")?;
    let mut stmt = conn
        .prepare(
            "SELECT movie_id, title, genre, release_year, duration
             FROM movies
             ORDER BY movie_id",
        )
        .context("failed to prepare movie query")?;

    let movies = stmt
        .query_map([], |row| {
            Ok(Movie {
                id: row.get(0)?,
                title: row.get(1)?,
                genre: row.get(2)?,
                release_year: row.get(3)?,
                duration: row.get(4)?,
            })
        })
        .context("failed to load movies")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect movies")?;

    Ok(movies)
}

/// Check the form values without touching the database.
pub fn validate_movie(request: &AddMovieRequest) -> Result<(), DashboardError> {
    if request.title.trim().is_empty() || request.genre.trim().is_empty() {
        return Err(DashboardError::validation("Please fill in all fields."));
    }
    if !(MIN_RELEASE_YEAR..=MAX_RELEASE_YEAR).contains(&request.release_year) {
        return Err(DashboardError::validation(format!(
            "Release year must be between {MIN_RELEASE_YEAR} and {MAX_RELEASE_YEAR}."
        )));
    }
    if !(MIN_DURATION..=MAX_DURATION).contains(&request.duration) {
        return Err(DashboardError::validation(format!(
            "Duration must be between {MIN_DURATION} and {MAX_DURATION} minutes."
        )));
    }
    Ok(())
}

/// Insert a movie and let SQLite assign its id. Identical submissions create
/// identical rows; there is no duplicate detection.
pub fn add_movie(db: &Database, request: &AddMovieRequest) -> Result<Movie, DashboardError> {
    if let Err(err) = validate_movie(request) {
        warn!("rejected movie submission: {err}");
        return Err(err);
    }

    let title = request.title.trim();
    let genre = request.genre.trim();

    let conn = db.connect()?;
    conn.execute(
        "INSERT INTO movies (title, genre, release_year, duration) VALUES (?1, ?2, ?3, ?4)",
        params![title, genre, request.release_year, request.duration],
    )?;

    let movie = Movie {
        id: conn.last_insert_rowid(),
        title: title.to_string(),
        genre: genre.to_string(),
        release_year: request.release_year,
        duration: request.duration,
    };
    info!("added movie #{} \"{}\"", movie.id, movie.title);
    Ok(movie)
}

/// Outcome of the release-year filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MovieListOutcome {
    Movies(Vec<MovieListing>),
    NoneFound,
}

/// Movies released in `min_year` or later. The year is bound, never spliced
/// into the SQL text.
pub fn movies_released_since(db: &Database, min_year: i64) -> Result<MovieListOutcome> {
    let table = run_query_with_param(db, RELEASED_SINCE_SQL, min_year)
        .with_context(|| format!("failed to list movies released since {min_year}"))?;
    if table.is_empty() {
        return Ok(MovieListOutcome::NoneFound);
    }

    let listings = table
        .rows
        .iter()
        .map(|row| MovieListing {
            title: row.first().map(|cell| cell.display()).unwrap_or_default(),
            genre: row.get(1).map(|cell| cell.display()).unwrap_or_default(),
        })
        .collect();
    Ok(MovieListOutcome::Movies(listings))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("movies.sqlite")).unwrap();
        (dir, db)
    }

    fn request(title: &str, genre: &str, year: i64) -> AddMovieRequest {
        AddMovieRequest {
            title: title.to_string(),
            genre: genre.to_string(),
            release_year: year,
            duration: 120,
        }
    }

    fn movie_count(db: &Database) -> i64 {
        db.connect()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM movies", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn adds_one_row_per_submission() {
        let (_dir, db) = scratch_db();
        let first = add_movie(&db, &request("Heat", "Crime", 1995)).unwrap();
        let second = add_movie(&db, &request("Heat", "Crime", 1995)).unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(movie_count(&db), 2);
        assert_eq!(fetch_movies(&db).unwrap(), vec![first, second]);
    }

    #[test]
    fn trims_text_fields() {
        let (_dir, db) = scratch_db();
        let movie = add_movie(&db, &request("  Heat ", " Crime", 1995)).unwrap();
        assert_eq!(movie.title, "Heat");
        assert_eq!(movie.genre, "Crime");
    }

    #[test]
    fn blank_title_or_genre_writes_nothing() {
        let (_dir, db) = scratch_db();
        for bad in [request("", "Crime", 2000), request("Heat", "   ", 2000)] {
            let err = add_movie(&db, &bad).unwrap_err();
            assert!(err.is_validation());
            assert_eq!(err.to_string(), "Please fill in all fields.");
        }
        assert_eq!(movie_count(&db), 0);
    }

    #[test]
    fn out_of_range_numbers_are_rejected() {
        let (_dir, db) = scratch_db();
        assert!(add_movie(&db, &request("Old", "Silent", 1899)).is_err());
        assert!(add_movie(&db, &request("New", "Future", 2026)).is_err());

        let mut long = request("Long", "Epic", 2000);
        long.duration = 301;
        assert!(add_movie(&db, &long).unwrap_err().is_validation());

        let mut short = request("Short", "Epic", 2000);
        short.duration = 0;
        assert!(add_movie(&db, &short).unwrap_err().is_validation());

        assert_eq!(movie_count(&db), 0);
    }

    #[test]
    fn accepts_inclusive_bounds() {
        let (_dir, db) = scratch_db();

        let mut earliest = request("Earliest", "Silent", 1900);
        earliest.duration = 1;
        let mut latest = request("Latest", "Epic", 2025);
        latest.duration = 300;

        add_movie(&db, &earliest).unwrap();
        add_movie(&db, &latest).unwrap();
        assert_eq!(movie_count(&db), 2);
    }

    #[test]
    fn filter_includes_threshold_year() {
        let (_dir, db) = scratch_db();
        add_movie(&db, &request("Before", "Drama", 2009)).unwrap();
        add_movie(&db, &request("Exactly", "Drama", 2010)).unwrap();
        add_movie(&db, &request("After", "Comedy", 2018)).unwrap();

        let outcome = movies_released_since(&db, 2010).unwrap();
        assert_eq!(
            outcome,
            MovieListOutcome::Movies(vec![
                MovieListing {
                    title: "Exactly".into(),
                    genre: "Drama".into()
                },
                MovieListing {
                    title: "After".into(),
                    genre: "Comedy".into()
                },
            ])
        );
    }

    #[test]
    fn filter_reports_none_found() {
        let (_dir, db) = scratch_db();
        add_movie(&db, &request("Old", "Drama", 1990)).unwrap();
        assert_eq!(
            movies_released_since(&db, 2010).unwrap(),
            MovieListOutcome::NoneFound
        );
    }
}
