use anyhow::{Context, Result};
use log::{error, info, warn};
use rusqlite::{params, Transaction};

use crate::error::DashboardError;
use crate::models::{User, WatchRatingRequest, WatchReceipt, MAX_RATING, MIN_RATING};

use super::connection::Database;
use super::movies::fetch_movies;

/// Every user ordered by identifier, for the user picker.
pub fn fetch_users(db: &Database) -> Result<Vec<User>> {
    let conn = db.connect().context("failed to open SQLite database")?;
    let mut stmt = conn
        .prepare("SELECT user_id, name FROM users ORDER BY user_id")
        .context("failed to prepare user query")?;

    let users = stmt
        .query_map([], |row| {
            Ok(User {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })
        .context("failed to load users")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect users")?;

    Ok(users)
}

/// Record that a user watched and rated a movie today. Both rows are written
/// in one transaction: either both exist afterwards or neither does.
pub fn record_watch_rating(
    db: &Database,
    request: &WatchRatingRequest,
) -> Result<WatchReceipt, DashboardError> {
    if !(MIN_RATING..=MAX_RATING).contains(&request.rating) {
        let err = DashboardError::validation(format!(
            "Rating must be between {MIN_RATING} and {MAX_RATING}."
        ));
        warn!("rejected watch submission: {err}");
        return Err(err);
    }

    let mut conn = db.connect()?;
    let tx = conn.transaction()?;

    match write_watch_and_rating(&tx, request) {
        Ok(receipt) => {
            tx.commit()?;
            info!(
                "recorded watch #{} and rating #{} for user {} / movie {}",
                receipt.watch_id, receipt.rating_id, request.user_id, request.movie_id
            );
            Ok(receipt)
        }
        Err(err) => {
            if err.is_validation() {
                warn!("watch transaction aborted: {err}");
            } else {
                error!("watch transaction failed, rolling back: {err}");
            }
            if let Err(rollback_err) = tx.rollback() {
                error!("rollback failed: {rollback_err}");
            }
            Err(err)
        }
    }
}

fn write_watch_and_rating(
    tx: &Transaction<'_>,
    request: &WatchRatingRequest,
) -> Result<WatchReceipt, DashboardError> {
    let exists: i64 = tx.query_row(
        "SELECT COUNT(*) FROM movies WHERE movie_id = ?1",
        params![request.movie_id],
        |row| row.get(0),
    )?;
    if exists == 0 {
        return Err(DashboardError::MovieNotFound(request.movie_id));
    }

    let date: String = tx.query_row("SELECT date('now', 'localtime')", [], |row| row.get(0))?;

    tx.execute(
        "INSERT INTO watch_history (user_id, movie_id, watched_on) VALUES (?1, ?2, ?3)",
        params![request.user_id, request.movie_id, date],
    )?;
    let watch_id = tx.last_insert_rowid();

    tx.execute(
        "INSERT INTO ratings (user_id, movie_id, rating, rated_on) VALUES (?1, ?2, ?3, ?4)",
        params![request.user_id, request.movie_id, request.rating, date],
    )?;
    let rating_id = tx.last_insert_rowid();

    Ok(WatchReceipt {
        watch_id,
        rating_id,
        date,
    })
}

/// Build a request from display names by reading users and movies at
/// submission time. A name that matches nothing, or more than one row, is
/// rejected instead of guessing.
pub fn resolve_watch_request(
    db: &Database,
    user_name: &str,
    movie_title: &str,
    rating: i64,
) -> Result<WatchRatingRequest, DashboardError> {
    let users = fetch_users(db).map_err(store_failure)?;
    let movies = fetch_movies(db).map_err(store_failure)?;

    let user_id = unique_match(
        users.iter().filter(|user| user.name == user_name).map(|user| user.id),
        "user",
        user_name,
    )?;
    let movie_id = unique_match(
        movies
            .iter()
            .filter(|movie| movie.title == movie_title)
            .map(|movie| movie.id),
        "movie",
        movie_title,
    )?;

    Ok(WatchRatingRequest {
        user_id,
        movie_id,
        rating,
    })
}

fn unique_match(
    mut ids: impl Iterator<Item = i64>,
    kind: &str,
    name: &str,
) -> Result<i64, DashboardError> {
    match (ids.next(), ids.next()) {
        (Some(id), None) => Ok(id),
        (None, _) => Err(DashboardError::validation(format!(
            "No {kind} named \"{name}\"."
        ))),
        (Some(_), Some(_)) => Err(DashboardError::validation(format!(
            "More than one {kind} is named \"{name}\"; pick by id."
        ))),
    }
}

/// Snapshot reads use `anyhow`; fold them back into the store variant while
/// keeping the underlying SQLite error when there is one.
fn store_failure(err: anyhow::Error) -> DashboardError {
    match err.downcast::<rusqlite::Error>() {
        Ok(sql) => DashboardError::Store(sql),
        Err(other) => DashboardError::validation(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::movies::add_movie;
    use crate::models::AddMovieRequest;

    fn scratch_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("movies.sqlite")).unwrap();
        (dir, db)
    }

    fn insert_user(db: &Database, name: &str) -> i64 {
        let conn = db.connect().unwrap();
        conn.execute("INSERT INTO users (name) VALUES (?1)", params![name])
            .unwrap();
        conn.last_insert_rowid()
    }

    fn insert_movie(db: &Database, title: &str) -> i64 {
        add_movie(
            db,
            &AddMovieRequest {
                title: title.to_string(),
                genre: "Drama".to_string(),
                release_year: 2012,
                duration: 95,
            },
        )
        .unwrap()
        .id
    }

    fn counts(db: &Database) -> (i64, i64) {
        let conn = db.connect().unwrap();
        let watches = conn
            .query_row("SELECT COUNT(*) FROM watch_history", [], |row| row.get(0))
            .unwrap();
        let ratings = conn
            .query_row("SELECT COUNT(*) FROM ratings", [], |row| row.get(0))
            .unwrap();
        (watches, ratings)
    }

    #[test]
    fn writes_one_watch_and_one_rating_dated_today() {
        let (_dir, db) = scratch_db();
        let user_id = insert_user(&db, "Asha");
        let movie_id = insert_movie(&db, "Arrival");

        let receipt = record_watch_rating(
            &db,
            &WatchRatingRequest {
                user_id,
                movie_id,
                rating: 4,
            },
        )
        .unwrap();

        assert_eq!(counts(&db), (1, 1));

        let conn = db.connect().unwrap();
        let today: String = conn
            .query_row("SELECT date('now', 'localtime')", [], |row| row.get(0))
            .unwrap();
        let (watched_on, rated_on, rating): (String, String, i64) = conn
            .query_row(
                "SELECT w.watched_on, r.rated_on, r.rating
                 FROM watch_history w
                 JOIN ratings r ON r.user_id = w.user_id AND r.movie_id = w.movie_id
                 WHERE w.watch_id = ?1 AND r.rating_id = ?2",
                params![receipt.watch_id, receipt.rating_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();

        assert_eq!(receipt.date, today);
        assert_eq!(watched_on, today);
        assert_eq!(rated_on, today);
        assert_eq!(rating, 4);
    }

    #[test]
    fn missing_movie_writes_nothing() {
        let (_dir, db) = scratch_db();
        let user_id = insert_user(&db, "Asha");

        let err = record_watch_rating(
            &db,
            &WatchRatingRequest {
                user_id,
                movie_id: 404,
                rating: 3,
            },
        )
        .unwrap_err();

        assert!(matches!(err, DashboardError::MovieNotFound(404)));
        assert!(err.to_string().starts_with("Movie does not exist"));
        assert_eq!(counts(&db), (0, 0));
    }

    #[test]
    fn failing_rating_insert_rolls_back_the_watch() {
        let (_dir, db) = scratch_db();
        let user_id = insert_user(&db, "Asha");
        let movie_id = insert_movie(&db, "Arrival");

        // Let the watch insert succeed and make the rating insert fail.
        db.connect()
            .unwrap()
            .execute_batch(
                "CREATE TRIGGER reject_ratings BEFORE INSERT ON ratings
                 BEGIN SELECT RAISE(ABORT, 'ratings are frozen'); END;",
            )
            .unwrap();

        let err = record_watch_rating(
            &db,
            &WatchRatingRequest {
                user_id,
                movie_id,
                rating: 5,
            },
        )
        .unwrap_err();

        assert!(!err.is_validation());
        assert!(err.to_string().contains("ratings are frozen"));
        assert_eq!(counts(&db), (0, 0));
    }

    #[test]
    fn unknown_user_violates_foreign_key_and_rolls_back() {
        let (_dir, db) = scratch_db();
        let movie_id = insert_movie(&db, "Arrival");

        let err = record_watch_rating(
            &db,
            &WatchRatingRequest {
                user_id: 999,
                movie_id,
                rating: 2,
            },
        )
        .unwrap_err();

        assert!(matches!(err, DashboardError::Store(_)));
        assert_eq!(counts(&db), (0, 0));
    }

    #[test]
    fn rating_out_of_range_is_a_validation_failure() {
        let (_dir, db) = scratch_db();
        let user_id = insert_user(&db, "Asha");
        let movie_id = insert_movie(&db, "Arrival");

        for rating in [0, 6] {
            let err = record_watch_rating(
                &db,
                &WatchRatingRequest {
                    user_id,
                    movie_id,
                    rating,
                },
            )
            .unwrap_err();
            assert!(err.is_validation());
        }
        assert_eq!(counts(&db), (0, 0));
    }

    #[test]
    fn resolves_names_against_current_rows() {
        let (_dir, db) = scratch_db();
        let user_id = insert_user(&db, "Asha");
        // Added after any earlier snapshot would have been taken.
        let movie_id = insert_movie(&db, "Coco");

        let request = resolve_watch_request(&db, "Asha", "Coco", 5).unwrap();
        assert_eq!(
            request,
            WatchRatingRequest {
                user_id,
                movie_id,
                rating: 5
            }
        );
    }

    #[test]
    fn ambiguous_or_unknown_names_are_rejected() {
        let (_dir, db) = scratch_db();
        insert_user(&db, "Alex");
        insert_user(&db, "Alex");
        insert_movie(&db, "Coco");

        let err = resolve_watch_request(&db, "Alex", "Coco", 5).unwrap_err();
        assert!(err.to_string().contains("More than one user"));

        let err = resolve_watch_request(&db, "Nobody", "Coco", 5).unwrap_err();
        assert!(err.to_string().contains("No user named"));
    }
}
