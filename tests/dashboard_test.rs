//! End-to-end checks of the read and write paths against a throwaway SQLite
//! file, using only the public library API.

use rusqlite::params;
use streaminsight::db::{resolve_watch_request, CellValue};
use streaminsight::{
    add_movie, movies_released_since, record_watch_rating, run_report, AddMovieRequest,
    DashboardError, Database, MovieListOutcome, ReportKind, ReportOutcome, WatchRatingRequest,
};

fn scratch_db() -> (tempfile::TempDir, Database) {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = Database::open(dir.path().join("dashboard.sqlite")).expect("open database");
    (dir, db)
}

fn add_user(db: &Database, name: &str) -> i64 {
    let conn = db.connect().unwrap();
    conn.execute("INSERT INTO users (name) VALUES (?1)", params![name])
        .unwrap();
    conn.last_insert_rowid()
}

fn add(db: &Database, title: &str, year: i64) -> i64 {
    add_movie(
        db,
        &AddMovieRequest {
            title: title.to_string(),
            genre: "Drama".to_string(),
            release_year: year,
            duration: 110,
        },
    )
    .unwrap()
    .id
}

fn count(db: &Database, table: &str) -> i64 {
    db.connect()
        .unwrap()
        .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
        .unwrap()
}

#[test]
fn watched_but_not_rated_scenario() {
    let (_dir, db) = scratch_db();
    let a = add_user(&db, "A");
    let x = add(&db, "X", 2001);
    let y = add(&db, "Y", 2002);

    // Rated watch of Y goes through the transaction.
    record_watch_rating(
        &db,
        &WatchRatingRequest {
            user_id: a,
            movie_id: y,
            rating: 4,
        },
    )
    .unwrap();

    // Unrated watches of X are written directly.
    let conn = db.connect().unwrap();
    for _ in 0..2 {
        conn.execute(
            "INSERT INTO watch_history (user_id, movie_id, watched_on) VALUES (?1, ?2, '2024-01-01')",
            params![a, x],
        )
        .unwrap();
    }
    drop(conn);

    match run_report(&db, ReportKind::WatchedNotRated).unwrap() {
        ReportOutcome::Table(table) => {
            assert_eq!(table.rows, vec![vec![CellValue::Text("A".into())]]);
        }
        ReportOutcome::NoData => panic!("expected A to be listed"),
    }
}

#[test]
fn transaction_is_all_or_nothing() {
    let (_dir, db) = scratch_db();
    let user = add_user(&db, "Dana");
    let movie = add(&db, "Heat", 1995);

    let ok = WatchRatingRequest {
        user_id: user,
        movie_id: movie,
        rating: 5,
    };
    record_watch_rating(&db, &ok).unwrap();
    assert_eq!((count(&db, "watch_history"), count(&db, "ratings")), (1, 1));

    let missing = WatchRatingRequest {
        movie_id: movie + 100,
        ..ok
    };
    let err = record_watch_rating(&db, &missing).unwrap_err();
    assert!(matches!(err, DashboardError::MovieNotFound(_)));
    assert_eq!((count(&db, "watch_history"), count(&db, "ratings")), (1, 1));
}

#[test]
fn stale_selection_is_caught_inside_the_transaction() {
    let (_dir, db) = scratch_db();
    let user = add_user(&db, "Emeka");
    let movie = add(&db, "Gone Soon", 2011);

    // The movie disappears after the form was filled in.
    db.connect()
        .unwrap()
        .execute("DELETE FROM movies WHERE movie_id = ?1", params![movie])
        .unwrap();

    let err = record_watch_rating(
        &db,
        &WatchRatingRequest {
            user_id: user,
            movie_id: movie,
            rating: 3,
        },
    )
    .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(count(&db, "watch_history"), 0);
}

#[test]
fn names_resolve_against_fresh_rows() {
    let (_dir, db) = scratch_db();
    add_user(&db, "Farah");
    let movie = add(&db, "Arrival", 2016);

    let request = resolve_watch_request(&db, "Farah", "Arrival", 4).unwrap();
    assert_eq!(request.movie_id, movie);
    record_watch_rating(&db, &request).unwrap();
    assert_eq!(count(&db, "ratings"), 1);
}

#[test]
fn year_filter_respects_threshold() {
    let (_dir, db) = scratch_db();
    assert_eq!(
        movies_released_since(&db, 2010).unwrap(),
        MovieListOutcome::NoneFound
    );

    add(&db, "Old", 1999);
    add(&db, "New", 2014);

    match movies_released_since(&db, 2010).unwrap() {
        MovieListOutcome::Movies(movies) => {
            assert_eq!(movies.len(), 1);
            assert_eq!(movies[0].title, "New");
        }
        MovieListOutcome::NoneFound => panic!("expected one movie"),
    }

    match movies_released_since(&db, 1900).unwrap() {
        MovieListOutcome::Movies(movies) => {
            let titles: Vec<_> = movies.iter().map(|movie| movie.title.as_str()).collect();
            assert_eq!(titles, vec!["Old", "New"]);
        }
        MovieListOutcome::NoneFound => panic!("expected both movies"),
    }
}

#[test]
fn top_rated_is_repeatable() {
    let (_dir, db) = scratch_db();
    let user = add_user(&db, "Chen");
    for (idx, title) in ["A", "B", "C", "D", "E", "F"].iter().enumerate() {
        let movie = add(&db, title, 2000 + idx as i64);
        record_watch_rating(
            &db,
            &WatchRatingRequest {
                user_id: user,
                movie_id: movie,
                rating: (idx as i64 % 5) + 1,
            },
        )
        .unwrap();
    }

    let first = run_report(&db, ReportKind::TopRatedMovies).unwrap();
    let second = run_report(&db, ReportKind::TopRatedMovies).unwrap();
    assert_eq!(first, second);
    match first {
        ReportOutcome::Table(table) => assert_eq!(table.len(), 5),
        ReportOutcome::NoData => panic!("expected rows"),
    }
}
