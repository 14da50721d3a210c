use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use log::{debug, info};
use rusqlite::{params, Connection};

/// Hands out one SQLite connection per unit of work. Nothing is cached
/// between calls: every query or transaction opens the file, does its job and
/// drops the connection before returning.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    /// Create the parent directory if needed, make sure the schema exists and
    /// return a handle that can open connections on demand.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).context("failed to create data directory")?;
            }
        }

        let db = Self { path };
        let conn = db.connect().context("failed to open SQLite database")?;
        ensure_schema(&conn)?;
        info!("database ready at {}", db.path.display());
        Ok(db)
    }

    /// Open a fresh connection with foreign keys enforced. The connection is
    /// closed when the caller drops it.
    pub fn connect(&self) -> rusqlite::Result<Connection> {
        debug!("opening connection to {}", self.path.display());
        let conn = Connection::open(&self.path)?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(conn)
    }
}

/// Create the four tables if they are missing. Bounds on year, duration and
/// rating are repeated as CHECK constraints so rows written by other tools
/// obey the same rules as the forms.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS movies (
            movie_id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            genre TEXT NOT NULL,
            release_year INTEGER NOT NULL CHECK (release_year BETWEEN 1900 AND 2025),
            duration INTEGER NOT NULL CHECK (duration BETWEEN 1 AND 300)
        )",
        [],
    )
    .context("failed to create movies table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS users (
            user_id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL
        )",
        [],
    )
    .context("failed to create users table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS watch_history (
            watch_id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            movie_id INTEGER NOT NULL,
            watched_on TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES users(user_id),
            FOREIGN KEY(movie_id) REFERENCES movies(movie_id)
        )",
        [],
    )
    .context("failed to create watch_history table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS ratings (
            rating_id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            movie_id INTEGER NOT NULL,
            rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
            rated_on TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES users(user_id),
            FOREIGN KEY(movie_id) REFERENCES movies(movie_id)
        )",
        [],
    )
    .context("failed to create ratings table")?;

    Ok(())
}

const SAMPLE_USERS: &[&str] = &["Asha", "Bruno", "Chen", "Dana", "Emeka", "Farah"];

const SAMPLE_MOVIES: &[(&str, &str, i64, i64)] = &[
    ("Inception", "Sci-Fi", 2010, 148),
    ("Parasite", "Thriller", 2019, 132),
    ("Spirited Away", "Animation", 2001, 125),
    ("Mad Max: Fury Road", "Action", 2015, 120),
    ("The Godfather", "Crime", 1972, 175),
    ("Coco", "Animation", 2017, 105),
    ("Arrival", "Sci-Fi", 2016, 116),
];

/// (user index, movie index, rating); `None` leaves the watch unrated.
const SAMPLE_ACTIVITY: &[(usize, usize, Option<i64>)] = &[
    (0, 0, Some(5)),
    (0, 1, Some(4)),
    (0, 6, None),
    (1, 0, Some(4)),
    (1, 3, Some(3)),
    (2, 2, Some(5)),
    (2, 5, Some(5)),
    (2, 1, Some(5)),
    (3, 4, Some(4)),
    (3, 3, None),
    (4, 6, Some(3)),
    (5, 0, Some(5)),
    (5, 2, Some(4)),
];

/// Fill an empty database with a small demo catalogue. Returns `false` and
/// leaves the data alone when any user already exists.
pub fn seed_sample_data(db: &Database) -> Result<bool> {
    let mut conn = db.connect().context("failed to open SQLite database")?;

    let existing: i64 = conn
        .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
        .context("failed to count users")?;
    if existing > 0 {
        return Ok(false);
    }

    let tx = conn.transaction().context("failed to start seed transaction")?;

    let mut user_ids = Vec::with_capacity(SAMPLE_USERS.len());
    for name in SAMPLE_USERS {
        tx.execute("INSERT INTO users (name) VALUES (?1)", params![name])
            .context("failed to insert sample user")?;
        user_ids.push(tx.last_insert_rowid());
    }

    let mut movie_ids = Vec::with_capacity(SAMPLE_MOVIES.len());
    for (title, genre, year, duration) in SAMPLE_MOVIES {
        tx.execute(
            "INSERT INTO movies (title, genre, release_year, duration) VALUES (?1, ?2, ?3, ?4)",
            params![title, genre, year, duration],
        )
        .context("failed to insert sample movie")?;
        movie_ids.push(tx.last_insert_rowid());
    }

    for (user, movie, rating) in SAMPLE_ACTIVITY {
        tx.execute(
            "INSERT INTO watch_history (user_id, movie_id, watched_on)
             VALUES (?1, ?2, date('now', 'localtime'))",
            params![user_ids[*user], movie_ids[*movie]],
        )
        .context("failed to insert sample watch")?;

        if let Some(rating) = rating {
            tx.execute(
                "INSERT INTO ratings (user_id, movie_id, rating, rated_on)
                 VALUES (?1, ?2, ?3, date('now', 'localtime'))",
                params![user_ids[*user], movie_ids[*movie], rating],
            )
            .context("failed to insert sample rating")?;
        }
    }

    tx.commit().context("failed to commit sample data")?;
    info!(
        "seeded {} users and {} movies",
        SAMPLE_USERS.len(),
        SAMPLE_MOVIES.len()
    );
    Ok(true)
}
