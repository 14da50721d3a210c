//! Persistence module split across logical submodules.

mod connection;
mod movies;
mod query;
mod reports;
mod watch;

pub use connection::{ensure_schema, seed_sample_data, Database};
pub use movies::{
    add_movie, fetch_movies, movies_released_since, validate_movie, MovieListOutcome,
};
pub use query::{run_query, run_query_with_param, CellValue, QueryTable};
pub use reports::{run_report, ReportKind, ReportOutcome};
pub use watch::{fetch_users, record_watch_rating, resolve_watch_request};
