//! Core library surface for the StreamInsight movie analytics dashboard.
//!
//! The persistence layer runs the fixed report queries and the two write
//! paths; the `ui` module renders results with Ratatui. The binary only wires
//! configuration, logging and the event loop together.
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod ui;

/// Convenience re-exports for the persistence layer.
pub use db::{
    add_movie, movies_released_since, record_watch_rating, run_report, seed_sample_data,
    Database, MovieListOutcome, QueryTable, ReportKind, ReportOutcome,
};

pub use config::Config;
pub use error::DashboardError;
pub use models::{AddMovieRequest, Movie, MovieFilter, User, WatchRatingRequest};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
