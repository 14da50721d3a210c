//! Ratatui front-end: a report sidebar, the selected chart, the release-year
//! table and modal forms for the two write paths.

mod app;
mod forms;
mod helpers;
mod render;
mod terminal;

pub use app::App;
pub use terminal::run_app;
