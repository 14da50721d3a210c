//! Binary entry point: load configuration, start file logging, open the
//! SQLite store and drive the Ratatui event loop until the user exits.
use log::info;
use streaminsight::logging::init_logging;
use streaminsight::{run_app, seed_sample_data, App, Config, Database, MovieFilter};

/// Returning a `Result` bubbles fatal initialization problems (an unreadable
/// config file, an unwritable data directory) up to the terminal.
fn main() -> anyhow::Result<()> {
    let config = Config::load_default()?;
    init_logging(&config.log_path)?;
    info!("starting with database {}", config.database_path.display());

    let db = Database::open(&config.database_path)?;
    if config.seed_sample_data && seed_sample_data(&db)? {
        info!("inserted sample data into an empty database");
    }

    let mut app = App::new(db, MovieFilter::new(config.default_min_year));
    let result = run_app(&mut app);
    info!("shutting down");
    result
}
