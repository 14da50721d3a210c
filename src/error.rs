//! Error type shared by the write paths. Reads lean on `anyhow` like the rest
//! of the application glue, but mutations need to tell a rejected form apart
//! from a database that refused the write, so they return this enum instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    /// Input was rejected before anything touched the store.
    #[error("{0}")]
    Validation(String),

    /// The referenced movie vanished between the form opening and the submit.
    #[error("Movie does not exist (id {0}).")]
    MovieNotFound(i64),

    /// Connection failures, constraint violations and anything else SQLite
    /// reports while the transaction is open.
    #[error("{0}")]
    Store(#[from] rusqlite::Error),
}

impl DashboardError {
    pub fn validation(message: impl Into<String>) -> Self {
        DashboardError::Validation(message.into())
    }

    /// Validation failures leave the store untouched; everything else was an
    /// attempted write that had to be rolled back.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DashboardError::Validation(_) | DashboardError::MovieNotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movie_not_found_counts_as_validation() {
        assert!(DashboardError::MovieNotFound(7).is_validation());
        assert!(DashboardError::validation("Please fill in all fields.").is_validation());
    }

    #[test]
    fn store_errors_keep_the_sqlite_message() {
        let err = DashboardError::from(rusqlite::Error::QueryReturnedNoRows);
        assert!(!err.is_validation());
        assert_eq!(err.to_string(), "Query returned no rows");
    }
}
