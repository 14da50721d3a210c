use anyhow::{Context, Result};
use log::info;

use super::connection::Database;
use super::query::{run_query, QueryTable};

/// The fixed set of analytics the sidebar offers. None of them take
/// parameters; each maps to exactly one SQL statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    TopRatedMovies,
    MostActiveUsers,
    WatchedNotRated,
    MovieRanking,
}

impl ReportKind {
    pub const ALL: [ReportKind; 4] = [
        ReportKind::TopRatedMovies,
        ReportKind::MostActiveUsers,
        ReportKind::WatchedNotRated,
        ReportKind::MovieRanking,
    ];

    pub fn title(self) -> &'static str {
        match self {
            ReportKind::TopRatedMovies => "Top Rated Movies",
            ReportKind::MostActiveUsers => "Most Active Users",
            ReportKind::WatchedNotRated => "Users Who Watched But Didn't Rate",
            ReportKind::MovieRanking => "Movie Ranking (Window Function)",
        }
    }

    /// Ties are broken by the label column so repeated runs list rows in the
    /// same order.
    pub fn sql(self) -> &'static str {
        match self {
            ReportKind::TopRatedMovies => {
                "SELECT m.title, ROUND(AVG(r.rating), 2) AS avg_rating
                 FROM ratings r
                 JOIN movies m ON r.movie_id = m.movie_id
                 GROUP BY m.title
                 ORDER BY avg_rating DESC, m.title
                 LIMIT 5"
            }
            ReportKind::MostActiveUsers => {
                "SELECT u.name, COUNT(w.watch_id) AS watch_count
                 FROM watch_history w
                 JOIN users u ON w.user_id = u.user_id
                 GROUP BY u.name
                 ORDER BY watch_count DESC, u.name
                 LIMIT 5"
            }
            ReportKind::WatchedNotRated => {
                "SELECT DISTINCT u.name
                 FROM users u
                 JOIN watch_history w ON u.user_id = w.user_id
                 LEFT JOIN ratings r
                     ON w.user_id = r.user_id AND w.movie_id = r.movie_id
                 WHERE r.rating IS NULL
                 ORDER BY u.name"
            }
            ReportKind::MovieRanking => {
                "SELECT title,
                        RANK() OVER (ORDER BY AVG(rating) DESC) AS rank_position
                 FROM ratings
                 JOIN movies USING (movie_id)
                 GROUP BY title
                 ORDER BY rank_position, title"
            }
        }
    }

    /// Position in `ALL`, used by the sidebar selection.
    pub fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|kind| *kind == self)
            .unwrap_or_default()
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn previous(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Result of running a report. An empty result is reported explicitly so the
/// renderer shows a message instead of an empty chart.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportOutcome {
    Table(QueryTable),
    NoData,
}

pub fn run_report(db: &Database, kind: ReportKind) -> Result<ReportOutcome> {
    let table = run_query(db, kind.sql())
        .with_context(|| format!("failed to run report \"{}\"", kind.title()))?;
    info!("report \"{}\" returned {} rows", kind.title(), table.len());

    if table.is_empty() {
        Ok(ReportOutcome::NoData)
    } else {
        Ok(ReportOutcome::Table(table))
    }
}
