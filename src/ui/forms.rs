use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::error::DashboardError;
use crate::models::{AddMovieRequest, Movie, User, WatchRatingRequest, MAX_RATING, MIN_RATING};

use super::helpers::{cycle_index, disambiguated_labels};

/// Render `name: value` with the active field highlighted and empty fields
/// showing a placeholder.
fn field_line(field_name: &str, value: &str, placeholder: &str, is_active: bool) -> Line<'static> {
    let display = if value.is_empty() {
        placeholder.to_string()
    } else {
        value.to_string()
    };

    let style = if is_active {
        Style::default().fg(Color::Yellow)
    } else if value.is_empty() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };

    Line::from(vec![
        Span::raw(format!("{field_name}: ")),
        Span::styled(display, style),
    ])
}

/// Internal representation of the "Add Movie" form fields. Numbers are kept
/// as text while typing and parsed on submit.
#[derive(Default, Clone)]
pub(crate) struct MovieForm {
    pub(crate) title: String,
    pub(crate) genre: String,
    pub(crate) release_year: String,
    pub(crate) duration: String,
    pub(crate) active: MovieField,
    pub(crate) error: Option<String>,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub(crate) enum MovieField {
    #[default]
    Title,
    Genre,
    ReleaseYear,
    Duration,
}

impl MovieField {
    pub(crate) const ALL: [MovieField; 4] = [
        MovieField::Title,
        MovieField::Genre,
        MovieField::ReleaseYear,
        MovieField::Duration,
    ];

    pub(crate) fn label(self) -> &'static str {
        match self {
            MovieField::Title => "Title",
            MovieField::Genre => "Genre",
            MovieField::ReleaseYear => "Release Year",
            MovieField::Duration => "Duration (minutes)",
        }
    }

    fn is_numeric(self) -> bool {
        matches!(self, MovieField::ReleaseYear | MovieField::Duration)
    }
}

impl MovieForm {
    /// Cycle focus forward (or backward) through the four fields.
    pub(crate) fn toggle_field(&mut self, forward: bool) {
        let idx = MovieField::ALL
            .iter()
            .position(|field| *field == self.active)
            .unwrap_or_default();
        let delta = if forward { 1 } else { -1 };
        self.active = MovieField::ALL[cycle_index(idx, MovieField::ALL.len(), delta)];
    }

    fn value_mut(&mut self, field: MovieField) -> &mut String {
        match field {
            MovieField::Title => &mut self.title,
            MovieField::Genre => &mut self.genre,
            MovieField::ReleaseYear => &mut self.release_year,
            MovieField::Duration => &mut self.duration,
        }
    }

    fn value(&self, field: MovieField) -> &str {
        match field {
            MovieField::Title => &self.title,
            MovieField::Genre => &self.genre,
            MovieField::ReleaseYear => &self.release_year,
            MovieField::Duration => &self.duration,
        }
    }

    /// Append a character to the active field. Numeric fields only accept
    /// up to four digits.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        let field = self.active;
        let value = self.value_mut(field);
        if field.is_numeric() {
            if ch.is_ascii_digit() && value.len() < 4 {
                value.push(ch);
                true
            } else {
                false
            }
        } else if !ch.is_control() {
            value.push(ch);
            true
        } else {
            false
        }
    }

    pub(crate) fn backspace(&mut self) {
        let field = self.active;
        self.value_mut(field).pop();
    }

    /// Turn the typed text into a request. Title/genre emptiness and numeric
    /// bounds are checked by the write path so the rules live in one place.
    pub(crate) fn parse_inputs(&self) -> Result<AddMovieRequest, DashboardError> {
        let release_year = parse_number(&self.release_year, MovieField::ReleaseYear)?;
        let duration = parse_number(&self.duration, MovieField::Duration)?;
        Ok(AddMovieRequest {
            title: self.title.clone(),
            genre: self.genre.clone(),
            release_year,
            duration,
        })
    }

    pub(crate) fn build_line(&self, field: MovieField) -> Line<'static> {
        field_line(
            field.label(),
            self.value(field),
            "<required>",
            self.active == field,
        )
    }

    /// Cursor column offset for the active field, relative to the form's
    /// inner area. The column never goes past the last cell of `width`.
    pub(crate) fn cursor_offset(&self, width: u16) -> (u16, u16) {
        let row = MovieField::ALL
            .iter()
            .position(|field| *field == self.active)
            .unwrap_or_default();
        let prefix = self.active.label().len() + 2;
        let col = prefix.saturating_add(self.value(self.active).chars().count());
        let last_col = usize::from(width.saturating_sub(1));
        (col.min(last_col) as u16, row as u16)
    }
}

fn parse_number(raw: &str, field: MovieField) -> Result<i64, DashboardError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DashboardError::validation("Please fill in all fields."));
    }
    trimmed
        .parse::<i64>()
        .map_err(|_| DashboardError::validation(format!("{} must be a number.", field.label())))
}

/// State of the watch+rating form. The user and movie lists are read when
/// the form opens, so they reflect rows added earlier in the session.
#[derive(Clone)]
pub(crate) struct WatchForm {
    pub(crate) users: Vec<User>,
    pub(crate) movies: Vec<Movie>,
    user_labels: Vec<String>,
    movie_labels: Vec<String>,
    pub(crate) user_idx: usize,
    pub(crate) movie_idx: usize,
    pub(crate) rating: i64,
    pub(crate) active: WatchField,
    pub(crate) error: Option<String>,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub(crate) enum WatchField {
    #[default]
    User,
    Movie,
    Rating,
}

impl WatchForm {
    pub(crate) fn new(users: Vec<User>, movies: Vec<Movie>) -> Self {
        let user_labels =
            disambiguated_labels(users.iter().map(|user| (user.id, user.name.as_str())));
        let movie_labels =
            disambiguated_labels(movies.iter().map(|movie| (movie.id, movie.title.as_str())));
        Self {
            users,
            movies,
            user_labels,
            movie_labels,
            user_idx: 0,
            movie_idx: 0,
            rating: MIN_RATING,
            active: WatchField::User,
            error: None,
        }
    }

    pub(crate) fn toggle_field(&mut self, forward: bool) {
        self.active = match (self.active, forward) {
            (WatchField::User, true) | (WatchField::Rating, false) => WatchField::Movie,
            (WatchField::Movie, true) | (WatchField::User, false) => WatchField::Rating,
            (WatchField::Rating, true) | (WatchField::Movie, false) => WatchField::User,
        };
    }

    /// Move the active picker (or the rating) by `delta`.
    pub(crate) fn step(&mut self, delta: isize) {
        match self.active {
            WatchField::User => {
                self.user_idx = cycle_index(self.user_idx, self.users.len(), delta);
            }
            WatchField::Movie => {
                self.movie_idx = cycle_index(self.movie_idx, self.movies.len(), delta);
            }
            WatchField::Rating => {
                self.rating = (self.rating + delta as i64).clamp(MIN_RATING, MAX_RATING);
            }
        }
    }

    /// Typing a digit on the rating field sets it directly.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if self.active != WatchField::Rating {
            return false;
        }
        match ch.to_digit(10).map(i64::from) {
            Some(value) if (MIN_RATING..=MAX_RATING).contains(&value) => {
                self.rating = value;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn to_request(&self) -> Result<WatchRatingRequest, DashboardError> {
        let user = self
            .users
            .get(self.user_idx)
            .ok_or_else(|| DashboardError::validation("No users available."))?;
        let movie = self
            .movies
            .get(self.movie_idx)
            .ok_or_else(|| DashboardError::validation("No movies available."))?;
        Ok(WatchRatingRequest {
            user_id: user.id,
            movie_id: movie.id,
            rating: self.rating,
        })
    }

    pub(crate) fn build_lines(&self) -> Vec<Line<'static>> {
        let user = self
            .user_labels
            .get(self.user_idx)
            .map(|label| format!("< {label} >"))
            .unwrap_or_default();
        let movie = self
            .movie_labels
            .get(self.movie_idx)
            .map(|label| format!("< {label} >"))
            .unwrap_or_default();
        let rating = format!("{}  {}", self.rating, "*".repeat(self.rating as usize));

        vec![
            field_line("User Name", &user, "<no users>", self.active == WatchField::User),
            field_line(
                "Movie Name",
                &movie,
                "<no movies>",
                self.active == WatchField::Movie,
            ),
            field_line(
                "Rating (1-5)",
                &rating,
                "",
                self.active == WatchField::Rating,
            ),
        ]
    }
}
