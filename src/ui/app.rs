use std::mem;

use crossterm::event::KeyCode;
use log::{error, warn};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

use crate::db::{
    add_movie, fetch_movies, fetch_users, movies_released_since, record_watch_rating, run_report,
    Database, MovieListOutcome, ReportKind, ReportOutcome,
};
use crate::error::DashboardError;
use crate::models::MovieFilter;

use super::forms::{MovieField, MovieForm, WatchForm};
use super::helpers::{centered_rect, surface_error};
use super::render::{render_listings, render_message, render_result};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
const SIDEBAR_WIDTH: u16 = 38;
const FILTER_HEIGHT: u16 = 4;

/// Modal state layered over the dashboard.
enum Mode {
    Normal,
    AddingMovie(MovieForm),
    RecordingWatch(WatchForm),
}

/// What the last evaluation of a query produced. Read failures are kept and
/// drawn in place of the chart rather than ending the session.
enum View<T> {
    Ready(T),
    Failed(String),
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state. Apart from the current selections nothing is
/// cached between interactions: every action re-runs the visible queries.
pub struct App {
    db: Database,
    report: ReportKind,
    report_view: View<ReportOutcome>,
    filter: MovieFilter,
    movies_view: View<MovieListOutcome>,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    pub fn new(db: Database, filter: MovieFilter) -> Self {
        let mut app = Self {
            db,
            report: ReportKind::TopRatedMovies,
            report_view: View::Ready(ReportOutcome::NoData),
            filter,
            movies_view: View::Ready(MovieListOutcome::NoneFound),
            mode: Mode::Normal,
            status: None,
        };
        app.refresh();
        app
    }

    pub fn report(&self) -> ReportKind {
        self.report
    }

    pub fn filter(&self) -> MovieFilter {
        self.filter
    }

    /// Re-run the selected report and the release-year list.
    pub fn refresh(&mut self) {
        self.report_view = match run_report(&self.db, self.report) {
            Ok(outcome) => View::Ready(outcome),
            Err(err) => {
                error!("report failed: {err:#}");
                View::Failed(surface_error(&err))
            }
        };

        self.movies_view = match movies_released_since(&self.db, self.filter.min_year) {
            Ok(outcome) => View::Ready(outcome),
            Err(err) => {
                error!("movie filter failed: {err:#}");
                View::Failed(surface_error(&err))
            }
        };
    }

    /// Apply one key press. Returns `true` when the user asked to quit.
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit),
            Mode::AddingMovie(form) => self.handle_add_movie(code, form),
            Mode::RecordingWatch(form) => self.handle_record_watch(code, form),
        };

        exit
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Mode {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                *exit = true;
            }
            KeyCode::Up => self.select_report(self.report.previous()),
            KeyCode::Down => self.select_report(self.report.next()),
            KeyCode::Char(digit @ '1'..='4') => {
                let idx = digit as usize - '1' as usize;
                self.select_report(ReportKind::ALL[idx]);
            }
            KeyCode::Char('[') => self.shift_filter(-1),
            KeyCode::Char(']') => self.shift_filter(1),
            KeyCode::Char('{') => self.shift_filter(-10),
            KeyCode::Char('}') => self.shift_filter(10),
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.refresh();
                self.set_status("Refreshed.", StatusKind::Info);
            }
            KeyCode::Char('a') | KeyCode::Char('A') => {
                self.clear_status();
                return Mode::AddingMovie(MovieForm::default());
            }
            KeyCode::Char('w') | KeyCode::Char('W') => {
                self.clear_status();
                return self.open_watch_form();
            }
            _ => {}
        }
        Mode::Normal
    }

    fn select_report(&mut self, kind: ReportKind) {
        self.report = kind;
        self.clear_status();
        self.refresh();
    }

    fn shift_filter(&mut self, delta: i64) {
        self.filter.shift(delta);
        self.clear_status();
        self.refresh();
    }

    /// Read users and movies right before showing the form so the pickers
    /// include rows added since the dashboard started.
    fn open_watch_form(&mut self) -> Mode {
        let snapshot = fetch_users(&self.db).and_then(|users| Ok((users, fetch_movies(&self.db)?)));
        match snapshot {
            Ok((users, movies)) => Mode::RecordingWatch(WatchForm::new(users, movies)),
            Err(err) => {
                error!("failed to load users and movies: {err:#}");
                self.set_status(surface_error(&err), StatusKind::Error);
                Mode::Normal
            }
        }
    }

    fn handle_add_movie(&mut self, code: KeyCode, mut form: MovieForm) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Add movie cancelled.", StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Tab | KeyCode::Down => form.toggle_field(true),
            KeyCode::BackTab | KeyCode::Up => form.toggle_field(false),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => {
                let result = form
                    .parse_inputs()
                    .and_then(|request| add_movie(&self.db, &request));
                match result {
                    Ok(movie) => {
                        self.refresh();
                        self.set_status(
                            format!("Movie Added Successfully! ({})", movie.title),
                            StatusKind::Info,
                        );
                        return Mode::Normal;
                    }
                    Err(err) => {
                        self.report_failure(&err, &mut form.error, None);
                    }
                }
            }
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Mode::AddingMovie(form)
    }

    fn handle_record_watch(&mut self, code: KeyCode, mut form: WatchForm) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Transaction cancelled.", StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Tab | KeyCode::Down => form.toggle_field(true),
            KeyCode::BackTab | KeyCode::Up => form.toggle_field(false),
            KeyCode::Left => form.step(-1),
            KeyCode::Right => form.step(1),
            KeyCode::Enter => {
                let result = form
                    .to_request()
                    .and_then(|request| record_watch_rating(&self.db, &request));
                match result {
                    Ok(_) => {
                        self.refresh();
                        self.set_status("Transaction completed successfully!", StatusKind::Info);
                        return Mode::Normal;
                    }
                    Err(err) => {
                        self.report_failure(&err, &mut form.error, Some("Transaction failed"));
                    }
                }
            }
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Mode::RecordingWatch(form)
    }

    /// Show a write failure in the form and the footer.
    fn report_failure(
        &mut self,
        err: &DashboardError,
        form_error: &mut Option<String>,
        prefix: Option<&str>,
    ) {
        if !err.is_validation() {
            warn!("write failed: {err}");
        }
        let message = match prefix {
            Some(prefix) => format!("{prefix}: {err}"),
            None => err.to_string(),
        };
        *form_error = Some(message.clone());
        self.set_status(message, StatusKind::Error);
    }

    fn set_status(&mut self, text: impl Into<String>, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    /// Current footer text, if any.
    pub fn status_text(&self) -> Option<&str> {
        self.status.as_ref().map(|status| status.text.as_str())
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
            .split(content_area);

        self.draw_sidebar(frame, columns[0]);
        self.draw_main(frame, columns[1]);

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::AddingMovie(form) => self.draw_movie_form(frame, area, form),
            Mode::RecordingWatch(form) => self.draw_watch_form(frame, area, form),
            Mode::Normal => {}
        }
    }

    fn draw_sidebar(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(FILTER_HEIGHT)])
            .split(area);

        let items: Vec<ListItem> = ReportKind::ALL
            .iter()
            .enumerate()
            .map(|(idx, kind)| ListItem::new(format!("{}. {}", idx + 1, kind.title())))
            .collect();
        let list = List::new(items)
            .block(
                Block::default()
                    .title("Choose Analytics")
                    .borders(Borders::ALL),
            )
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");
        let mut state = ListState::default();
        state.select(Some(self.report.index()));
        frame.render_stateful_widget(list, chunks[0], &mut state);

        let filter = Paragraph::new(vec![
            Line::from(vec![
                Span::raw("Movies after year: "),
                Span::styled(
                    self.filter.min_year.to_string(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::styled("[ ] +/-1   { } +/-10", Style::default().fg(Color::DarkGray)),
        ])
        .block(Block::default().title("Filter").borders(Borders::ALL));
        frame.render_widget(filter, chunks[1]);
    }

    fn draw_main(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(area);

        let title = self.report.title();
        match &self.report_view {
            View::Ready(ReportOutcome::Table(table)) => render_result(frame, chunks[0], title, table),
            View::Ready(ReportOutcome::NoData) => render_message(
                frame,
                chunks[0],
                title,
                "No data available to display.",
                Style::default().fg(Color::DarkGray),
            ),
            View::Failed(message) => render_message(
                frame,
                chunks[0],
                title,
                message,
                Style::default().fg(Color::Red),
            ),
        }

        let movies_title = format!("Movies Released After {}", self.filter.min_year);
        match &self.movies_view {
            View::Ready(MovieListOutcome::NoneFound) => render_message(
                frame,
                chunks[1],
                &movies_title,
                "No movies found for the selected year.",
                Style::default().fg(Color::DarkGray),
            ),
            View::Ready(MovieListOutcome::Movies(movies)) => {
                render_listings(frame, chunks[1], &movies_title, movies)
            }
            View::Failed(message) => render_message(
                frame,
                chunks[1],
                &movies_title,
                message,
                Style::default().fg(Color::Red),
            ),
        }
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        match &self.mode {
            Mode::AddingMovie(_) => Line::from(vec![
                Span::styled("[Tab]", key_style),
                Span::raw(" Next Field   "),
                Span::styled("[Enter]", key_style),
                Span::raw(" Add Movie   "),
                Span::styled("[Esc]", key_style),
                Span::raw(" Cancel"),
            ]),
            Mode::RecordingWatch(_) => Line::from(vec![
                Span::styled("[Tab]", key_style),
                Span::raw(" Next Field   "),
                Span::styled("[←→]", key_style),
                Span::raw(" Change   "),
                Span::styled("[Enter]", key_style),
                Span::raw(" Execute Transaction   "),
                Span::styled("[Esc]", key_style),
                Span::raw(" Cancel"),
            ]),
            Mode::Normal => Line::from(vec![
                Span::styled("[↑↓/1-4]", key_style),
                Span::raw(" Report   "),
                Span::styled("[[ ] { }]", key_style),
                Span::raw(" Year   "),
                Span::styled("[a]", key_style),
                Span::raw(" Add Movie   "),
                Span::styled("[w]", key_style),
                Span::raw(" Watch + Rate   "),
                Span::styled("[r]", key_style),
                Span::raw(" Refresh   "),
                Span::styled("[q]", key_style),
                Span::raw(" Quit"),
            ]),
        }
    }

    fn draw_movie_form(&self, frame: &mut Frame, area: Rect, form: &MovieForm) {
        let popup_area = centered_rect(60, 40, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Add New Movie").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines: Vec<Line> = MovieField::ALL
            .iter()
            .map(|field| form.build_line(*field))
            .collect();
        lines.push(Line::from(""));
        lines.push(form_hint(form.error.as_deref(), "Enter to add • Tab to switch • Esc to cancel"));

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let (col, row) = form.cursor_offset(inner.width);
        frame.set_cursor_position((inner.x.saturating_add(col), inner.y.saturating_add(row)));
    }

    fn draw_watch_form(&self, frame: &mut Frame, area: Rect, form: &WatchForm) {
        let popup_area = centered_rect(70, 40, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Simulate Watch + Rating Transaction")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = form.build_lines();
        lines.push(Line::from(""));
        lines.push(form_hint(
            form.error.as_deref(),
            "Enter to execute • ←→ to change • Tab to switch • Esc to cancel",
        ));

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }
}

fn form_hint(error: Option<&str>, hint: &str) -> Line<'static> {
    match error {
        Some(error) => Line::from(Span::styled(
            error.to_string(),
            Style::default().fg(Color::Red),
        )),
        None => Line::from(Span::styled(
            hint.to_string(),
            Style::default().fg(Color::Gray),
        )),
    }
}
