//! Turns query results into widgets: a bar chart when a result has a numeric
//! column to plot, a plain table otherwise, and a message when it is empty.

use ratatui::layout::{Alignment, Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph, Row, Table, Wrap};
use ratatui::Frame;

use crate::db::QueryTable;
use crate::models::MovieListing;

/// Bars carry integer heights, so fractional values are plotted in
/// hundredths and labelled with their real value.
const BAR_SCALE: f64 = 100.0;
const BAR_GAP: u16 = 1;
const MIN_BAR_WIDTH: u16 = 3;
const MAX_BAR_WIDTH: u16 = 16;

pub(crate) fn scaled_bar_value(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        (value * BAR_SCALE).round() as u64
    } else {
        0
    }
}

pub(crate) fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

/// Widest bar that still fits `count` bars side by side.
pub(crate) fn bar_width(area_width: u16, count: usize) -> u16 {
    if count == 0 {
        return MIN_BAR_WIDTH;
    }
    let count = count as u16;
    let available = area_width.saturating_sub(BAR_GAP.saturating_mul(count));
    (available / count).clamp(MIN_BAR_WIDTH, MAX_BAR_WIDTH)
}

pub(crate) fn render_message(frame: &mut Frame, area: Rect, title: &str, message: &str, style: Style) {
    let block = Block::default().title(title.to_string()).borders(Borders::ALL);
    let paragraph = Paragraph::new(Line::styled(message.to_string(), style))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(block);
    frame.render_widget(paragraph, area);
}

/// Draw `table` as a chart when it has a label column and a numeric column,
/// otherwise as a table.
pub(crate) fn render_result(frame: &mut Frame, area: Rect, title: &str, table: &QueryTable) {
    match table.numeric_series() {
        Some(series) => render_bar_chart(frame, area, title, &series),
        None => render_table(frame, area, title, table),
    }
}

pub(crate) fn render_bar_chart(frame: &mut Frame, area: Rect, title: &str, series: &[(String, f64)]) {
    let block = Block::default().title(title.to_string()).borders(Borders::ALL);
    let inner_width = block.inner(area).width;

    let bars: Vec<Bar> = series
        .iter()
        .map(|(label, value)| {
            Bar::default()
                .label(Line::from(label.clone()))
                .value(scaled_bar_value(*value))
                .text_value(format_value(*value))
        })
        .collect();

    let chart = BarChart::default()
        .block(block)
        .data(BarGroup::default().bars(&bars))
        .bar_width(bar_width(inner_width, bars.len()))
        .bar_gap(BAR_GAP)
        .bar_style(Style::default().fg(Color::Cyan))
        .value_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_widget(chart, area);
}

pub(crate) fn render_table(frame: &mut Frame, area: Rect, title: &str, table: &QueryTable) {
    let header = Row::new(table.columns.clone()).style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );

    let rows = table
        .rows
        .iter()
        .map(|row| Row::new(row.iter().map(|cell| cell.display()).collect::<Vec<_>>()));

    let column_count = table.columns.len().max(1) as u32;
    let widths = vec![Constraint::Ratio(1, column_count); column_count as usize];

    let widget = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(format!("{title} ({} rows)", table.len()))
                .borders(Borders::ALL),
        );
    frame.render_widget(widget, area);
}

/// Two-column title/genre table for the release-year filter.
pub(crate) fn render_listings(frame: &mut Frame, area: Rect, title: &str, movies: &[MovieListing]) {
    let header = Row::new(vec!["Title", "Genre"]).style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );
    let rows = movies
        .iter()
        .map(|movie| Row::new(vec![movie.title.clone(), movie.genre.clone()]));

    let widget = Table::new(rows, [Constraint::Percentage(60), Constraint::Percentage(40)])
        .header(header)
        .block(
            Block::default()
                .title(format!("{title} ({} movies)", movies.len()))
                .borders(Borders::ALL),
        );
    frame.render_widget(widget, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn averages_are_scaled_to_hundredths() {
        assert_eq!(scaled_bar_value(4.67), 467);
        assert_eq!(scaled_bar_value(3.0), 300);
        assert_eq!(scaled_bar_value(-1.0), 0);
        assert_eq!(scaled_bar_value(f64::NAN), 0);
    }

    #[test]
    fn whole_numbers_drop_decimals() {
        assert_eq!(format_value(3.0), "3");
        assert_eq!(format_value(4.5), "4.50");
    }

    #[test]
    fn bar_width_is_bounded() {
        assert_eq!(bar_width(100, 5), 16);
        assert_eq!(bar_width(30, 5), 5);
        assert_eq!(bar_width(4, 5), MIN_BAR_WIDTH);
        assert_eq!(bar_width(40, 0), MIN_BAR_WIDTH);
    }
}
