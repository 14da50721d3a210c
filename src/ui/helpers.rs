use std::collections::HashMap;

use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

/// Labels for a picker. Names that appear more than once get their id
/// appended so the user can tell the rows apart.
pub(crate) fn disambiguated_labels<'a>(
    entries: impl Iterator<Item = (i64, &'a str)> + Clone,
) -> Vec<String> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for (_, name) in entries.clone() {
        *seen.entry(name).or_default() += 1;
    }

    entries
        .map(|(id, name)| {
            if seen.get(name).copied().unwrap_or_default() > 1 {
                format!("{name} (#{id})")
            } else {
                name.to_string()
            }
        })
        .collect()
}

/// Step an index through `len` entries, wrapping at both ends.
pub(crate) fn cycle_index(current: usize, len: usize, delta: isize) -> usize {
    if len == 0 {
        return 0;
    }
    let len = len as isize;
    ((current as isize + delta).rem_euclid(len)) as usize
}
