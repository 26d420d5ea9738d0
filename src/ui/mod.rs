pub mod card_panel;
pub mod footer;
pub mod theme;

use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};

use crate::review::Reviewer;

pub fn render(f: &mut Frame, reviewer: &Reviewer<'_>) {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(6),    // card
            Constraint::Length(1), // footer
        ])
        .split(f.area());

    card_panel::render(f, vertical[0], reviewer);
    footer::render(f, vertical[1], reviewer);
}
