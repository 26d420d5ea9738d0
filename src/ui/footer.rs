use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::review::Reviewer;

pub fn render(f: &mut Frame, area: Rect, reviewer: &Reviewer<'_>) {
    let mut spans = vec![
        hint("space", "cull"),
        hint("d", "delete"),
        hint("u", "defer reviewed"),
        hint("⌫", "back"),
        hint("any", "keep"),
        hint("ctrl-c", "quit"),
    ];

    if let Some(msg) = &reviewer.flash {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(msg.as_str(), Style::default().fg(Color::Yellow)));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn hint(key: &str, desc: &str) -> Span<'static> {
    Span::styled(
        format!(" {key}:{desc} "),
        Style::default().fg(Color::DarkGray),
    )
}
