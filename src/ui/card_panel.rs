use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::review::Reviewer;
use crate::ui::theme::{phase_color, BORDER};

pub fn render(f: &mut Frame, area: Rect, reviewer: &Reviewer<'_>) {
    let session = &reviewer.session;
    let title = format!(
        " Progress: {}/{} cards ",
        (session.cursor() + 1).min(session.len()),
        session.len()
    );
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(BORDER))
        .title(Span::styled(
            title,
            Style::default().fg(phase_color(session.phase())),
        ));

    let Some(card) = session.current() else {
        f.render_widget(block, area);
        return;
    };

    let mut lines: Vec<Line> = vec![
        Line::raw(""),
        Line::from(Span::styled(
            card.name.as_str(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::raw(""),
    ];

    if let Some(desc) = card.description() {
        let truncated: String = desc.chars().take(600).collect();
        lines.push(Line::from(Span::styled(
            truncated,
            Style::default().fg(Color::Gray),
        )));
        lines.push(Line::raw(""));
    }

    if let Some(url) = &card.short_url {
        lines.push(Line::from(vec![
            Span::styled("URL: ", Style::default().fg(Color::Gray)),
            Span::styled(url.as_str(), Style::default().fg(Color::Blue)),
        ]));
    }

    let pending = session.pending().len();
    if pending > 0 {
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            format!("{pending} reviewed card(s) waiting to be deferred"),
            Style::default().fg(Color::DarkGray),
        )));
    }

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}
