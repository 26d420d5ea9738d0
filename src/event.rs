use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use tokio::sync::mpsc;

use crate::review::ReviewKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermEvent {
    Key(ReviewKey),
    Resize,
}

pub async fn run_event_loop(tx: mpsc::UnboundedSender<TermEvent>) {
    let mut reader = EventStream::new();

    while let Some(event) = reader.next().await {
        let forwarded = match event {
            Ok(Event::Key(key)) => key_to_review(key).map(TermEvent::Key),
            Ok(Event::Resize(_, _)) => Some(TermEvent::Resize),
            Ok(_) => None,
            Err(_) => break,
        };
        if let Some(event) = forwarded {
            if tx.send(event).is_err() {
                break;
            }
        }
    }
}

pub fn key_to_review(key: KeyEvent) -> Option<ReviewKey> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    // Ctrl+C always quits
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(ReviewKey::Quit);
    }

    match key.code {
        KeyCode::Char(' ') => Some(ReviewKey::Cull),
        KeyCode::Char('d') | KeyCode::Char('D') => Some(ReviewKey::Delete),
        KeyCode::Char('u') | KeyCode::Char('U') => Some(ReviewKey::DeferReviewed),
        KeyCode::Backspace => Some(ReviewKey::Back),
        KeyCode::Modifier(_) | KeyCode::CapsLock | KeyCode::NumLock | KeyCode::ScrollLock => None,
        _ => Some(ReviewKey::Keep),
    }
}
