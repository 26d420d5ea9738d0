use std::io;
use std::panic;

use anyhow::Result;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;

use super::Reviewer;
use crate::event::{self, TermEvent};
use crate::ui;

/// Drive the reviewer from the terminal until the snapshot is exhausted or
/// the user quits. The terminal is restored on every exit path.
pub async fn run(reviewer: &mut Reviewer<'_>) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.hide_cursor()?;

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let (tx, mut rx) = mpsc::unbounded_channel::<TermEvent>();
    let reader = tokio::spawn(async move {
        event::run_event_loop(tx).await;
    });

    let outcome = review_loop(&mut terminal, reviewer, &mut rx).await;
    reader.abort();

    terminal.show_cursor()?;
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    outcome
}

async fn review_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    reviewer: &mut Reviewer<'_>,
    rx: &mut mpsc::UnboundedReceiver<TermEvent>,
) -> Result<()> {
    while !reviewer.is_done() {
        terminal.draw(|f| ui::render(f, reviewer))?;

        match rx.recv().await {
            Some(TermEvent::Key(key)) => reviewer.handle(key).await?,
            Some(TermEvent::Resize) => {}
            None => {
                // input closed; take the safe exit
                reviewer.handle(super::ReviewKey::Quit).await?;
            }
        }
    }
    Ok(())
}
