//! Keypress-driven review of the inbox list.
//!
//! [`Session`] is the pure state machine: it owns the snapshot, the cursor and
//! the cards waiting to be deferred, and turns each [`ReviewKey`] into the
//! [`Command`]s to run. [`Reviewer`] runs those commands against Trello.

pub mod tui;

use anyhow::Result;

use crate::model::card::Card;
use crate::trello::TrelloApi;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewKey {
    /// space
    Cull,
    /// d
    Delete,
    /// u
    DeferReviewed,
    /// backspace
    Back,
    /// ctrl-c
    Quit,
    /// anything else
    Keep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Reviewing,
    /// Every card in the snapshot has been seen.
    Finished,
    Quit,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Cull(Card),
    Delete(Card),
    Defer(Vec<Card>),
}

#[derive(Debug)]
pub struct Session {
    cards: Vec<Card>,
    cursor: usize,
    pending: Vec<Card>,
    phase: Phase,
}

impl Session {
    pub fn new(cards: Vec<Card>) -> Self {
        let phase = if cards.is_empty() {
            Phase::Finished
        } else {
            Phase::Reviewing
        };
        Self {
            cards,
            cursor: 0,
            pending: Vec::new(),
            phase,
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn pending(&self) -> &[Card] {
        &self.pending
    }

    pub fn current(&self) -> Option<&Card> {
        match self.phase {
            Phase::Reviewing => self.cards.get(self.cursor),
            _ => None,
        }
    }

    /// Apply one keypress. Keys after the session ended are ignored.
    pub fn apply(&mut self, key: ReviewKey) -> Vec<Command> {
        let Some(card) = self.current().cloned() else {
            return Vec::new();
        };

        let mut commands = Vec::new();
        match key {
            ReviewKey::Cull => {
                self.pending.retain(|c| c.id != card.id);
                commands.push(Command::Cull(card));
                self.advance(&mut commands);
            }
            ReviewKey::Delete => {
                self.pending.retain(|c| c.id != card.id);
                commands.push(Command::Delete(card));
                self.advance(&mut commands);
            }
            ReviewKey::DeferReviewed => commands.extend(self.flush()),
            ReviewKey::Back => self.cursor = self.cursor.saturating_sub(1),
            ReviewKey::Keep => {
                if !self.pending.iter().any(|c| c.id == card.id) {
                    self.pending.push(card);
                }
                self.advance(&mut commands);
            }
            ReviewKey::Quit => {
                self.phase = Phase::Quit;
                commands.extend(self.flush());
            }
        }
        commands
    }

    /// End the session early, deferring whatever is pending.
    pub fn abort(&mut self) -> Vec<Command> {
        self.phase = Phase::Quit;
        self.flush().into_iter().collect()
    }

    fn advance(&mut self, commands: &mut Vec<Command>) {
        self.cursor += 1;
        if self.cursor >= self.cards.len() {
            self.phase = Phase::Finished;
            commands.extend(self.flush());
        }
    }

    fn flush(&mut self) -> Option<Command> {
        if self.pending.is_empty() {
            None
        } else {
            Some(Command::Defer(std::mem::take(&mut self.pending)))
        }
    }
}

/// Where culled and deferred cards go.
#[derive(Debug, Clone)]
pub struct ReviewLists {
    pub culled: String,
    pub deferred: String,
}

#[derive(Debug, Default)]
pub struct ReviewReport {
    pub culled: usize,
    pub deleted: usize,
    pub deferred: usize,
    /// Cards that could not be deferred, with the reason.
    pub defer_failures: Vec<(Card, String)>,
}

impl ReviewReport {
    pub fn render(&self) -> String {
        let mut out = format!(
            "Culled: {}  Deleted: {}  Deferred: {}\n",
            self.culled, self.deleted, self.deferred
        );
        if !self.defer_failures.is_empty() {
            out.push_str("\nCould not defer:\n");
            for (card, reason) in &self.defer_failures {
                out.push_str(&format!("  - {} ({reason})\n", card.name));
            }
        }
        out
    }
}

pub struct Reviewer<'a> {
    trello: &'a dyn TrelloApi,
    lists: ReviewLists,
    pub session: Session,
    pub report: ReviewReport,
    pub flash: Option<String>,
}

impl<'a> Reviewer<'a> {
    pub fn new(trello: &'a dyn TrelloApi, lists: ReviewLists, cards: Vec<Card>) -> Self {
        Self {
            trello,
            lists,
            session: Session::new(cards),
            report: ReviewReport::default(),
            flash: None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.session.phase() != Phase::Reviewing
    }

    /// Handle one keypress. A failed cull or delete ends the session: pending
    /// cards are deferred first, then the error is returned.
    pub async fn handle(&mut self, key: ReviewKey) -> Result<()> {
        self.flash = None;
        let mut commands = self.session.apply(key).into_iter();
        while let Some(command) = commands.next() {
            if let Err(e) = self.execute(command).await {
                let deferrals: Vec<Command> = commands.chain(self.session.abort()).collect();
                for command in deferrals {
                    if let Command::Defer(cards) = command {
                        self.defer(cards).await;
                    }
                }
                return Err(e);
            }
        }
        Ok(())
    }

    /// Move each card to the deferred list. Failures are recorded per card.
    async fn defer(&mut self, cards: Vec<Card>) {
        let total = cards.len();
        let mut moved = 0;
        for card in cards {
            match self.trello.move_card(&card.id, &self.lists.deferred).await {
                Ok(_) => moved += 1,
                Err(e) => {
                    tracing::debug!(card = %card.name, error = %e, "deferral failed");
                    self.report.defer_failures.push((card, format!("{e:#}")));
                }
            }
        }
        self.report.deferred += moved;
        self.flash = Some(format!("Deferred {moved}/{total} reviewed cards"));
    }

    async fn execute(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Cull(card) => {
                self.trello.move_card(&card.id, &self.lists.culled).await?;
                self.report.culled += 1;
                self.flash = Some(format!("Moved '{}' to culled list", card.name));
            }
            Command::Delete(card) => {
                self.trello.delete_card(&card.id).await?;
                self.report.deleted += 1;
                self.flash = Some(format!("Deleted '{}'", card.name));
            }
            Command::Defer(cards) => self.defer(cards).await,
        }
        Ok(())
    }
}
