//! Model-assisted sorting of deferred cards.
//!
//! Each card is classified by the completion model and, unless this is a dry
//! run, moved to the list matching its label. Cards are processed through a
//! fixed number of concurrent slots; results arrive in completion order and
//! every card yields exactly one [`TriageResult`].

pub mod prompt;

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};

use crate::llm::Completion;
use crate::model::card::Card;
use crate::trello::TrelloApi;
use prompt::{note_text, Priorities, PromptTemplate};

pub const DEFAULT_MAX_WORKERS: usize = 10;
pub const DEFAULT_MOVE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Decision {
    Inbox,
    Archive,
    Uncertain,
}

impl Decision {
    /// `None` for replies outside the closed label set.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "INBOX" => Some(Decision::Inbox),
            "ARCHIVE" => Some(Decision::Archive),
            "UNCERTAIN" => Some(Decision::Uncertain),
            _ => None,
        }
    }

    /// Anything outside the closed label set is treated as `UNCERTAIN`.
    pub fn from_label(raw: &str) -> Self {
        Self::parse(raw).unwrap_or(Decision::Uncertain)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Inbox => "INBOX",
            Decision::Archive => "ARCHIVE",
            Decision::Uncertain => "UNCERTAIN",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// List ids each label sends a card to.
#[derive(Debug, Clone)]
pub struct Destinations {
    pub inbox: String,
    pub archive: String,
    pub uncertain: String,
}

impl Destinations {
    pub fn list_for(&self, decision: Decision) -> &str {
        match decision {
            Decision::Inbox => &self.inbox,
            Decision::Archive => &self.archive,
            Decision::Uncertain => &self.uncertain,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TriageOptions {
    pub dry_run: bool,
    pub max_workers: usize,
    pub move_timeout: Duration,
}

impl Default for TriageOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            max_workers: DEFAULT_MAX_WORKERS,
            move_timeout: DEFAULT_MOVE_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TriageResult {
    pub card: Card,
    pub decision: Decision,
    pub moved: bool,
    /// The reply was outside the label set; the card stays where it is.
    pub unsorted: bool,
    pub error: Option<String>,
}

pub struct Triage<'a> {
    pub trello: &'a dyn TrelloApi,
    pub model: &'a dyn Completion,
    pub template: &'a PromptTemplate,
    pub priorities: &'a Priorities,
    pub destinations: &'a Destinations,
    pub options: TriageOptions,
}

impl Triage<'_> {
    /// Classify one card and move it. Never fails: errors are recorded on the
    /// result. A failed model call or an unrecognised label leaves the card
    /// where it is.
    pub async fn process_card(&self, card: Card) -> TriageResult {
        let prompt = self.template.render(self.priorities, &note_text(&card));

        let reply = match self.model.complete(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::debug!(card = %card.name, error = %e, "model call failed");
                return TriageResult {
                    card,
                    decision: Decision::Uncertain,
                    moved: false,
                    unsorted: false,
                    error: Some(format!("{e:#}")),
                };
            }
        };

        let Some(decision) = Decision::parse(&reply) else {
            tracing::debug!(card = %card.name, "unrecognised label, leaving card in place");
            return TriageResult {
                card,
                decision: Decision::Uncertain,
                moved: false,
                unsorted: true,
                error: Some(format!("unrecognised label '{}'", reply.trim())),
            };
        };

        if self.options.dry_run {
            return TriageResult {
                card,
                decision,
                moved: false,
                unsorted: false,
                error: None,
            };
        }

        let list_id = self.destinations.list_for(decision);
        let outcome = tokio::time::timeout(
            self.options.move_timeout,
            self.trello.move_card(&card.id, list_id),
        )
        .await;

        let error = match outcome {
            Ok(Ok(_)) => None,
            Ok(Err(e)) => Some(format!("{e:#}")),
            Err(_) => Some(format!(
                "move timed out after {}s",
                self.options.move_timeout.as_secs_f64()
            )),
        };
        if let Some(e) = &error {
            tracing::debug!(card = %card.name, error = %e, "move failed");
        }

        TriageResult {
            card,
            moved: error.is_none(),
            decision,
            unsorted: false,
            error,
        }
    }

    /// Process every card, at most `max_workers` at a time, and wait for all
    /// of them. The progress bar advances as each card finishes.
    pub async fn run(&self, cards: Vec<Card>, progress: &ProgressBar) -> TriageSummary {
        let width = self.options.max_workers.max(1);

        let mut pending = stream::iter(cards)
            .map(|card| self.process_card(card))
            .buffer_unordered(width);

        let mut results = Vec::new();
        while let Some(result) = pending.next().await {
            if self.options.dry_run {
                progress.println(format!(
                    "Card: {}... -> {}",
                    truncate(&result.card.name, 50),
                    result.decision
                ));
            }
            progress.inc(1);
            results.push(result);
        }
        progress.finish_and_clear();

        TriageSummary {
            dry_run: self.options.dry_run,
            results,
        }
    }
}

pub fn progress_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    if let Ok(style) =
        ProgressStyle::default_bar().template("Processing cards [{bar:40}] {pos}/{len} {elapsed}")
    {
        pb.set_style(style.progress_chars("=> "));
    }
    pb
}

#[derive(Debug)]
pub struct TriageSummary {
    pub dry_run: bool,
    pub results: Vec<TriageResult>,
}

impl TriageSummary {
    pub fn decision_counts(&self) -> BTreeMap<Decision, usize> {
        let mut counts = BTreeMap::new();
        for result in &self.results {
            *counts.entry(result.decision).or_insert(0) += 1;
        }
        counts
    }

    pub fn moved_count(&self) -> usize {
        self.results.iter().filter(|r| r.moved).count()
    }

    /// Cards whose move was attempted or needed and did not happen.
    pub fn failed(&self) -> impl Iterator<Item = &TriageResult> {
        self.results.iter().filter(|r| !r.moved && !r.unsorted)
    }

    pub fn unsorted(&self) -> impl Iterator<Item = &TriageResult> {
        self.results.iter().filter(|r| r.unsorted)
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        if self.dry_run {
            out.push_str("Dry run complete. Summary:\n");
            for (decision, count) in self.decision_counts() {
                out.push_str(&format!("  {decision}: {count} cards\n"));
            }
            return out;
        }

        let moved = self.moved_count();
        let unsorted = self.unsorted().count();
        let failed = self.results.len() - moved - unsorted;
        out.push_str("Processing complete!\n");
        out.push_str(&format!("  Successfully moved: {moved} cards\n"));
        out.push_str(&format!(
            "  Failed/timed out: {failed} cards (left in deferred list)\n"
        ));
        if unsorted > 0 {
            out.push_str(&format!(
                "  Left unsorted: {unsorted} cards (unrecognised label)\n"
            ));
        }
        if failed > 0 {
            out.push_str("\nFailed cards:\n");
            for result in self.failed() {
                let reason = result.error.as_deref().unwrap_or("timeout/error");
                out.push_str(&format!(
                    "  - {}... ({reason})\n",
                    truncate(&result.card.name, 50)
                ));
            }
        }
        if unsorted > 0 {
            out.push_str("\nUnsorted cards:\n");
            for result in self.unsorted() {
                let reason = result.error.as_deref().unwrap_or("unrecognised label");
                out.push_str(&format!(
                    "  - {}... ({reason})\n",
                    truncate(&result.card.name, 50)
                ));
            }
        }
        out
    }
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
