pub mod client;
pub mod error;

#[cfg(test)]
pub mod fake;
#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::model::board::{Board, CheckItem, Checklist, TrelloList};
use crate::model::card::{Attachment, Card};

pub use client::TrelloClient;
pub use error::TrelloError;

/// Longest description Trello accepts on a card.
pub const DESCRIPTION_LIMIT: usize = 8000;

/// One call per operation against a Trello board. Every method is a live read
/// or write; dry runs are decided by callers, which skip mutating calls.
#[async_trait]
pub trait TrelloApi: Send + Sync {
    async fn list_boards(&self) -> Result<Vec<Board>>;
    async fn list_board_lists(&self, board_id: &str) -> Result<Vec<TrelloList>>;
    async fn list_board_cards(&self, board_id: &str) -> Result<Vec<Card>>;
    /// Fetch one card with its attachments and comments expanded.
    async fn get_card(&self, card_id: &str) -> Result<Card>;
    async fn card_checklists(&self, card_id: &str) -> Result<Vec<Checklist>>;
    async fn move_card(&self, card_id: &str, list_id: &str) -> Result<Card>;
    async fn delete_card(&self, card_id: &str) -> Result<()>;
    async fn create_list(&self, board_id: &str, name: &str, pos: Option<f64>)
        -> Result<TrelloList>;
    /// Lists cannot be removed on Trello, so this archives it.
    async fn delete_list(&self, list_id: &str) -> Result<()>;
    /// Plain card creation. Use [`create_card`] for descriptions that may be
    /// over [`DESCRIPTION_LIMIT`].
    async fn insert_card(&self, list_id: &str, name: &str, desc: &str) -> Result<Card>;
    async fn create_checklist(&self, card_id: &str, name: &str) -> Result<Checklist>;
    async fn add_checklist_item(&self, checklist_id: &str, name: &str) -> Result<CheckItem>;
    async fn update_card_description(&self, card_id: &str, desc: &str) -> Result<()>;
    async fn attach_file(&self, card_id: &str, file_name: &str, contents: Vec<u8>)
        -> Result<Attachment>;
}

/// Create a card, moving an oversized description into a markdown attachment.
pub async fn create_card(
    api: &dyn TrelloApi,
    list_id: &str,
    name: &str,
    desc: &str,
) -> Result<Card> {
    if desc.chars().count() <= DESCRIPTION_LIMIT {
        return api.insert_card(list_id, name, desc).await;
    }

    let file_name = attachment_file_name(name);
    tracing::debug!(card = name, file = %file_name, "description over limit, attaching");

    let mut card = api
        .insert_card(
            list_id,
            name,
            &format!("Description too long for a card, see attachment {file_name}."),
        )
        .await?;
    let attachment = api
        .attach_file(&card.id, &file_name, desc.as_bytes().to_vec())
        .await
        .with_context(|| format!("Failed to attach description to card '{name}'"))?;

    let pointer = format!("Full description: [{}]({})", attachment.name, attachment.url);
    api.update_card_description(&card.id, &pointer).await?;
    card.desc = pointer;
    card.attachments.push(attachment);
    Ok(card)
}

/// `<card name>.md` with path separators and control characters replaced.
pub fn attachment_file_name(card_name: &str) -> String {
    let stem: String = card_name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    if stem.is_empty() {
        "description.md".to_string()
    } else {
        format!("{stem}.md")
    }
}

pub async fn find_board(api: &dyn TrelloApi, name: &str) -> Result<Board> {
    let boards = api.list_boards().await.context("Failed to list Trello boards")?;
    boards
        .into_iter()
        .find(|b| b.name.eq_ignore_ascii_case(name))
        .with_context(|| format!("Could not find board named '{name}'"))
}
