//! Collapse every card of one list into a single card on the consolidation list.

use anyhow::{bail, Result};

use crate::model::board::{find_list, TrelloList};
use crate::model::card::Card;
use crate::trello::{self, TrelloApi};

/// Spacing used when there are no two neighbouring lists to split between.
pub const POSITION_STEP: f64 = 65536.0;

pub const ORIGINAL_CARDS_CHECKLIST: &str = "Original Cards";

const SEPARATOR: &str = "\n\n---\n\n";

#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Name of the list the merged card lands in; created when missing.
    pub target_list: String,
    /// Archive the source list once everything else succeeded.
    pub archive_source: bool,
}

#[derive(Debug)]
pub struct MergeReport {
    pub target: TrelloList,
    pub card: Card,
    pub merged_cards: usize,
    pub copied_checklists: usize,
    pub archived_source: bool,
}

/// Position for a new list: between the second and third lists, or one step
/// after the last list when the board has fewer than three.
pub fn insertion_position(lists: &[TrelloList]) -> f64 {
    let mut positions: Vec<f64> = lists.iter().map(|l| l.pos).collect();
    positions.sort_by(f64::total_cmp);
    match positions.as_slice() {
        [_, second, third, ..] => (second + third) / 2.0,
        [.., last] => last + POSITION_STEP,
        [] => POSITION_STEP,
    }
}

/// One markdown section per card, joined by a horizontal rule.
pub fn merged_document(cards: &[Card]) -> String {
    cards
        .iter()
        .map(card_section)
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

fn card_section(card: &Card) -> String {
    let mut section = format!("### {}", card.name);
    if let Some(desc) = card.description() {
        section.push_str("\n\n");
        section.push_str(desc.trim_end());
    }
    if !card.attachments.is_empty() {
        section.push_str("\n\nAttachments:");
        for attachment in &card.attachments {
            let name = if attachment.name.is_empty() {
                &attachment.url
            } else {
                &attachment.name
            };
            section.push_str(&format!("\n- [{name}]({})", attachment.url));
        }
    }
    let comments: Vec<&str> = card.comments().collect();
    if !comments.is_empty() {
        section.push_str("\n\nComments:");
        for comment in comments {
            section.push_str(&format!("\n> {}", comment.replace('\n', "\n> ")));
        }
    }
    section
}

/// Merge the cards of `source` into one new card. Returns `None` when the
/// source list has no cards; nothing is created in that case.
pub async fn merge_list(
    api: &dyn TrelloApi,
    board_id: &str,
    source: &TrelloList,
    options: &MergeOptions,
) -> Result<Option<MergeReport>> {
    if source.name.eq_ignore_ascii_case(&options.target_list) {
        bail!(
            "List '{}' is the consolidation list itself; pick another list to merge",
            source.name
        );
    }

    let source_cards: Vec<Card> = api
        .list_board_cards(board_id)
        .await?
        .into_iter()
        .filter(|c| c.id_list == source.id)
        .collect();
    if source_cards.is_empty() {
        return Ok(None);
    }

    let mut detailed = Vec::with_capacity(source_cards.len());
    for card in &source_cards {
        detailed.push(api.get_card(&card.id).await?);
    }

    let lists = api.list_board_lists(board_id).await?;
    let target = match find_list(&lists, &options.target_list) {
        Some(list) => list.clone(),
        None => {
            let pos = insertion_position(&lists);
            tracing::info!(name = %options.target_list, pos, "creating consolidation list");
            api.create_list(board_id, &options.target_list, Some(pos))
                .await?
        }
    };

    let document = merged_document(&detailed);
    let card = trello::create_card(api, &target.id, &source.name, &document).await?;

    let originals = api
        .create_checklist(&card.id, ORIGINAL_CARDS_CHECKLIST)
        .await?;
    for source_card in &source_cards {
        api.add_checklist_item(&originals.id, &source_card.name)
            .await?;
    }

    let mut copied_checklists = 0;
    for source_card in &source_cards {
        for checklist in api.card_checklists(&source_card.id).await? {
            let copy = api
                .create_checklist(
                    &card.id,
                    &format!("{} - {}", source_card.name, checklist.name),
                )
                .await?;
            for item in &checklist.check_items {
                api.add_checklist_item(&copy.id, &item.name).await?;
            }
            copied_checklists += 1;
        }
    }

    if options.archive_source {
        api.delete_list(&source.id).await?;
    }

    Ok(Some(MergeReport {
        target,
        card,
        merged_cards: source_cards.len(),
        copied_checklists,
        archived_source: options.archive_source,
    }))
}
