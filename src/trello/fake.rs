//! In-memory board used by tests in place of the HTTP client.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;

use super::TrelloApi;
use crate::model::board::{Board, CheckItem, Checklist, TrelloList};
use crate::model::card::{Attachment, Card};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    MoveCard { card: String, list: String },
    DeleteCard(String),
    CreateList { name: String, pos: Option<f64> },
    ArchiveList(String),
    InsertCard { list: String, name: String },
    CreateChecklist { card: String, name: String },
    AddChecklistItem { checklist: String, name: String },
    UpdateDescription(String),
    AttachFile { card: String, file: String },
}

#[derive(Default)]
struct State {
    next_id: u64,
    boards: Vec<Board>,
    lists: Vec<TrelloList>,
    cards: Vec<Card>,
    checklists: Vec<Checklist>,
    attachments: HashMap<(String, String), Vec<u8>>,
    calls: Vec<Call>,
    failing_moves: HashSet<String>,
    failing_deletes: HashSet<String>,
    move_delay: Option<Duration>,
}

impl State {
    fn id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{}", self.next_id)
    }
}

#[derive(Default)]
pub struct FakeTrello {
    state: Mutex<State>,
}

impl FakeTrello {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_board(&self, name: &str) -> String {
        let mut s = self.state.lock().unwrap();
        let id = s.id("board");
        s.boards.push(Board {
            id: id.clone(),
            name: name.into(),
        });
        id
    }

    pub fn add_list(&self, board_id: &str, name: &str, pos: f64) -> String {
        let mut s = self.state.lock().unwrap();
        let id = s.id("list");
        s.lists.push(TrelloList {
            id: id.clone(),
            name: name.into(),
            id_board: Some(board_id.into()),
            pos,
            closed: false,
        });
        id
    }

    pub fn add_card(&self, list_id: &str, name: &str, desc: &str) -> String {
        let mut s = self.state.lock().unwrap();
        let id = s.id("card");
        let id_board = s
            .lists
            .iter()
            .find(|l| l.id == list_id)
            .and_then(|l| l.id_board.clone());
        s.cards.push(Card {
            id: id.clone(),
            name: name.into(),
            desc: desc.into(),
            id_list: list_id.into(),
            id_board,
            short_url: None,
            attachments: Vec::new(),
            actions: Vec::new(),
        });
        id
    }

    pub fn add_attachment(&self, card_id: &str, name: &str, url: &str) {
        let mut s = self.state.lock().unwrap();
        let id = s.id("att");
        if let Some(card) = s.cards.iter_mut().find(|c| c.id == card_id) {
            card.attachments.push(Attachment {
                id,
                name: name.into(),
                url: url.into(),
            });
        }
    }

    pub fn add_checklist(&self, card_id: &str, name: &str, items: &[&str]) {
        let mut s = self.state.lock().unwrap();
        let id = s.id("checklist");
        let mut check_items = Vec::new();
        for (i, item) in items.iter().enumerate() {
            let item_id = s.id("item");
            check_items.push(CheckItem {
                id: item_id,
                name: item.to_string(),
                id_checklist: Some(id.clone()),
                pos: i as f64,
            });
        }
        s.checklists.push(Checklist {
            id,
            name: name.into(),
            id_card: Some(card_id.into()),
            check_items,
        });
    }

    pub fn fail_moves_of(&self, card_id: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_moves
            .insert(card_id.into());
    }

    pub fn fail_deletes_of(&self, card_id: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_deletes
            .insert(card_id.into());
    }

    pub fn delay_moves(&self, delay: Duration) {
        self.state.lock().unwrap().move_delay = Some(delay);
    }

    pub fn mutations(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn card(&self, card_id: &str) -> Option<Card> {
        let s = self.state.lock().unwrap();
        s.cards.iter().find(|c| c.id == card_id).cloned()
    }

    pub fn cards_in(&self, list_id: &str) -> Vec<Card> {
        let s = self.state.lock().unwrap();
        s.cards
            .iter()
            .filter(|c| c.id_list == list_id)
            .cloned()
            .collect()
    }

    pub fn list(&self, list_id: &str) -> Option<TrelloList> {
        let s = self.state.lock().unwrap();
        s.lists.iter().find(|l| l.id == list_id).cloned()
    }

    pub fn checklists_of(&self, card_id: &str) -> Vec<Checklist> {
        let s = self.state.lock().unwrap();
        s.checklists
            .iter()
            .filter(|c| c.id_card.as_deref() == Some(card_id))
            .cloned()
            .collect()
    }

    pub fn attachment_body(&self, card_id: &str, file: &str) -> Option<String> {
        let s = self.state.lock().unwrap();
        s.attachments
            .get(&(card_id.to_string(), file.to_string()))
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }
}

#[async_trait]
impl TrelloApi for FakeTrello {
    async fn list_boards(&self) -> Result<Vec<Board>> {
        Ok(self.state.lock().unwrap().boards.clone())
    }

    async fn list_board_lists(&self, board_id: &str) -> Result<Vec<TrelloList>> {
        let s = self.state.lock().unwrap();
        Ok(s.lists
            .iter()
            .filter(|l| l.id_board.as_deref() == Some(board_id) && !l.closed)
            .cloned()
            .collect())
    }

    async fn list_board_cards(&self, board_id: &str) -> Result<Vec<Card>> {
        let s = self.state.lock().unwrap();
        Ok(s.cards
            .iter()
            .filter(|c| c.id_board.as_deref() == Some(board_id))
            .map(|c| Card {
                attachments: Vec::new(),
                actions: Vec::new(),
                ..c.clone()
            })
            .collect())
    }

    async fn get_card(&self, card_id: &str) -> Result<Card> {
        self.card(card_id).context("card not found")
    }

    async fn card_checklists(&self, card_id: &str) -> Result<Vec<Checklist>> {
        Ok(self.checklists_of(card_id))
    }

    async fn move_card(&self, card_id: &str, list_id: &str) -> Result<Card> {
        let delay = self.state.lock().unwrap().move_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut s = self.state.lock().unwrap();
        if s.failing_moves.contains(card_id) {
            bail!("Trello returned 500 Internal Server Error: move rejected");
        }
        s.calls.push(Call::MoveCard {
            card: card_id.into(),
            list: list_id.into(),
        });
        let card = s
            .cards
            .iter_mut()
            .find(|c| c.id == card_id)
            .context("card not found")?;
        card.id_list = list_id.into();
        Ok(card.clone())
    }

    async fn delete_card(&self, card_id: &str) -> Result<()> {
        let mut s = self.state.lock().unwrap();
        if s.failing_deletes.contains(card_id) {
            bail!("Trello returned 404 Not Found: card gone");
        }
        s.calls.push(Call::DeleteCard(card_id.into()));
        s.cards.retain(|c| c.id != card_id);
        Ok(())
    }

    async fn create_list(
        &self,
        board_id: &str,
        name: &str,
        pos: Option<f64>,
    ) -> Result<TrelloList> {
        let mut s = self.state.lock().unwrap();
        s.calls.push(Call::CreateList {
            name: name.into(),
            pos,
        });
        let id = s.id("list");
        let pos = pos.unwrap_or_else(|| s.lists.iter().map(|l| l.pos).fold(0.0, f64::max) + 1.0);
        let list = TrelloList {
            id,
            name: name.into(),
            id_board: Some(board_id.into()),
            pos,
            closed: false,
        };
        s.lists.push(list.clone());
        Ok(list)
    }

    async fn delete_list(&self, list_id: &str) -> Result<()> {
        let mut s = self.state.lock().unwrap();
        s.calls.push(Call::ArchiveList(list_id.into()));
        let list = s
            .lists
            .iter_mut()
            .find(|l| l.id == list_id)
            .context("list not found")?;
        list.closed = true;
        Ok(())
    }

    async fn insert_card(&self, list_id: &str, name: &str, desc: &str) -> Result<Card> {
        {
            let mut s = self.state.lock().unwrap();
            s.calls.push(Call::InsertCard {
                list: list_id.into(),
                name: name.into(),
            });
        }
        let id = self.add_card(list_id, name, desc);
        self.card(&id).context("card not found")
    }

    async fn create_checklist(&self, card_id: &str, name: &str) -> Result<Checklist> {
        let mut s = self.state.lock().unwrap();
        s.calls.push(Call::CreateChecklist {
            card: card_id.into(),
            name: name.into(),
        });
        let checklist = Checklist {
            id: s.id("checklist"),
            name: name.into(),
            id_card: Some(card_id.into()),
            check_items: Vec::new(),
        };
        s.checklists.push(checklist.clone());
        Ok(checklist)
    }

    async fn add_checklist_item(&self, checklist_id: &str, name: &str) -> Result<CheckItem> {
        let mut s = self.state.lock().unwrap();
        s.calls.push(Call::AddChecklistItem {
            checklist: checklist_id.into(),
            name: name.into(),
        });
        let id = s.id("item");
        let checklist = s
            .checklists
            .iter_mut()
            .find(|c| c.id == checklist_id)
            .context("checklist not found")?;
        let item = CheckItem {
            id,
            name: name.into(),
            id_checklist: Some(checklist_id.into()),
            pos: checklist.check_items.len() as f64,
        };
        checklist.check_items.push(item.clone());
        Ok(item)
    }

    async fn update_card_description(&self, card_id: &str, desc: &str) -> Result<()> {
        let mut s = self.state.lock().unwrap();
        s.calls.push(Call::UpdateDescription(card_id.into()));
        let card = s
            .cards
            .iter_mut()
            .find(|c| c.id == card_id)
            .context("card not found")?;
        card.desc = desc.into();
        Ok(())
    }

    async fn attach_file(
        &self,
        card_id: &str,
        file_name: &str,
        contents: Vec<u8>,
    ) -> Result<Attachment> {
        let mut s = self.state.lock().unwrap();
        s.calls.push(Call::AttachFile {
            card: card_id.into(),
            file: file_name.into(),
        });
        let attachment = Attachment {
            id: s.id("att"),
            name: file_name.into(),
            url: format!("https://trello.test/attachments/{file_name}"),
        };
        s.attachments
            .insert((card_id.into(), file_name.into()), contents);
        if let Some(card) = s.cards.iter_mut().find(|c| c.id == card_id) {
            card.attachments.push(attachment.clone());
        }
        Ok(attachment)
    }
}
