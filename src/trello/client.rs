use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;

use super::{TrelloApi, TrelloError};
use crate::config::TrelloConfig;
use crate::model::board::{Board, CheckItem, Checklist, TrelloList};
use crate::model::card::{Attachment, Card};

pub struct TrelloClient {
    api_key: String,
    token: String,
    base_url: String,
    client: reqwest::Client,
}

impl TrelloClient {
    pub fn new(config: &TrelloConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            token: config.token.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn auth_params(&self) -> [(&str, &str); 2] {
        [("key", &self.api_key), ("token", &self.token)]
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path)).query(&self.auth_params())
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path)).query(&self.auth_params())
    }

    fn put(&self, path: &str) -> RequestBuilder {
        self.client.put(self.url(path)).query(&self.auth_params())
    }

    fn delete(&self, path: &str) -> RequestBuilder {
        self.client.delete(self.url(path)).query(&self.auth_params())
    }
}

async fn send(request: RequestBuilder) -> Result<Response, TrelloError> {
    let response = request.send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(TrelloError::Status { status, body })
}

async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, TrelloError> {
    Ok(send(request).await?.json().await?)
}

#[async_trait]
impl TrelloApi for TrelloClient {
    async fn list_boards(&self) -> Result<Vec<Board>> {
        tracing::debug!("GET members/me/boards");
        Ok(send_json(
            self.get("members/me/boards")
                .query(&[("fields", "id,name"), ("filter", "open")]),
        )
        .await?)
    }

    async fn list_board_lists(&self, board_id: &str) -> Result<Vec<TrelloList>> {
        tracing::debug!(board_id, "GET boards/lists");
        Ok(send_json(
            self.get(&format!("boards/{board_id}/lists"))
                .query(&[("fields", "id,name,idBoard,pos,closed")]),
        )
        .await
        .with_context(|| format!("Failed to list lists of board {board_id}"))?)
    }

    async fn list_board_cards(&self, board_id: &str) -> Result<Vec<Card>> {
        tracing::debug!(board_id, "GET boards/cards");
        Ok(send_json(
            self.get(&format!("boards/{board_id}/cards"))
                .query(&[("fields", "id,name,desc,idList,idBoard,shortUrl")]),
        )
        .await
        .with_context(|| format!("Failed to list cards of board {board_id}"))?)
    }

    async fn get_card(&self, card_id: &str) -> Result<Card> {
        tracing::debug!(card_id, "GET cards");
        Ok(send_json(self.get(&format!("cards/{card_id}")).query(&[
            ("attachments", "true"),
            ("attachment_fields", "id,name,url"),
            ("actions", "commentCard"),
        ]))
        .await
        .with_context(|| format!("Failed to fetch card {card_id}"))?)
    }

    async fn card_checklists(&self, card_id: &str) -> Result<Vec<Checklist>> {
        Ok(send_json(self.get(&format!("cards/{card_id}/checklists")))
            .await
            .with_context(|| format!("Failed to fetch checklists of card {card_id}"))?)
    }

    async fn move_card(&self, card_id: &str, list_id: &str) -> Result<Card> {
        tracing::debug!(card_id, list_id, "PUT cards idList");
        Ok(send_json(
            self.put(&format!("cards/{card_id}"))
                .query(&[("idList", list_id)]),
        )
        .await
        .with_context(|| format!("Failed to move card {card_id}"))?)
    }

    async fn delete_card(&self, card_id: &str) -> Result<()> {
        tracing::debug!(card_id, "DELETE cards");
        send(self.delete(&format!("cards/{card_id}")))
            .await
            .with_context(|| format!("Failed to delete card {card_id}"))?;
        Ok(())
    }

    async fn create_list(
        &self,
        board_id: &str,
        name: &str,
        pos: Option<f64>,
    ) -> Result<TrelloList> {
        let pos = pos.map_or_else(|| "bottom".to_string(), |p| p.to_string());
        tracing::debug!(board_id, name, %pos, "POST lists");
        Ok(send_json(self.post("lists").query(&[
            ("idBoard", board_id),
            ("name", name),
            ("pos", pos.as_str()),
        ]))
        .await
        .with_context(|| format!("Failed to create list '{name}'"))?)
    }

    async fn delete_list(&self, list_id: &str) -> Result<()> {
        tracing::debug!(list_id, "PUT lists closed");
        send(
            self.put(&format!("lists/{list_id}/closed"))
                .query(&[("value", "true")]),
        )
        .await
        .with_context(|| format!("Failed to archive list {list_id}"))?;
        Ok(())
    }

    async fn insert_card(&self, list_id: &str, name: &str, desc: &str) -> Result<Card> {
        tracing::debug!(list_id, name, "POST cards");
        Ok(send_json(self.post("cards").query(&[
            ("idList", list_id),
            ("name", name),
            ("desc", desc),
        ]))
        .await
        .with_context(|| format!("Failed to create card '{name}'"))?)
    }

    async fn create_checklist(&self, card_id: &str, name: &str) -> Result<Checklist> {
        Ok(send_json(
            self.post("checklists")
                .query(&[("idCard", card_id), ("name", name)]),
        )
        .await
        .with_context(|| format!("Failed to create checklist '{name}'"))?)
    }

    async fn add_checklist_item(&self, checklist_id: &str, name: &str) -> Result<CheckItem> {
        Ok(send_json(
            self.post(&format!("checklists/{checklist_id}/checkItems"))
                .query(&[("name", name)]),
        )
        .await
        .with_context(|| format!("Failed to add checklist item '{name}'"))?)
    }

    async fn update_card_description(&self, card_id: &str, desc: &str) -> Result<()> {
        send(
            self.put(&format!("cards/{card_id}"))
                .query(&[("desc", desc)]),
        )
        .await
        .with_context(|| format!("Failed to update description of card {card_id}"))?;
        Ok(())
    }

    async fn attach_file(
        &self,
        card_id: &str,
        file_name: &str,
        contents: Vec<u8>,
    ) -> Result<Attachment> {
        tracing::debug!(card_id, file_name, bytes = contents.len(), "POST cards/attachments");
        let part = Part::bytes(contents)
            .file_name(file_name.to_string())
            .mime_str("text/markdown")?;
        let form = Form::new()
            .text("name", file_name.to_string())
            .part("file", part);
        Ok(send_json(
            self.post(&format!("cards/{card_id}/attachments"))
                .multipart(form),
        )
        .await
        .with_context(|| format!("Failed to upload {file_name}"))?)
    }
}
