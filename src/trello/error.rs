use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrelloError {
    #[error("Trello returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("Trello request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

