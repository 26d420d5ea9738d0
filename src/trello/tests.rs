use reqwest::StatusCode;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::{create_card, find_board, TrelloApi, TrelloClient, TrelloError, DESCRIPTION_LIMIT};
use crate::config::TrelloConfig;

fn client_for(server: &MockServer) -> TrelloClient {
    TrelloClient::new(&TrelloConfig {
        api_key: "key-1".into(),
        token: "token-1".into(),
        base_url: format!("{}/1/", server.uri()),
    })
}

#[tokio::test]
async fn list_boards_sends_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1/members/me/boards"))
        .and(query_param("key", "key-1"))
        .and(query_param("token", "token-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "b1", "name": "Inbox"},
            {"id": "b2", "name": "projects"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let board = find_board(&client, "inbox").await.unwrap();
    assert_eq!(board.id, "b1");
}

#[tokio::test]
async fn missing_board_is_reported_by_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1/members/me/boards"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let err = find_board(&client_for(&server), "inbox").await.unwrap_err();
    assert!(err.to_string().contains("Could not find board named 'inbox'"));
}

#[tokio::test]
async fn non_success_status_carries_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/1/cards/c1"))
        .and(query_param("idList", "l2"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
        .mount(&server)
        .await;

    let err = client_for(&server).move_card("c1", "l2").await.unwrap_err();
    match err.downcast_ref::<TrelloError>() {
        Some(TrelloError::Status { status, body }) => {
            assert_eq!(*status, StatusCode::UNAUTHORIZED);
            assert_eq!(body, "invalid token");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn get_card_expands_attachments_and_comments() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1/cards/c1"))
        .and(query_param("attachments", "true"))
        .and(query_param("actions", "commentCard"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "c1",
            "name": "Read paper",
            "desc": "",
            "idList": "l1",
            "attachments": [{"id": "a1", "name": "paper.pdf", "url": "https://x/paper.pdf"}],
            "actions": [{"type": "commentCard", "data": {"text": "skim section 3"}}]
        })))
        .mount(&server)
        .await;

    let card = client_for(&server).get_card("c1").await.unwrap();
    assert_eq!(card.attachments[0].url, "https://x/paper.pdf");
    assert_eq!(card.comments().collect::<Vec<_>>(), vec!["skim section 3"]);
}

#[tokio::test]
async fn delete_list_archives_it() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/1/lists/l9/closed"))
        .and(query_param("value", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "l9", "closed": true})))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server).delete_list("l9").await.unwrap();
}

#[tokio::test]
async fn create_list_at_position() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/1/lists"))
        .and(query_param("idBoard", "b1"))
        .and(query_param("name", "merged"))
        .and(query_param("pos", "1.5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "l3", "name": "merged", "idBoard": "b1", "pos": 1.5
        })))
        .expect(1)
        .mount(&server)
        .await;

    let list = client_for(&server)
        .create_list("b1", "merged", Some(1.5))
        .await
        .unwrap();
    assert_eq!(list.pos, 1.5);
}

#[tokio::test]
async fn oversized_description_is_uploaded_as_markdown() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/1/cards"))
        .and(query_param("name", "Weekly notes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "c7", "name": "Weekly notes", "desc": "placeholder", "idList": "l1"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/1/cards/c7/attachments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "a1", "name": "Weekly notes.md", "url": "https://trello.test/a1"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/1/cards/c7"))
        .and(query_param(
            "desc",
            "Full description: [Weekly notes.md](https://trello.test/a1)",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "c7"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let desc = "n".repeat(DESCRIPTION_LIMIT + 10);
    let card = create_card(&client, "l1", "Weekly notes", &desc).await.unwrap();

    assert_eq!(card.attachments.len(), 1);
    assert!(card.desc.starts_with("Full description"));
}
