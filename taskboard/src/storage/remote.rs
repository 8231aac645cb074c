//! HTTP client for the taskboard REST backend.

use super::{BoardStorage, StorageMode};
use crate::config::Config;
use crate::error::{Result, TaskboardError};
use crate::types::{
    Board, BoardId, BoardPatch, BoardSummary, Card, CardId, CardPatch, CardPlacement, Column,
    ColumnId, ColumnPatch, NewBoard, NewCard, NewColumn, UserPreferences,
};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::debug;

/// Extract a human-readable message from a JSON error body.
///
/// Tries `message`, then `error`, then falls back to the raw body.
fn extract_error_message(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(msg) = json.get("message").and_then(|v| v.as_str()) {
            return msg.to_string();
        }
        if let Some(err) = json.get("error").and_then(|v| v.as_str()) {
            return err.to_string();
        }
    }
    body.to_string()
}

/// REST adapter. One call, one request.
#[derive(Debug)]
pub struct RemoteStorage {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl RemoteStorage {
    /// Client for the given API root, e.g. `https://host/api`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Authenticate every request with a bearer token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let url = config.api_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(TaskboardError::invalid_value(
                "api_url",
                format!("expected an http(s) URL, got {url:?}"),
            ));
        }
        let mut storage = Self::new(url);
        if let Some(token) = &config.api_token {
            storage = storage.with_token(token.clone());
        }
        Ok(storage)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "remote request");
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Map an HTTP response to a `TaskboardError` based on status code.
    async fn check_response(response: Response, resource: &str, id: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = extract_error_message(&body);

        match status {
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                Err(TaskboardError::Validation { message })
            }
            StatusCode::NOT_FOUND => Err(TaskboardError::NotFound {
                resource: resource.to_string(),
                id: id.to_string(),
            }),
            _ => Err(TaskboardError::Api {
                status: status.as_u16(),
                message,
            }),
        }
    }

    async fn send(&self, builder: RequestBuilder, resource: &str, id: &str) -> Result<Response> {
        let response = builder.send().await?;
        Self::check_response(response, resource, id).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        resource: &str,
        id: &str,
    ) -> Result<T> {
        let response = self
            .send(self.request(Method::GET, path), resource, id)
            .await?;
        Ok(response.json().await?)
    }

    async fn send_json<B, T>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        resource: &str,
        id: &str,
    ) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let response = self
            .send(self.request(method, path).json(body), resource, id)
            .await?;
        Ok(response.json().await?)
    }

    /// Request whose response body is ignored (acks)
    async fn send_ack<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        resource: &str,
        id: &str,
    ) -> Result<()>
    where
        B: Serialize + ?Sized + Sync,
    {
        let mut builder = self.request(method, path);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        self.send(builder, resource, id).await?;
        Ok(())
    }
}

#[async_trait]
impl BoardStorage for RemoteStorage {
    fn mode(&self) -> StorageMode {
        StorageMode::Remote
    }

    async fn list_boards(&self) -> Result<Vec<BoardSummary>> {
        let mut boards: Vec<BoardSummary> = self.get_json("/boards/list", "board", "*").await?;
        // The list endpoint answers in order; it may omit the order field.
        for (idx, board) in boards.iter_mut().enumerate() {
            board.order = idx;
        }
        Ok(boards)
    }

    async fn load_boards(&self) -> Result<Vec<Board>> {
        let mut boards: Vec<Board> = self.get_json("/boards", "board", "*").await?;
        for board in &mut boards {
            board.sort();
        }
        boards.sort_by_key(|b| b.order);
        Ok(boards)
    }

    async fn get_board_details(&self, id: &BoardId) -> Result<Board> {
        id.validate()?;
        let mut board: Board = self
            .get_json(&format!("/boards/{id}"), "board", id.as_str())
            .await?;
        board.sort();
        Ok(board)
    }

    async fn create_board(&self, data: &NewBoard) -> Result<Board> {
        let mut board: Board = self
            .send_json(Method::POST, "/boards", data, "board", "new")
            .await?;
        board.sort();
        Ok(board)
    }

    async fn update_board(&self, id: &BoardId, patch: &BoardPatch) -> Result<Board> {
        id.validate()?;
        let mut board: Board = self
            .send_json(Method::PUT, &format!("/boards/{id}"), patch, "board", id.as_str())
            .await?;
        board.sort();
        Ok(board)
    }

    async fn delete_board(&self, id: &BoardId) -> Result<()> {
        id.validate()?;
        self.send_ack::<()>(Method::DELETE, &format!("/boards/{id}"), None, "board", id.as_str())
            .await
    }

    async fn reorder_boards(&self, ordered: &[BoardId]) -> Result<()> {
        for id in ordered {
            id.validate()?;
        }
        let body = json!({ "boardIds": ordered });
        self.send_ack(Method::PUT, "/boards/reorder", Some(&body), "board", "*")
            .await
    }

    async fn create_column(&self, board_id: &BoardId, data: &NewColumn) -> Result<Column> {
        board_id.validate()?;
        let body = json!({ "title": data.title, "color": data.resolved_color() });
        self.send_json(
            Method::POST,
            &format!("/boards/{board_id}/columns"),
            &body,
            "board",
            board_id.as_str(),
        )
        .await
    }

    async fn update_column(&self, id: &ColumnId, patch: &ColumnPatch) -> Result<Column> {
        id.validate()?;
        self.send_json(Method::PUT, &format!("/columns/{id}"), patch, "column", id.as_str())
            .await
    }

    async fn delete_column(&self, id: &ColumnId) -> Result<()> {
        id.validate()?;
        self.send_ack::<()>(Method::DELETE, &format!("/columns/{id}"), None, "column", id.as_str())
            .await
    }

    async fn reorder_columns(&self, board_id: &BoardId, ordered: &[ColumnId]) -> Result<()> {
        board_id.validate()?;
        for id in ordered {
            id.validate()?;
        }
        let body = json!({ "columnIds": ordered });
        self.send_ack(
            Method::PUT,
            &format!("/boards/{board_id}/reorder-columns"),
            Some(&body),
            "board",
            board_id.as_str(),
        )
        .await
    }

    async fn create_card(&self, column_id: &ColumnId, data: &NewCard) -> Result<Card> {
        column_id.validate()?;
        self.send_json(
            Method::POST,
            &format!("/columns/{column_id}/cards"),
            data,
            "column",
            column_id.as_str(),
        )
        .await
    }

    async fn update_card(&self, id: &CardId, patch: &CardPatch) -> Result<Card> {
        id.validate()?;
        self.send_json(Method::PUT, &format!("/cards/{id}"), patch, "card", id.as_str())
            .await
    }

    async fn delete_card(&self, id: &CardId) -> Result<()> {
        id.validate()?;
        self.send_ack::<()>(Method::DELETE, &format!("/cards/{id}"), None, "card", id.as_str())
            .await
    }

    async fn reorder_cards(
        &self,
        board_id: &BoardId,
        placements: &[CardPlacement],
    ) -> Result<()> {
        board_id.validate()?;
        for placement in placements {
            placement.id.validate()?;
            placement.column_id.validate()?;
        }
        let body = json!({ "cards": placements });
        self.send_ack(
            Method::PUT,
            &format!("/boards/{board_id}/reorder-cards"),
            Some(&body),
            "board",
            board_id.as_str(),
        )
        .await
    }

    async fn get_preferences(&self) -> Result<UserPreferences> {
        let mut prefs: UserPreferences = self
            .get_json("/user/preferences", "preferences", "me")
            .await?;
        prefs.normalize();
        Ok(prefs)
    }

    async fn update_preferences(&self, prefs: &UserPreferences) -> Result<UserPreferences> {
        let mut saved: UserPreferences = self
            .send_json(Method::PUT, "/user/preferences", prefs, "preferences", "me")
            .await?;
        saved.normalize();
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_extract_error_message() {
        assert_eq!(extract_error_message(r#"{"message":"Title required"}"#), "Title required");
        assert_eq!(extract_error_message(r#"{"error":"Invalid id"}"#), "Invalid id");
        assert_eq!(extract_error_message("plain"), "plain");
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let storage = RemoteStorage::new("http://localhost:5000/api/");
        assert_eq!(storage.base_url(), "http://localhost:5000/api");
    }

    #[test]
    fn test_from_config_requires_http_url() {
        let config = Config {
            api_url: "ftp://boards".into(),
            api_token: Some("t".into()),
            ..Config::default()
        };
        assert!(RemoteStorage::from_config(&config).unwrap_err().is_validation());

        let config = Config {
            api_url: "https://boards.example/api/".into(),
            ..config
        };
        let storage = RemoteStorage::from_config(&config).unwrap();
        assert_eq!(storage.base_url(), "https://boards.example/api");
        assert_eq!(storage.token.as_deref(), Some("t"));
    }

    #[tokio::test]
    async fn test_list_boards_sends_token() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/boards/list"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": "b1", "title": "Work"},
                {"id": "b2", "title": "Home"}
            ])))
            .mount(&mock_server)
            .await;

        let storage = RemoteStorage::new(mock_server.uri()).with_token("secret");
        let boards = storage.list_boards().await.unwrap();

        assert_eq!(boards.len(), 2);
        assert_eq!(boards[1].title, "Home");
        assert_eq!(boards[1].order, 1);
    }

    #[tokio::test]
    async fn test_reorder_columns_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/boards/b1/reorder-columns"))
            .and(body_json(serde_json::json!({"columnIds": ["c2", "c1"]})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let storage = RemoteStorage::new(mock_server.uri());
        storage
            .reorder_columns(
                &BoardId::from_string("b1"),
                &[ColumnId::from_string("c2"), ColumnId::from_string("c1")],
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_not_found_is_distinct() {
        let mock_server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/boards/gone"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(serde_json::json!({"message": "Board not found"})),
            )
            .mount(&mock_server)
            .await;

        let storage = RemoteStorage::new(mock_server.uri());
        let err = storage
            .delete_board(&BoardId::from_string("gone"))
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert!(matches!(
            err,
            TaskboardError::NotFound { ref resource, .. } if resource == "board"
        ));
    }

    #[tokio::test]
    async fn test_validation_error_carries_message() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/boards"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(serde_json::json!({"message": "Title is required"})),
            )
            .mount(&mock_server)
            .await;

        let storage = RemoteStorage::new(mock_server.uri());
        let err = storage.create_board(&NewBoard::new("")).await.unwrap_err();

        match err {
            TaskboardError::Validation { message } => assert_eq!(message, "Title is required"),
            other => panic!("Expected Validation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_server_error_is_persistence_failure() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/cards/k1"))
            .respond_with(ResponseTemplate::new(500).set_body_string("database down"))
            .mount(&mock_server)
            .await;

        let storage = RemoteStorage::new(mock_server.uri());
        let err = storage
            .update_card(&CardId::from_string("k1"), &CardPatch::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), crate::error::ErrorKind::Persistence);
        assert!(err.to_string().contains("database down"));
    }

    #[tokio::test]
    async fn test_malformed_id_never_reaches_server() {
        let mock_server = MockServer::start().await;
        let storage = RemoteStorage::new(mock_server.uri());

        let err = storage
            .delete_column(&ColumnId::from_string("../etc"))
            .await
            .unwrap_err();

        assert!(err.is_validation());
        assert!(mock_server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_board_details_sorted() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/boards/b1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "b1", "title": "Work", "order": 0,
                "columns": [
                    {"id": "c2", "boardId": "b1", "title": "Done", "color": "#0f0", "order": 1,
                     "cards": []},
                    {"id": "c1", "boardId": "b1", "title": "Todo", "color": "#f00", "order": 0,
                     "cards": [
                        {"id": "k2", "columnId": "c1", "title": "second", "order": 1},
                        {"id": "k1", "columnId": "c1", "title": "first", "order": 0}
                    ]}
                ]
            })))
            .mount(&mock_server)
            .await;

        let storage = RemoteStorage::new(mock_server.uri());
        let board = storage
            .get_board_details(&BoardId::from_string("b1"))
            .await
            .unwrap();

        assert_eq!(board.columns[0].title, "Todo");
        assert_eq!(board.columns[0].cards[0].title, "first");
    }
}
