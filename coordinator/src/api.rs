//! Request/response channel to the authoritative game service.
//!
//! The coordinator consumes this surface, it does not implement the
//! authority. [`SessionApi`] is the narrow typed seam (session creation
//! and membership, board reads, and move submission) and
//! [`HttpSessionApi`] is the production implementation speaking JSON over
//! HTTP. Tests substitute scripted in-memory implementations.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::Value;
use wire::{Board, GameOutcome, GameStatus, Mark, Position};

use crate::config::ClientConfig;
use crate::error::CoordinatorError;

/// Session document returned by create/join/get.
#[derive(Clone, Debug, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub status: GameStatus,
    #[serde(default)]
    pub player_x: Option<String>,
    #[serde(default)]
    pub player_o: Option<String>,
}

/// Board snapshot returned by the board read endpoint.
#[derive(Clone, Debug, Deserialize)]
pub struct BoardSnapshot {
    pub board: Board,
    #[serde(default)]
    pub winner: Option<GameOutcome>,
}

/// Authoritative reply to a move submission. Fully supersedes local state.
#[derive(Clone, Debug, Deserialize)]
pub struct MoveReply {
    pub board: Board,
    #[serde(default)]
    pub winner: Option<GameOutcome>,
    pub game_status: GameStatus,
    pub next_turn: Mark,
}

/// The request/response collaborator, as the coordinator sees it.
#[async_trait]
pub trait SessionApi: Send + Sync {
    /// Create a session; the caller becomes the `X` participant.
    async fn create_session(&self, player_id: &str) -> Result<SessionRecord, CoordinatorError>;

    /// Join an existing session as the `O` participant.
    async fn join_session(
        &self,
        session_id: &str,
        player_id: &str,
    ) -> Result<SessionRecord, CoordinatorError>;

    /// Load an existing session without changing its membership.
    async fn get_session(&self, session_id: &str) -> Result<SessionRecord, CoordinatorError>;

    /// Read the authoritative board snapshot.
    async fn get_board(&self, session_id: &str) -> Result<BoardSnapshot, CoordinatorError>;

    /// Submit a move for arbitration. The reply is authoritative.
    async fn submit_move(
        &self,
        session_id: &str,
        player_id: &str,
        position: Position,
    ) -> Result<MoveReply, CoordinatorError>;
}

/// `reqwest`-backed [`SessionApi`] implementation.
pub struct HttpSessionApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSessionApi {
    /// Build the HTTP client, baking the bearer credential (when present)
    /// into the default headers.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::InvalidHeader`] for a malformed token and
    /// [`CoordinatorError::Http`] when the client cannot be constructed.
    pub fn new(config: &ClientConfig) -> Result<Self, CoordinatorError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &config.bearer_token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {token}"))?,
            );
        }
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
        })
    }

    async fn request<T: serde::de::DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, CoordinatorError> {
        let url = format!("{}{path}", self.base_url);
        let request = self.client.request(method, &url);
        let request = match body {
            Some(json) => request.json(&json),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.json::<Value>().await.unwrap_or(Value::Null);
            let message = body
                .get("message")
                .or_else(|| body.get("error"))
                .and_then(Value::as_str)
                .map_or_else(|| format!("HTTP {}", status.as_u16()), ToOwned::to_owned);
            return Err(CoordinatorError::Rejected { message });
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl SessionApi for HttpSessionApi {
    async fn create_session(&self, player_id: &str) -> Result<SessionRecord, CoordinatorError> {
        self.request(
            reqwest::Method::POST,
            "/api/sessions",
            Some(serde_json::json!({ "player_id": player_id })),
        )
        .await
    }

    async fn join_session(
        &self,
        session_id: &str,
        player_id: &str,
    ) -> Result<SessionRecord, CoordinatorError> {
        let path = format!("/api/sessions/{session_id}/join");
        self.request(
            reqwest::Method::POST,
            &path,
            Some(serde_json::json!({ "player_id": player_id })),
        )
        .await
    }

    async fn get_session(&self, session_id: &str) -> Result<SessionRecord, CoordinatorError> {
        let path = format!("/api/sessions/{session_id}");
        self.request(reqwest::Method::GET, &path, None).await
    }

    async fn get_board(&self, session_id: &str) -> Result<BoardSnapshot, CoordinatorError> {
        let path = format!("/api/sessions/{session_id}/board");
        self.request(reqwest::Method::GET, &path, None).await
    }

    async fn submit_move(
        &self,
        session_id: &str,
        player_id: &str,
        position: Position,
    ) -> Result<MoveReply, CoordinatorError> {
        let path = format!("/api/sessions/{session_id}/moves");
        self.request(
            reqwest::Method::POST,
            &path,
            Some(serde_json::json!({
                "player_id": player_id,
                "position": position.to_string(),
            })),
        )
        .await
    }
}
