use std::time::Duration;

use miette::Diagnostic;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Server URL used when neither `--server` nor `ZPLAY_SERVER` is set.
pub const DEFAULT_SERVER: &str = "http://localhost:3000";

/// Result type for API calls.
pub type ClientResult<T> = Result<T, ClientError>;

/// Failures talking to a zplay server.
#[derive(Debug, Error, Diagnostic)]
pub enum ClientError {
    /// The server could not be reached.
    #[error("cannot reach zplay server at {url}")]
    #[diagnostic(
        code(zplay::connect),
        help("start one with `zplay-server`, or point --server / ZPLAY_SERVER at it")
    )]
    Connect {
        /// Base URL that was tried.
        url: String,
        /// Transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with an error status.
    #[error("server returned {status}: {message}")]
    #[diagnostic(code(zplay::api))]
    Api {
        /// HTTP status.
        status: StatusCode,
        /// The `error` field of the reply, or its raw body.
        message: String,
    },

    /// The reply body was not what the API promises.
    #[error("unexpected reply from server")]
    #[diagnostic(code(zplay::decode))]
    Decode(#[source] reqwest::Error),

    /// Reading input or writing output failed.
    #[error("terminal I/O failed")]
    #[diagnostic(code(zplay::io))]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// The HTTP status, for errors the server reported.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the server said the session does not exist.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}

/// `GET /health`
#[derive(Debug, Clone, Deserialize)]
pub struct Health {
    /// `"ok"` when healthy.
    pub status: String,
    /// Server clock, RFC 3339.
    pub timestamp: String,
}

/// One entry of `GET /api/games`.
#[derive(Debug, Clone, Deserialize)]
pub struct Game {
    /// File name.
    pub name: String,
    /// Path to pass as `gamePath`.
    pub path: String,
}

#[derive(Deserialize)]
struct GameList {
    games: Vec<Game>,
}

/// `POST /api/sessions`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSession {
    /// Session id.
    pub session_id: String,
    /// Opening text.
    pub output: String,
    /// Story the server resolved.
    pub game_path: String,
}

/// `POST /api/sessions/{id}/input`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnOutput {
    /// Session id.
    pub session_id: String,
    /// Echo of the command.
    pub command: String,
    /// Output of the turn.
    pub output: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    game_path: Option<&'a str>,
}

#[derive(Serialize)]
struct InputRequest<'a> {
    command: &'a str,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Thin typed wrapper over the zplay HTTP API.
#[derive(Debug, Clone)]
pub struct GameClient {
    client: Client,
    base_url: String,
}

impl GameClient {
    /// A client for the server at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
        }
    }

    /// The server base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Server liveness.
    pub async fn health(&self) -> ClientResult<Health> {
        self.call(self.client.get(self.url("/health"))).await
    }

    /// Story files the server can load.
    pub async fn games(&self) -> ClientResult<Vec<Game>> {
        let list: GameList = self.call(self.client.get(self.url("/api/games"))).await?;
        Ok(list.games)
    }

    /// Start a session, on the server's default game when `game` is `None`.
    pub async fn create_session(&self, game: Option<&str>) -> ClientResult<NewSession> {
        let request = self
            .client
            .post(self.url("/api/sessions"))
            .json(&CreateRequest { game_path: game });
        self.call(request).await
    }

    /// Play one command.
    pub async fn send(&self, session_id: &str, command: &str) -> ClientResult<TurnOutput> {
        let request = self
            .client
            .post(self.url(&format!("/api/sessions/{session_id}/input")))
            .json(&InputRequest { command });
        self.call(request).await
    }

    /// Close a session.
    pub async fn delete(&self, session_id: &str) -> ClientResult<()> {
        let request = self
            .client
            .delete(self.url(&format!("/api/sessions/{session_id}")));
        let _: serde::de::IgnoredAny = self.call(request).await?;
        Ok(())
    }

    async fn call<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
        let response = request
            .timeout(Duration::from_secs(30))
            .send()
            .await
            .map_err(|source| ClientError::Connect {
                url: self.base_url.clone(),
                source,
            })?;
        let response = check(response).await?;
        response.json().await.map_err(ClientError::Decode)
    }
}

async fn check(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or(text);
    Err(ClientError::Api { status, message })
}

/// Drop the interpreter's trailing input prompt; the CLI prints its own.
pub fn strip_prompt(output: &str) -> &str {
    let trimmed = output.trim_end();
    trimmed
        .strip_suffix('>')
        .map_or(trimmed, str::trim_end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_a_trailing_prompt() {
        assert_eq!(strip_prompt("West of House\n\n>"), "West of House");
        assert_eq!(strip_prompt("Taken.\n> "), "Taken.");
        assert_eq!(strip_prompt("Taken."), "Taken.");
        assert_eq!(strip_prompt(">"), "");
        assert_eq!(strip_prompt("a > b"), "a > b");
    }

    #[test]
    fn base_url_loses_trailing_slash() {
        let client = GameClient::new("http://localhost:3000/");
        assert_eq!(client.base_url(), "http://localhost:3000");
        assert_eq!(client.url("/health"), "http://localhost:3000/health");
    }
}
