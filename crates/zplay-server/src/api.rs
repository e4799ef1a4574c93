use std::path::PathBuf;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;
use zplay_session::{Backend, GameEntry, SessionError, Transcript};

use crate::AppState;
use crate::error::{ApiError, ApiResult};

/// `POST /api/sessions` body. The body itself may be empty.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    /// Story file to load; the configured default when absent.
    pub game_path: Option<String>,
}

/// `POST /api/sessions` reply.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCreatedResponse {
    /// New session id.
    pub session_id: Uuid,
    /// Opening text.
    pub output: String,
    /// Resolved story path.
    pub game_path: PathBuf,
}

/// `POST /api/sessions/{id}/input` body.
#[derive(Debug, Default, Deserialize)]
pub struct InputRequest {
    /// The line to submit.
    pub command: Option<String>,
}

/// `POST /api/sessions/{id}/input` reply.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputResponse {
    /// Session id.
    pub session_id: Uuid,
    /// The command as submitted.
    pub command: String,
    /// Output of this turn only.
    pub output: String,
}

/// `GET /api/sessions/{id}` reply.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    /// Session id.
    pub session_id: Uuid,
    /// Resolved story path.
    pub game_path: PathBuf,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Interpreter backend driving the session.
    pub backend: Backend,
}

/// `GET /api/sessions/{id}/output` reply.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputResponse {
    /// Session id.
    pub session_id: Uuid,
    /// Output of the most recent turn.
    pub output: String,
}

/// `DELETE /api/sessions/{id}` reply.
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    /// Always true; failures are reported as errors.
    pub success: bool,
    /// Human-readable confirmation.
    pub message: String,
}

/// `GET /api/games` reply.
#[derive(Debug, Serialize)]
pub struct GamesResponse {
    /// Story files in the games directory.
    pub games: Vec<GameEntry>,
}

/// `GET /health` reply.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"`.
    pub status: String,
    /// Server time.
    pub timestamp: DateTime<Utc>,
}

/// Decode an optional JSON body; empty or whitespace-only bodies yield the
/// default value.
fn json_body<T: DeserializeOwned + Default>(body: &Bytes) -> ApiResult<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(format!("invalid JSON body: {e}")))
}

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now(),
    })
}

/// `GET /api/games`
pub async fn list_games(State(state): State<AppState>) -> ApiResult<Json<GamesResponse>> {
    let dir = state.registry().config().games_dir();
    let games = zplay_session::list_games(dir)
        .await
        .map_err(|source| ApiError::Catalog {
            dir: dir.to_path_buf(),
            source,
        })?;
    Ok(Json(GamesResponse { games }))
}

/// `POST /api/sessions`
#[instrument(skip_all)]
pub async fn create_session(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<SessionCreatedResponse>> {
    let request: CreateSessionRequest = json_body(&body)?;
    let created = state
        .registry()
        .create_session(request.game_path.as_deref())
        .await?;
    Ok(Json(SessionCreatedResponse {
        session_id: created.id,
        output: created.output.into_string(),
        game_path: created.game_path,
    }))
}

/// `POST /api/sessions/{id}/input`
#[instrument(skip(state, body))]
pub async fn send_input(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<InputResponse>> {
    let request: InputRequest = json_body(&body)?;
    let command = request
        .command
        .ok_or_else(|| ApiError::BadRequest("command is required".to_string()))?;

    let output: Transcript = state.registry().send_command(&id, &command).await?;
    Ok(Json(InputResponse {
        session_id: parse_id(&id)?,
        command,
        output: output.into_string(),
    }))
}

/// `GET /api/sessions/{id}`
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SessionResponse>> {
    let info = state
        .registry()
        .get_session(&id)
        .await
        .ok_or_else(|| SessionError::NotFound(id.clone()))?;
    Ok(Json(SessionResponse {
        session_id: info.id,
        game_path: info.game_path,
        created_at: info.created_at,
        backend: info.backend,
    }))
}

/// `GET /api/sessions/{id}/output`
pub async fn get_output(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<OutputResponse>> {
    let output = state.registry().last_output(&id).await?;
    Ok(Json(OutputResponse {
        session_id: parse_id(&id)?,
        output: output.into_string(),
    }))
}

/// `DELETE /api/sessions/{id}`
#[instrument(skip(state))]
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    if !state.registry().delete_session(&id).await {
        return Err(SessionError::NotFound(id).into());
    }
    info!("session closed over HTTP");
    Ok(Json(DeleteResponse {
        success: true,
        message: format!("Session {id} deleted"),
    }))
}

/// Ids reaching this point already resolved in the registry.
fn parse_id(id: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(id).map_err(|_| SessionError::NotFound(id.to_string()).into())
}
