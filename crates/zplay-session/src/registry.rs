//! The session registry.
//!
//! The map lock is held only to look up, insert or remove entries. Adapter
//! calls run under a per-session mutex, so sessions never wait on each other,
//! and a second command on a busy session is refused instead of queued.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::adapter::Adapter;
use crate::config::{Backend, SessionConfig};
use crate::error::{AdapterError, SessionError, SessionResult};
use crate::transcript::Transcript;

struct Activity {
    transcript: Transcript,
    last_active: Instant,
}

struct Session {
    id: Uuid,
    game_path: PathBuf,
    created_at: DateTime<Utc>,
    backend: Backend,
    adapter: Mutex<Adapter>,
    activity: Mutex<Activity>,
}

impl Session {
    async fn dispose(&self) {
        self.adapter.lock().await.dispose().await;
    }

    async fn info(&self) -> SessionInfo {
        SessionInfo {
            id: self.id,
            game_path: self.game_path.clone(),
            created_at: self.created_at,
            backend: self.backend,
            last_output: self.activity.lock().await.transcript.clone(),
        }
    }
}

/// A snapshot of one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    /// Session id.
    pub id: Uuid,
    /// Resolved game path the session was started with.
    pub game_path: PathBuf,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// Adapter variant driving the session.
    pub backend: Backend,
    /// Output of the most recent turn.
    pub last_output: Transcript,
}

/// Result of a successful [`SessionRegistry::create_session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCreated {
    /// The new session's id.
    pub id: Uuid,
    /// Everything printed before the first input request.
    pub output: Transcript,
    /// Resolved game path.
    pub game_path: PathBuf,
}

/// Owns every live session.
pub struct SessionRegistry {
    config: SessionConfig,
    sessions: RwLock<HashMap<Uuid, Arc<Session>>>,
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("backend", &self.config.backend)
            .field("max_sessions", &self.config.max_sessions)
            .finish_non_exhaustive()
    }
}

impl SessionRegistry {
    /// An empty registry.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// The configuration sessions are created with.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Start a game and register it under a fresh id.
    ///
    /// `game` falls back to the configured default. When the registry is full
    /// idle sessions are swept first; if it is still full the request fails
    /// with [`SessionError::CapacityExceeded`]. A game that fails to start
    /// leaves nothing behind.
    #[instrument(skip(self), fields(backend = %self.config.backend))]
    pub async fn create_session(&self, game: Option<&str>) -> SessionResult<SessionCreated> {
        if self.len().await >= self.config.max_sessions {
            self.evict_idle().await;
            if self.len().await >= self.config.max_sessions {
                return Err(SessionError::CapacityExceeded(self.config.max_sessions));
            }
        }

        let game_path = self.config.resolve_game(game);
        let mut adapter = Adapter::for_config(&self.config);
        let output = match adapter.start(&game_path).await {
            Ok(output) => output,
            Err(err) => {
                adapter.dispose().await;
                info!(game = %game_path.display(), %err, "game failed to start");
                return Err(err.into());
            }
        };

        let id = Uuid::new_v4();
        let session = Arc::new(Session {
            id,
            game_path: game_path.clone(),
            created_at: Utc::now(),
            backend: adapter.kind(),
            adapter: Mutex::new(adapter),
            activity: Mutex::new(Activity {
                transcript: output.clone(),
                last_active: Instant::now(),
            }),
        });

        {
            let mut sessions = self.sessions.write().await;
            if sessions.len() >= self.config.max_sessions {
                drop(sessions);
                session.dispose().await;
                return Err(SessionError::CapacityExceeded(self.config.max_sessions));
            }
            sessions.insert(id, session);
        }

        info!(session = %id, game = %game_path.display(), "session created");
        Ok(SessionCreated {
            id,
            output,
            game_path,
        })
    }

    /// Look up a session. Malformed ids are simply unknown.
    pub async fn get_session(&self, id: &str) -> Option<SessionInfo> {
        let session = self.lookup(id).await.ok()?;
        Some(session.info().await)
    }

    /// Play one turn on a session and remember its output.
    ///
    /// A trailing line break is allowed; any other `\r` or `\n` is
    /// rejected with [`SessionError::MultiLineCommand`].
    #[instrument(skip(self, command), fields(session = %id))]
    pub async fn send_command(&self, id: &str, command: &str) -> SessionResult<Transcript> {
        let command = command.trim_end_matches(['\r', '\n']);
        if command.contains(['\r', '\n']) {
            return Err(SessionError::MultiLineCommand);
        }
        let session = self.lookup(id).await?;
        Self::play(&session, id, command).await
    }

    async fn play(session: &Session, id: &str, command: &str) -> SessionResult<Transcript> {
        let mut adapter = session
            .adapter
            .try_lock()
            .map_err(|_| SessionError::Busy(id.to_string()))?;

        debug!(command, "submitting");
        let result = adapter.submit(command).await;
        drop(adapter);

        // Deleted or evicted between the lookup and the lock.
        if matches!(result, Err(AdapterError::Disposed)) {
            return Err(SessionError::NotFound(id.to_string()));
        }

        let mut activity = session.activity.lock().await;
        activity.last_active = Instant::now();
        let transcript = result?;
        activity.transcript = transcript.clone();
        Ok(transcript)
    }

    /// The output of the session's most recent turn.
    pub async fn last_output(&self, id: &str) -> SessionResult<Transcript> {
        let session = self.lookup(id).await?;
        let transcript = session.activity.lock().await.transcript.clone();
        Ok(transcript)
    }

    /// Dispose a session and forget it. Returns whether it existed.
    #[instrument(skip(self), fields(session = %id))]
    pub async fn delete_session(&self, id: &str) -> bool {
        let Ok(uuid) = Uuid::parse_str(id) else {
            return false;
        };
        let removed = self.sessions.write().await.remove(&uuid);
        match removed {
            Some(session) => {
                session.dispose().await;
                info!("session deleted");
                true
            }
            None => false,
        }
    }

    /// Dispose and remove sessions idle for at least the idle timeout.
    /// Returns how many were removed.
    pub async fn evict_idle(&self) -> usize {
        let timeout = self.config.idle_timeout;
        let snapshot: Vec<Arc<Session>> = self.sessions.read().await.values().cloned().collect();

        let mut expired = Vec::new();
        for session in snapshot {
            if session.activity.lock().await.last_active.elapsed() >= timeout {
                expired.push(session.id);
            }
        }

        let mut evicted = 0;
        for id in expired {
            let removed = self.sessions.write().await.remove(&id);
            if let Some(session) = removed {
                session.dispose().await;
                info!(session = %id, "idle session evicted");
                evicted += 1;
            }
        }
        evicted
    }

    /// Dispose every session.
    pub async fn shutdown(&self) {
        let drained: Vec<Arc<Session>> = self.sessions.write().await.drain().map(|(_, s)| s).collect();
        let count = drained.len();
        for session in drained {
            session.dispose().await;
        }
        info!(count, "registry shut down");
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether no sessions are live.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn lookup(&self, id: &str) -> SessionResult<Arc<Session>> {
        let not_found = || SessionError::NotFound(id.to_string());
        let uuid = Uuid::parse_str(id).map_err(|_| not_found())?;
        self.sessions
            .read()
            .await
            .get(&uuid)
            .cloned()
            .ok_or_else(not_found)
    }
}
