//! Error types for adapters and sessions.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result type for starting a game.
pub type LoadResult<T> = Result<T, LoadError>;

/// Result type for adapter turns.
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Result type for registry operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// A game could not be started.
#[derive(Debug, Error)]
pub enum LoadError {
    /// No file at the resolved path.
    #[error("game file not found: {}", .0.display())]
    Missing(PathBuf),

    /// The file exists but could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Unreadable {
        /// The resolved game path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The file is not a story this backend can run.
    #[error("unsupported story file {}: {source}", path.display())]
    Unsupported {
        /// The resolved game path.
        path: PathBuf,
        /// Why the interpreter rejected it.
        #[source]
        source: zplay_zmachine::LoadError,
    },

    /// The external interpreter could not be launched.
    #[error("failed to start interpreter `{program}`: {source}")]
    Spawn {
        /// Program name as configured.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The interpreter task died before producing output.
    #[error("interpreter task failed: {0}")]
    Interpreter(String),
}

/// A turn could not be played.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// `submit` before `start`.
    #[error("the game has not been started")]
    NotStarted,

    /// The story has ended; no more input is accepted.
    #[error("the game has ended")]
    Halted,

    /// The adapter was disposed.
    #[error("the game has been closed")]
    Disposed,

    /// Writing to or reading from the interpreter failed.
    #[error("interpreter I/O failed: {0}")]
    Io(#[from] io::Error),

    /// The interpreter stopped reading input within the turn timeout and
    /// was killed.
    #[error("interpreter did not accept input within {0:?}")]
    Unresponsive(Duration),

    /// The interpreter task panicked or was cancelled.
    #[error("interpreter task failed: {0}")]
    Crashed(String),
}

/// Registry-level failures.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Starting the game failed; no session was stored.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// No session with that id.
    #[error("session not found: {0}")]
    NotFound(String),

    /// The command spans more than one line.
    #[error("command must be a single line")]
    MultiLineCommand,

    /// Another command on the same session is still running.
    #[error("session {0} is busy with another command")]
    Busy(String),

    /// The registry is full.
    #[error("session limit of {0} reached")]
    CapacityExceeded(usize),

    /// The adapter refused or failed the turn.
    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

/// An environment variable held an unusable value.
#[derive(Debug, Error)]
#[error("invalid value {value:?} for {key}: {reason}")]
pub struct ConfigError {
    /// The variable name.
    pub key: &'static str,
    /// The offending value.
    pub value: String,
    /// What was expected.
    pub reason: String,
}
