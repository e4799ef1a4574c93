//! Sessions, interpreter adapters and transcripts for zplay.
//!
//! A [`SessionRegistry`] maps session ids to live [`Adapter`]s. Each adapter
//! is one of three interchangeable backends: the in-process Z-machine, an
//! external interpreter driven over pipes, or the scripted stub game. All of
//! them answer the same start, submit and dispose calls with turn-scoped
//! [`Transcript`]s.

/// Interpreter adapter variants.
pub mod adapter;
/// Game catalog discovery.
pub mod catalog;
/// Session and backend configuration.
pub mod config;
/// Error types for adapters and sessions.
pub mod error;
/// The session registry.
pub mod registry;
/// Turn-scoped interpreter output.
pub mod transcript;

pub use adapter::Adapter;
pub use catalog::{GameEntry, list_games};
pub use config::{Backend, InterpreterCommand, SessionConfig, SubprocessTiming};
pub use error::{
    AdapterError, AdapterResult, ConfigError, LoadError, LoadResult, SessionError, SessionResult,
};
pub use registry::{SessionCreated, SessionInfo, SessionRegistry};
pub use transcript::Transcript;
