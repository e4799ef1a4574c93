//! Client library behind the `zplay` command.
//!
//! [`GameClient`] wraps the HTTP API; the [`commands`] modules implement the
//! subcommands on top of it.

/// Typed HTTP client.
pub mod client;
/// Subcommand implementations.
pub mod commands;

pub use client::{ClientError, ClientResult, DEFAULT_SERVER, GameClient, strip_prompt};
