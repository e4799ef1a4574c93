//! Scripted text adventure used to exercise zplay without a story file.
//!
//! A hand-written fragment of the area around the white house: four
//! locations, a mailbox, and a brochure. Commands are parsed with small verb
//! synonym tables and answered from a fixed dispatch table. Nothing is read
//! from disk.

/// Error types for the scripted game.
pub mod error;
/// Game session and the dispatch table.
pub mod game;
/// Command parsing.
pub mod parser;
/// Locations, items and mutable world state.
pub mod world;

pub use error::{StubError, StubResult};
pub use game::StubGame;
pub use parser::{Command, Direction, parse_command};
pub use world::{Item, Location, World};
