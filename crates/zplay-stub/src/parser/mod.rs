//! Command parsing.

mod command;

pub use command::{Command, Direction, Verb, parse_command};
