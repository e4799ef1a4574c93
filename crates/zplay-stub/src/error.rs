//! Error types for the scripted game.
//!
//! Every variant renders as the in-game reply the player sees.

use thiserror::Error;

/// Result type for scripted game actions.
pub type StubResult<T> = Result<T, StubError>;

/// Things that can go wrong with a command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StubError {
    /// Input was blank.
    #[error("I beg your pardon?")]
    Empty,

    /// The verb is not in any synonym table.
    #[error("I don't know the word \"{0}\".")]
    UnknownWord(String),

    /// A verb that needs an object was given none.
    #[error("What do you want to {0}?")]
    MissingObject(String),

    /// The named thing is not visible here.
    #[error("You can't see any {0} here!")]
    NotHere(String),

    /// The player does not hold the item.
    #[error("You don't have the {0}.")]
    NotHeld(String),

    /// No exit in that direction.
    #[error("You can't go that way.")]
    NoExit,

    /// The verb makes no sense for the object.
    #[error("You can't {verb} the {noun}.")]
    Pointless {
        /// The verb as typed.
        verb: String,
        /// The object as typed.
        noun: String,
    },

    /// The game has ended.
    #[error("The game is over.")]
    Halted,
}
