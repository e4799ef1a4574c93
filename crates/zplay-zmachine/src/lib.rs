//! Z-machine interpreter for zplay.
//!
//! Runs version 3 story files entirely in-process. Execution never blocks on
//! input: when the story asks for a line of text the machine hands back a
//! [`Suspended`] continuation that owns the full machine state, and the host
//! resumes it with [`Suspended::resume`] once the player's command arrives.
//! Output is streamed to any [`Screen`] implementation.

/// Dictionary lookup and input tokenization.
pub mod dictionary;
/// Error types for loading and running stories.
pub mod error;
/// Story file header parsing and validation.
pub mod header;
/// Instruction decoding.
pub mod instruction;
/// Machine state and the execution loop.
pub mod machine;
/// Bounds-checked story memory.
pub mod memory;
/// Object tree and property tables.
pub mod object;
/// Output sink abstraction.
pub mod screen;
/// ZSCII text encoding and decoding.
pub mod text;

pub use error::{Fault, FaultResult, LoadError, LoadResult};
pub use header::Header;
pub use machine::{DEFAULT_STEP_BUDGET, Machine, Progress, ReadRequest, Suspended};
pub use screen::Screen;
pub use text::encode_text;
