//! Error types for the Z-machine.

use thiserror::Error;

/// Result type for loading a story.
pub type LoadResult<T> = Result<T, LoadError>;

/// Result type for executing a story.
pub type FaultResult<T> = Result<T, Fault>;

/// Errors raised while loading a story image.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The image is shorter than the 64-byte header.
    #[error("story file is too small ({0} bytes)")]
    TooSmall(usize),

    /// The story targets a Z-machine version this interpreter cannot run.
    #[error("unsupported story version {0} (only version 3 is supported)")]
    UnsupportedVersion(u8),

    /// A header field points outside the image or is inconsistent.
    #[error("corrupt story header: {0}")]
    CorruptHeader(String),
}

/// A genuine runtime fault. Waiting for input is never a fault.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Fault {
    /// The opcode byte does not name a valid instruction.
    #[error("illegal opcode {opcode:#04x} at {pc:#06x}")]
    IllegalOpcode {
        /// The offending opcode byte.
        opcode: u8,
        /// Address of the instruction.
        pc: usize,
    },

    /// The instruction exists but only in later Z-machine versions.
    #[error("unsupported instruction {name} at {pc:#06x}")]
    Unsupported {
        /// Mnemonic of the instruction.
        name: &'static str,
        /// Address of the instruction.
        pc: usize,
    },

    /// A read or write fell outside the story image.
    #[error("memory access out of bounds at {0:#06x}")]
    OutOfBounds(usize),

    /// The story tried to write into static or high memory.
    #[error("write to read-only memory at {0:#06x}")]
    ReadOnly(usize),

    /// A value was popped from an empty routine stack.
    #[error("stack underflow")]
    StackUnderflow,

    /// The main routine executed a return.
    #[error("return from the main routine")]
    ReturnFromMain,

    /// A `div` or `mod` instruction had a zero divisor.
    #[error("division by zero at {0:#06x}")]
    DivisionByZero(usize),

    /// An object number outside the object table.
    #[error("invalid object {0}")]
    InvalidObject(u16),

    /// The sibling chain under this parent never ends.
    #[error("object tree under {0} contains a cycle")]
    ObjectCycle(u16),

    /// An attribute number outside 0-31.
    #[error("invalid attribute {0}")]
    InvalidAttribute(u16),

    /// `put_prop` or `get_next_prop` on a property the object lacks.
    #[error("object {object} has no property {property}")]
    MissingProperty {
        /// Object number.
        object: u16,
        /// Property number.
        property: u16,
    },

    /// A local variable index beyond the current routine's locals.
    #[error("invalid local variable {0}")]
    InvalidVariable(u8),

    /// A routine header declared more than 15 locals.
    #[error("routine at {0:#06x} declares too many locals")]
    BadRoutine(usize),

    /// The per-turn instruction budget ran out, most likely an endless loop.
    #[error("instruction budget of {0} steps exhausted")]
    BudgetExhausted(u64),
}
