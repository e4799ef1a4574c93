//! Interpreter adapter variants.
//!
//! [`Adapter`] is a closed set of backends selected from configuration when a
//! session is created. Every variant honours the same contract:
//!
//! - `start` loads the game and returns everything printed up to the first
//!   request for input.
//! - `submit` delivers one line and returns only the output of that turn.
//! - `dispose` releases the backend's resources and may be called repeatedly.

mod in_process;
mod stub;
mod subprocess;

use std::path::Path;

pub use in_process::InProcessInterpreter;
pub use stub::ScriptedStub;
pub use subprocess::SubprocessInterpreter;

use crate::config::{Backend, SessionConfig};
use crate::error::{AdapterResult, LoadResult};
use crate::transcript::Transcript;

/// One running game, whichever backend drives it.
#[derive(Debug)]
pub enum Adapter {
    /// Built-in Z-machine.
    InProcess(InProcessInterpreter),
    /// External interpreter over pipes.
    Subprocess(SubprocessInterpreter),
    /// Scripted fixture game.
    Stub(ScriptedStub),
}

impl Adapter {
    /// A fresh, unstarted adapter of the configured variant.
    pub fn for_config(config: &SessionConfig) -> Self {
        match config.backend {
            Backend::InProcess => {
                Self::InProcess(InProcessInterpreter::new(config.step_budget, config.seed))
            }
            Backend::Subprocess => Self::Subprocess(SubprocessInterpreter::new(
                config.interpreter.clone(),
                config.timing,
                config.title_token.clone(),
            )),
            Backend::Stub => Self::Stub(ScriptedStub::new()),
        }
    }

    /// Which backend this is.
    pub fn kind(&self) -> Backend {
        match self {
            Self::InProcess(_) => Backend::InProcess,
            Self::Subprocess(_) => Backend::Subprocess,
            Self::Stub(_) => Backend::Stub,
        }
    }

    /// Load the game and run to the first input request.
    pub async fn start(&mut self, game: &Path) -> LoadResult<Transcript> {
        match self {
            Self::InProcess(adapter) => adapter.start(game).await,
            Self::Subprocess(adapter) => adapter.start(game).await,
            Self::Stub(adapter) => adapter.start(game),
        }
    }

    /// Play one turn.
    pub async fn submit(&mut self, command: &str) -> AdapterResult<Transcript> {
        match self {
            Self::InProcess(adapter) => adapter.submit(command).await,
            Self::Subprocess(adapter) => adapter.submit(command).await,
            Self::Stub(adapter) => adapter.submit(command),
        }
    }

    /// Release resources. Safe to call more than once.
    pub async fn dispose(&mut self) {
        match self {
            Self::InProcess(adapter) => adapter.dispose(),
            Self::Subprocess(adapter) => adapter.dispose().await,
            Self::Stub(adapter) => adapter.dispose(),
        }
    }

    /// Whether the game has ended and accepts no more input.
    pub fn is_halted(&self) -> bool {
        match self {
            Self::InProcess(adapter) => adapter.is_halted(),
            Self::Subprocess(adapter) => adapter.is_halted(),
            Self::Stub(adapter) => adapter.is_halted(),
        }
    }
}
