use std::path::Path;

use tracing::debug;
use zplay_stub::StubGame;

use crate::error::{AdapterError, AdapterResult, LoadResult};
use crate::transcript::Transcript;

/// Plays the scripted fixture game. The game path is ignored.
#[derive(Debug, Default)]
pub struct ScriptedStub {
    game: Option<StubGame>,
    disposed: bool,
}

impl ScriptedStub {
    /// An unstarted stub.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn start(&mut self, game: &Path) -> LoadResult<Transcript> {
        debug!(ignored = %game.display(), "starting scripted game");
        let stub = StubGame::new();
        let opening = Transcript::new(stub.opening());
        self.game = Some(stub);
        self.disposed = false;
        Ok(opening)
    }

    pub(crate) fn submit(&mut self, command: &str) -> AdapterResult<Transcript> {
        if self.disposed {
            return Err(AdapterError::Disposed);
        }
        let game = self.game.as_mut().ok_or(AdapterError::NotStarted)?;
        if game.is_halted() {
            return Err(AdapterError::Halted);
        }
        Ok(Transcript::new(game.process(command)))
    }

    pub(crate) fn dispose(&mut self) {
        self.game = None;
        self.disposed = true;
    }

    pub(crate) fn is_halted(&self) -> bool {
        self.disposed || self.game.as_ref().is_some_and(StubGame::is_halted)
    }
}
