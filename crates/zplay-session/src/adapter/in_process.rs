use std::path::Path;

use tracing::{debug, warn};
use zplay_zmachine::{FaultResult, Machine, Progress, Suspended};

use crate::error::{AdapterError, AdapterResult, LoadError, LoadResult};
use crate::transcript::Transcript;

#[derive(Debug)]
enum Stage {
    NotStarted,
    Waiting(Box<Suspended>),
    Halted,
    Disposed,
}

/// Runs version 3 stories on the built-in Z-machine.
///
/// The machine executes on the blocking thread pool. Between turns the
/// adapter holds the [`Suspended`] continuation the machine returned at its
/// last `sread`.
#[derive(Debug)]
pub struct InProcessInterpreter {
    step_budget: u64,
    seed: Option<u64>,
    stage: Stage,
}

impl InProcessInterpreter {
    /// An adapter with the given per-turn instruction budget and optional
    /// fixed seed.
    pub fn new(step_budget: u64, seed: Option<u64>) -> Self {
        Self {
            step_budget,
            seed,
            stage: Stage::NotStarted,
        }
    }

    pub(crate) async fn start(&mut self, game: &Path) -> LoadResult<Transcript> {
        let bytes = tokio::fs::read(game).await.map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                LoadError::Missing(game.to_path_buf())
            } else {
                LoadError::Unreadable {
                    path: game.to_path_buf(),
                    source,
                }
            }
        })?;

        let mut machine = Machine::load(bytes)
            .map_err(|source| LoadError::Unsupported {
                path: game.to_path_buf(),
                source,
            })?
            .with_step_budget(self.step_budget);
        if let Some(seed) = self.seed {
            machine = machine.with_seed(seed);
        }
        debug!(
            release = machine.header().release,
            serial = %machine.header().serial,
            "story loaded"
        );

        let (stage, output) = run_turn(move |screen| machine.start(screen))
            .await
            .map_err(LoadError::Interpreter)?;
        self.stage = stage;
        Ok(Transcript::new(output))
    }

    pub(crate) async fn submit(&mut self, command: &str) -> AdapterResult<Transcript> {
        let suspended = match std::mem::replace(&mut self.stage, Stage::Halted) {
            Stage::Waiting(suspended) => suspended,
            other => {
                let err = match other {
                    Stage::NotStarted => AdapterError::NotStarted,
                    Stage::Disposed => AdapterError::Disposed,
                    _ => AdapterError::Halted,
                };
                self.stage = other;
                return Err(err);
            }
        };

        let line = command.to_string();
        let (stage, output) = run_turn(move |screen| suspended.resume(&line, screen))
            .await
            .map_err(AdapterError::Crashed)?;
        self.stage = stage;
        Ok(Transcript::new(output))
    }

    pub(crate) fn dispose(&mut self) {
        self.stage = Stage::Disposed;
    }

    pub(crate) fn is_halted(&self) -> bool {
        !matches!(self.stage, Stage::Waiting(_) | Stage::NotStarted)
    }
}

/// Run one turn on the blocking pool. Faults are logged and end the story;
/// whatever was printed before the fault is still returned.
async fn run_turn<F>(turn: F) -> Result<(Stage, String), String>
where
    F: FnOnce(&mut String) -> FaultResult<Progress> + Send + 'static,
{
    let (result, output) = tokio::task::spawn_blocking(move || {
        let mut screen = String::new();
        let result = turn(&mut screen);
        (result, screen)
    })
    .await
    .map_err(|e| e.to_string())?;

    let stage = match result {
        Ok(Progress::AwaitingInput(suspended)) => Stage::Waiting(Box::new(suspended)),
        Ok(Progress::Halted) => {
            debug!("story quit");
            Stage::Halted
        }
        Err(fault) => {
            warn!(%fault, "interpreter fault, halting story");
            Stage::Halted
        }
    };
    Ok((stage, output))
}
