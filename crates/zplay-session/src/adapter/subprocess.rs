use std::path::Path;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, warn};

use crate::config::{InterpreterCommand, SubprocessTiming};
use crate::error::{AdapterError, AdapterResult, LoadError, LoadResult};
use crate::transcript::{self, Transcript};

const READ_CHUNK: usize = 4096;

#[derive(Debug)]
struct Running {
    child: Child,
    stdin: ChildStdin,
    output: mpsc::UnboundedReceiver<Vec<u8>>,
}

#[derive(Debug)]
enum Stage {
    NotStarted,
    Running(Box<Running>),
    Halted,
    Disposed,
}

/// How a read ended.
#[derive(Debug, PartialEq, Eq)]
enum TurnEnd {
    Prompt,
    Quiet,
    Timeout,
    Exited,
}

/// Drives an external interpreter such as `dfrotz` over its standard
/// streams. One process per session; it is killed when the adapter is
/// disposed or dropped.
///
/// Turn boundaries are found by watching stdout: a turn ends when the output
/// ends with the prompt, when nothing new arrives for the idle window, or when
/// the turn timeout fires.
#[derive(Debug)]
pub struct SubprocessInterpreter {
    command: InterpreterCommand,
    timing: SubprocessTiming,
    title_token: Option<String>,
    stage: Stage,
}

impl SubprocessInterpreter {
    /// An adapter that will run `command` with the game path appended.
    pub fn new(
        command: InterpreterCommand,
        timing: SubprocessTiming,
        title_token: Option<String>,
    ) -> Self {
        Self {
            command,
            timing,
            title_token,
            stage: Stage::NotStarted,
        }
    }

    pub(crate) async fn start(&mut self, game: &Path) -> LoadResult<Transcript> {
        if !tokio::fs::try_exists(game).await.unwrap_or(false) {
            return Err(LoadError::Missing(game.to_path_buf()));
        }

        let spawn_error = |source| LoadError::Spawn {
            program: self.command.program.clone(),
            source,
        };
        let mut child = Command::new(&self.command.program)
            .args(&self.command.args)
            .arg(game)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(spawn_error)?;

        let missing = |stream: &str| spawn_error(std::io::Error::other(format!("{stream} not captured")));
        let stdin = child.stdin.take().ok_or_else(|| missing("stdin"))?;
        let stdout = child.stdout.take().ok_or_else(|| missing("stdout"))?;
        let stderr = child.stderr.take().ok_or_else(|| missing("stderr"))?;

        debug!(command = %self.command, game = %game.display(), pid = ?child.id(), "interpreter spawned");

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            let mut stdout = stdout;
            let mut buf = vec![0u8; READ_CHUNK];
            loop {
                match stdout.read(&mut buf).await {
                    Ok(0) => break,
                    Ok(n) => {
                        if tx.send(buf[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("interpreter stdout read error: {e}");
                        break;
                    }
                }
            }
        });
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let trimmed = line.trim();
                if !trimmed.is_empty() {
                    debug!(target: "zplay_session::interpreter_stderr", "{trimmed}");
                }
            }
        });

        let mut running = Box::new(Running {
            child,
            stdin,
            output: rx,
        });
        let deadline = Instant::now() + self.timing.startup_timeout;
        let (text, end) = read_turn(
            &mut running.output,
            deadline,
            None,
            self.title_token.as_deref(),
        )
        .await;
        debug!(?end, bytes = text.len(), "startup output collected");

        self.stage = if end == TurnEnd::Exited {
            Stage::Halted
        } else {
            Stage::Running(running)
        };
        Ok(Transcript::new(text))
    }

    pub(crate) async fn submit(&mut self, command: &str) -> AdapterResult<Transcript> {
        let running = match &mut self.stage {
            Stage::Running(running) => running,
            Stage::NotStarted => return Err(AdapterError::NotStarted),
            Stage::Halted => return Err(AdapterError::Halted),
            Stage::Disposed => return Err(AdapterError::Disposed),
        };

        // Anything printed between turns belongs to no one.
        while running.output.try_recv().is_ok() {}

        let command = first_line(command);
        let line = format!("{command}\n");
        let deadline = Instant::now() + self.timing.turn_timeout;
        let written = timeout_at(deadline, async {
            running.stdin.write_all(line.as_bytes()).await?;
            running.stdin.flush().await
        })
        .await;
        match written {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!("interpreter stdin closed: {e}");
                self.stage = Stage::Halted;
                return Err(AdapterError::Io(e));
            }
            Err(_) => {
                warn!("interpreter stopped reading input, killing it");
                if let Err(e) = running.child.start_kill() {
                    debug!("interpreter already gone: {e}");
                }
                self.stage = Stage::Halted;
                return Err(AdapterError::Unresponsive(self.timing.turn_timeout));
            }
        }

        let (text, end) =
            read_turn(&mut running.output, deadline, Some(self.timing.idle_window), None).await;
        match end {
            TurnEnd::Timeout => warn!(command, "interpreter turn hit the watchdog"),
            TurnEnd::Exited => {
                debug!("interpreter exited");
                self.stage = Stage::Halted;
            }
            TurnEnd::Prompt | TurnEnd::Quiet => {}
        }
        Ok(Transcript::new(text).strip_echo(command))
    }

    pub(crate) async fn dispose(&mut self) {
        if let Stage::Running(mut running) = std::mem::replace(&mut self.stage, Stage::Disposed) {
            if let Err(e) = running.child.start_kill() {
                debug!("interpreter already gone: {e}");
            }
            match running.child.wait().await {
                Ok(status) => debug!(%status, "interpreter reaped"),
                Err(e) => debug!("cannot reap interpreter: {e}"),
            }
        }
        self.stage = Stage::Disposed;
    }

    pub(crate) fn is_halted(&self) -> bool {
        matches!(self.stage, Stage::Halted | Stage::Disposed)
    }
}

/// The command up to its first line break. Interpreters read one line per
/// turn, so anything after it would start an unseen extra turn.
fn first_line(command: &str) -> &str {
    command.split(['\r', '\n']).next().unwrap_or_default()
}

/// Collect stdout until the turn ends.
///
/// With an idle window the read stops once output has started and then gone
/// quiet. Without one it waits for the prompt, the title token, or the
/// deadline.
async fn read_turn(
    output: &mut mpsc::UnboundedReceiver<Vec<u8>>,
    deadline: Instant,
    idle: Option<std::time::Duration>,
    title: Option<&str>,
) -> (String, TurnEnd) {
    let mut bytes = Vec::new();
    loop {
        let wait_until = match idle {
            Some(idle) if !bytes.is_empty() => deadline.min(Instant::now() + idle),
            _ => deadline,
        };
        match timeout_at(wait_until, output.recv()).await {
            Ok(Some(chunk)) => {
                bytes.extend_from_slice(&chunk);
                let text = String::from_utf8_lossy(&bytes);
                if transcript::ends_with_prompt(&text) {
                    return (text.into_owned(), TurnEnd::Prompt);
                }
                if title.is_some_and(|token| text.contains(token)) {
                    return (text.into_owned(), TurnEnd::Prompt);
                }
            }
            Ok(None) => return (String::from_utf8_lossy(&bytes).into_owned(), TurnEnd::Exited),
            Err(_) => {
                let end = if Instant::now() >= deadline {
                    TurnEnd::Timeout
                } else {
                    TurnEnd::Quiet
                };
                return (String::from_utf8_lossy(&bytes).into_owned(), end);
            }
        }
    }
}
