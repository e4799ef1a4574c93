//! Session and backend configuration.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Which adapter variant new sessions use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    /// The built-in Z-machine.
    #[default]
    InProcess,
    /// An external interpreter process per session.
    Subprocess,
    /// The scripted fixture game.
    Stub,
}

impl Backend {
    /// The configuration spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProcess => "in-process",
            Self::Subprocess => "subprocess",
            Self::Stub => "stub",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "in-process" | "inprocess" | "native" => Ok(Self::InProcess),
            "subprocess" | "process" | "frotz" => Ok(Self::Subprocess),
            "stub" | "mock" | "scripted" => Ok(Self::Stub),
            other => Err(format!(
                "unknown backend '{other}' (expected in-process, subprocess or stub)"
            )),
        }
    }
}

/// Program and leading arguments for the subprocess backend. The game path
/// is appended as the final argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpreterCommand {
    /// Executable name or path.
    pub program: String,
    /// Arguments placed before the game path.
    pub args: Vec<String>,
}

impl InterpreterCommand {
    /// Build from a program and arguments.
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Split a whitespace-separated command line. `None` when blank.
    pub fn parse(line: &str) -> Option<Self> {
        let mut words = line.split_whitespace();
        let program = words.next()?;
        Some(Self::new(program, words))
    }
}

impl Default for InterpreterCommand {
    fn default() -> Self {
        Self::new("dfrotz", ["-m", "-p", "-q"])
    }
}

impl fmt::Display for InterpreterCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Turn detection timings for the subprocess backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubprocessTiming {
    /// Longest wait for the opening text.
    pub startup_timeout: Duration,
    /// Quiet period that ends a turn once output has started.
    pub idle_window: Duration,
    /// Hard limit on one turn.
    pub turn_timeout: Duration,
}

impl Default for SubprocessTiming {
    fn default() -> Self {
        Self {
            startup_timeout: Duration::from_secs(10),
            idle_window: Duration::from_millis(100),
            turn_timeout: Duration::from_secs(5),
        }
    }
}

/// Configuration shared by every session in a registry.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Adapter variant for new sessions.
    pub backend: Backend,
    /// Game used when a request names none.
    pub default_game: PathBuf,
    /// Directory listed by the catalog and used to resolve relative paths.
    pub games_dir: PathBuf,
    /// Command line for the subprocess backend.
    pub interpreter: InterpreterCommand,
    /// Extra end-of-startup marker for the subprocess backend.
    pub title_token: Option<String>,
    /// Subprocess turn detection timings.
    pub timing: SubprocessTiming,
    /// Instruction budget per turn for the in-process backend.
    pub step_budget: u64,
    /// Fixed RNG seed for the in-process backend; random when unset.
    pub seed: Option<u64>,
    /// Maximum number of live sessions.
    pub max_sessions: usize,
    /// Sessions idle longer than this are evicted.
    pub idle_timeout: Duration,
    /// How often the server sweeps idle sessions.
    pub sweep_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            default_game: PathBuf::from("games/zork1.z3"),
            games_dir: PathBuf::from("games"),
            interpreter: InterpreterCommand::default(),
            title_token: None,
            timing: SubprocessTiming::default(),
            step_budget: zplay_zmachine::DEFAULT_STEP_BUDGET,
            seed: None,
            max_sessions: 256,
            idle_timeout: Duration::from_secs(30 * 60),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

fn invalid(key: &'static str, value: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError {
        key,
        value: value.to_string(),
        reason: reason.into(),
    }
}

impl SessionConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, starting from the defaults.
    ///
    /// Recognised keys: `ZPLAY_BACKEND`, `ZPLAY_DEFAULT_GAME`,
    /// `ZPLAY_GAMES_DIR`, `ZPLAY_INTERPRETER`, `ZPLAY_TITLE_TOKEN`,
    /// `ZPLAY_MAX_SESSIONS` and `ZPLAY_IDLE_TIMEOUT_SECS`.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup("ZPLAY_BACKEND") {
            config.backend = value
                .parse()
                .map_err(|reason: String| invalid("ZPLAY_BACKEND", &value, reason))?;
        }
        if let Some(value) = lookup("ZPLAY_DEFAULT_GAME") {
            config.default_game = PathBuf::from(value);
        }
        if let Some(value) = lookup("ZPLAY_GAMES_DIR") {
            config.games_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup("ZPLAY_INTERPRETER") {
            config.interpreter = InterpreterCommand::parse(&value)
                .ok_or_else(|| invalid("ZPLAY_INTERPRETER", &value, "empty command line"))?;
        }
        if let Some(value) = lookup("ZPLAY_TITLE_TOKEN") {
            config.title_token = Some(value).filter(|token| !token.is_empty());
        }
        if let Some(value) = lookup("ZPLAY_MAX_SESSIONS") {
            let max = value
                .trim()
                .parse::<usize>()
                .map_err(|e| invalid("ZPLAY_MAX_SESSIONS", &value, e.to_string()))?;
            config = config.with_max_sessions(max);
        }
        if let Some(value) = lookup("ZPLAY_IDLE_TIMEOUT_SECS") {
            let secs = value
                .trim()
                .parse::<u64>()
                .map_err(|e| invalid("ZPLAY_IDLE_TIMEOUT_SECS", &value, e.to_string()))?;
            config.idle_timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    /// Set the backend.
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    /// Set the default game path.
    pub fn with_default_game(mut self, path: impl Into<PathBuf>) -> Self {
        self.default_game = path.into();
        self
    }

    /// Set the games directory.
    pub fn with_games_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.games_dir = dir.into();
        self
    }

    /// Set the subprocess command line.
    pub fn with_interpreter(mut self, interpreter: InterpreterCommand) -> Self {
        self.interpreter = interpreter;
        self
    }

    /// Set the subprocess startup title token.
    pub fn with_title_token(mut self, token: impl Into<String>) -> Self {
        self.title_token = Some(token.into());
        self
    }

    /// Set the subprocess timings.
    pub fn with_timing(mut self, timing: SubprocessTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Set the in-process instruction budget (at least 1).
    pub fn with_step_budget(mut self, steps: u64) -> Self {
        self.step_budget = steps.max(1);
        self
    }

    /// Fix the in-process RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the session limit (at least 1).
    pub fn with_max_sessions(mut self, max: usize) -> Self {
        self.max_sessions = max.max(1);
        self
    }

    /// Set the idle timeout.
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Set the sweep interval.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Resolve a requested game path.
    ///
    /// Blank or missing requests use the default game. Relative paths that do
    /// not exist as given are looked up inside the games directory.
    pub fn resolve_game(&self, requested: Option<&str>) -> PathBuf {
        let path = requested
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map_or_else(|| self.default_game.clone(), PathBuf::from);
        if path.is_relative() && !path.exists() {
            let candidate = self.games_dir.join(&path);
            if candidate.exists() {
                return candidate;
            }
        }
        path
    }

    /// The games directory.
    pub fn games_dir(&self) -> &Path {
        &self.games_dir
    }
}
