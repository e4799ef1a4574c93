//! Integration tests.

#![cfg(unix)]

use std::sync::Arc;
use std::time::Duration;

use zplay_session::{
    AdapterError, Backend, InterpreterCommand, LoadError, SessionConfig, SessionError,
    SessionRegistry, SubprocessTiming,
};

/// Echoes each line back the way dumb-terminal interpreters do, answers it,
/// and prints a prompt. `slow` stalls for a second first; `quit` exits.
const FAKE_INTERPRETER: &str = r#"
printf 'Fake interpreter playing %s\n>' "$(basename "$1")"
while IFS= read -r line; do
  if [ "$line" = slow ]; then sleep 1; fi
  printf '%s\n' "$line"
  if [ "$line" = quit ]; then printf 'Bye.\n'; exit 0; fi
  printf 'You said: %s\n>' "$line"
done
"#;

fn config(games: &std::path::Path) -> SessionConfig {
    SessionConfig::default()
        .with_backend(Backend::Subprocess)
        .with_games_dir(games)
        .with_interpreter(InterpreterCommand::new("sh", ["-c", FAKE_INTERPRETER, "fake"]))
        .with_timing(SubprocessTiming {
            startup_timeout: Duration::from_secs(5),
            idle_window: Duration::from_millis(300),
            turn_timeout: Duration::from_secs(5),
        })
}

/// Numbers every line it reads, without echoing.
const COUNTING_INTERPRETER: &str = r#"
printf 'Ready.\n>'
n=0
while IFS= read -r line; do
  n=$((n + 1))
  printf 'Line %s: %s\n>' "$n" "$line"
done
"#;

/// Config running `script` with a one-second turn timeout.
fn scripted(games: &std::path::Path, script: &str) -> SessionConfig {
    config(games)
        .with_interpreter(InterpreterCommand::new("sh", ["-c", script, "fake"]))
        .with_timing(SubprocessTiming {
            startup_timeout: Duration::from_secs(5),
            idle_window: Duration::from_millis(300),
            turn_timeout: Duration::from_secs(1),
        })
}

fn games_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("story.z5"), b"opaque to the fake").unwrap();
    dir
}

#[tokio::test]
async fn startup_reads_up_to_the_prompt() {
    let dir = games_dir();
    let registry = SessionRegistry::new(config(dir.path()));

    let created = registry.create_session(Some("story.z5")).await.unwrap();
    assert_eq!(created.output.as_str(), "Fake interpreter playing story.z5\n>");
    registry.shutdown().await;
}

#[tokio::test]
async fn echoed_command_is_stripped() {
    let dir = games_dir();
    let registry = SessionRegistry::new(config(dir.path()));
    let id = registry
        .create_session(Some("story.z5"))
        .await
        .unwrap()
        .id
        .to_string();

    let first = registry.send_command(&id, "open mailbox").await.unwrap();
    assert_eq!(first.as_str(), "You said: open mailbox\n>");
    let second = registry.send_command(&id, "north").await.unwrap();
    assert_eq!(second.as_str(), "You said: north\n>");
    registry.shutdown().await;
}

#[tokio::test]
async fn quitting_halts_the_session() {
    let dir = games_dir();
    let registry = SessionRegistry::new(config(dir.path()));
    let id = registry
        .create_session(Some("story.z5"))
        .await
        .unwrap()
        .id
        .to_string();

    let bye = registry.send_command(&id, "quit").await.unwrap();
    assert!(bye.as_str().contains("Bye."));

    let err = registry.send_command(&id, "look").await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Adapter(AdapterError::Halted | AdapterError::Io(_))
    ));
    assert!(registry.delete_session(&id).await);
}

#[tokio::test]
async fn missing_game_and_missing_program_fail_to_load() {
    let dir = games_dir();
    let registry = SessionRegistry::new(config(dir.path()));
    let err = registry.create_session(Some("absent.z5")).await.unwrap_err();
    assert!(matches!(err, SessionError::Load(LoadError::Missing(_))));

    let registry = SessionRegistry::new(
        config(dir.path())
            .with_interpreter(InterpreterCommand::new("zplay-no-such-interpreter", ["-q"])),
    );
    let err = registry.create_session(Some("story.z5")).await.unwrap_err();
    assert!(matches!(err, SessionError::Load(LoadError::Spawn { .. })));
    assert!(registry.is_empty().await);
}

#[tokio::test]
async fn second_command_on_a_busy_session_is_refused() {
    let dir = games_dir();
    let registry = Arc::new(SessionRegistry::new(config(dir.path())));
    let id = registry
        .create_session(Some("story.z5"))
        .await
        .unwrap()
        .id
        .to_string();

    let slow = {
        let registry = Arc::clone(&registry);
        let id = id.clone();
        tokio::spawn(async move { registry.send_command(&id, "slow").await })
    };
    tokio::time::sleep(Duration::from_millis(200)).await;

    let err = registry.send_command(&id, "look").await.unwrap_err();
    assert!(matches!(err, SessionError::Busy(_)));
    // Reads still work while the turn is in flight.
    assert!(registry.last_output(&id).await.is_ok());

    let finished = slow.await.unwrap().unwrap();
    assert_eq!(finished.as_str(), "You said: slow\n>");
    registry.shutdown().await;
}

#[tokio::test]
async fn disposing_twice_is_harmless() {
    let dir = games_dir();
    let mut adapter = zplay_session::Adapter::for_config(&config(dir.path()));
    adapter.start(&dir.path().join("story.z5")).await.unwrap();
    adapter.dispose().await;
    adapter.dispose().await;
    assert!(adapter.is_halted());
    assert!(matches!(
        adapter.submit("look").await,
        Err(AdapterError::Disposed)
    ));
}

#[tokio::test]
async fn interpreter_that_stops_reading_is_killed_at_the_turn_timeout() {
    let dir = games_dir();
    let registry = SessionRegistry::new(scripted(dir.path(), "printf '>'; exec sleep 60"));
    let id = registry
        .create_session(Some("story.z5"))
        .await
        .unwrap()
        .id
        .to_string();

    // Far larger than a pipe buffer, so the write itself blocks.
    let command = "a".repeat(1 << 20);
    let started = std::time::Instant::now();
    let result = tokio::time::timeout(
        Duration::from_secs(5),
        registry.send_command(&id, &command),
    )
    .await
    .expect("the turn timeout should bound a blocked write");
    assert!(started.elapsed() < Duration::from_secs(4));
    assert!(matches!(
        result,
        Err(SessionError::Adapter(AdapterError::Unresponsive(_)))
    ));

    // The lock was released and the story is over.
    assert!(matches!(
        registry.send_command(&id, "look").await,
        Err(SessionError::Adapter(AdapterError::Halted))
    ));
    assert!(registry.delete_session(&id).await);
}

#[tokio::test]
async fn silent_turn_ends_at_the_watchdog() {
    let dir = games_dir();
    let registry = SessionRegistry::new(scripted(dir.path(), "printf '>'; exec cat >/dev/null"));
    let id = registry
        .create_session(Some("story.z5"))
        .await
        .unwrap()
        .id
        .to_string();

    let started = std::time::Instant::now();
    let output = registry.send_command(&id, "look").await.unwrap();
    let elapsed = started.elapsed();

    assert!(output.is_empty());
    assert!(elapsed >= Duration::from_secs(1));
    assert!(elapsed < Duration::from_secs(3));
    registry.shutdown().await;
}

#[tokio::test]
async fn only_the_first_line_of_a_command_is_sent() {
    let dir = games_dir();
    let mut adapter = zplay_session::Adapter::for_config(&scripted(dir.path(), COUNTING_INTERPRETER));
    adapter.start(&dir.path().join("story.z5")).await.unwrap();

    let first = adapter.submit("north\nsouth").await.unwrap();
    assert_eq!(first.as_str(), "Line 1: north\n>");
    // Had "south" been written it would have been line 2.
    let second = adapter.submit("look").await.unwrap();
    assert_eq!(second.as_str(), "Line 2: look\n>");
    adapter.dispose().await;
}
