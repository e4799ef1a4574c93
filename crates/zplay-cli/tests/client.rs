//! Integration tests for the game client.

use std::sync::Arc;

use tokio::net::TcpListener;
use zplay_cli::commands::play::{self, Player};
use zplay_cli::{ClientError, GameClient};
use zplay_server::{AppState, serve};
use zplay_session::{Backend, SessionConfig, SessionRegistry};

async fn stub_server() -> (GameClient, Arc<SessionRegistry>) {
    let registry = Arc::new(SessionRegistry::new(
        SessionConfig::default().with_backend(Backend::Stub),
    ));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(
        listener,
        AppState::new(Arc::clone(&registry)),
        std::future::pending(),
    ));
    (GameClient::new(format!("http://{addr}")), registry)
}

#[tokio::test]
async fn health_and_games() {
    let (client, _registry) = stub_server().await;
    assert_eq!(client.health().await.unwrap().status, "ok");
    // The default games directory does not exist in the test's working dir.
    assert!(client.games().await.unwrap().is_empty());
}

#[tokio::test]
async fn session_lifecycle() {
    let (client, registry) = stub_server().await;
    let created = client.create_session(None).await.unwrap();
    assert!(created.output.contains("West of House"));

    let turn = client.send(&created.session_id, "open mailbox").await.unwrap();
    assert_eq!(turn.command, "open mailbox");
    assert!(turn.output.contains("brochure"));

    client.delete(&created.session_id).await.unwrap();
    assert!(registry.is_empty().await);

    let err = client.send(&created.session_id, "look").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn lost_session_is_recreated_once() {
    let (client, registry) = stub_server().await;
    let (mut player, opening) = Player::start(client, None).await.unwrap();
    assert!(opening.contains("West of House"));
    let first_id = player.session_id().to_string();

    registry.shutdown().await;

    let output = player.turn("open mailbox").await.unwrap();
    assert!(output.contains("brochure"));
    assert_ne!(player.session_id(), first_id);
    assert_eq!(registry.len().await, 1);

    player.finish().await.unwrap();
    assert!(registry.is_empty().await);
}

#[tokio::test]
async fn play_loop_runs_until_quit() {
    let (client, registry) = stub_server().await;
    let input = b"open mailbox\n\ntake brochure\nquit\nnever sent\n";
    let mut out = Vec::new();

    play::run(client, None, &input[..], &mut out).await.unwrap();

    let transcript = String::from_utf8(out).unwrap();
    assert!(transcript.contains("West of House"));
    assert!(transcript.contains("you see a brochure"));
    assert!(transcript.contains("Taken."));
    assert!(!transcript.contains("never sent"));
    assert!(registry.is_empty().await);
}

#[tokio::test]
async fn play_loop_survives_a_finished_story() {
    let (client, registry) = stub_server().await;
    let mut out = Vec::new();

    play::run(client, None, &b"quit game\nlook\n"[..], &mut out)
        .await
        .unwrap();

    let transcript = String::from_utf8(out).unwrap();
    assert!(transcript.contains("the game has ended"));
    assert!(registry.is_empty().await);
}

// Single-threaded runtime: the loop must yield while waiting for input or
// the server and the typist never get to run.
#[tokio::test]
async fn play_loop_waits_for_slow_input_without_blocking() {
    use tokio::io::AsyncWriteExt;

    let (client, registry) = stub_server().await;
    let (reader, mut typist) = tokio::io::duplex(64);
    tokio::spawn(async move {
        for line in ["open mailbox\n", "quit\n"] {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            typist.write_all(line.as_bytes()).await.unwrap();
        }
    });
    let mut out = Vec::new();

    play::run(client, None, tokio::io::BufReader::new(reader), &mut out)
        .await
        .unwrap();

    let transcript = String::from_utf8(out).unwrap();
    assert!(transcript.contains("you see a brochure"));
    assert!(registry.is_empty().await);
}

#[tokio::test]
async fn unreachable_server_is_a_connect_error() {
    let client = GameClient::new("http://127.0.0.1:1");
    let err = client.health().await.unwrap_err();
    assert!(matches!(err, ClientError::Connect { .. }));
}
