use std::io::Write;

use colored::Colorize;
use reqwest::StatusCode;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::client::{ClientResult, GameClient, strip_prompt};

/// One game being played against the server.
///
/// When the server has forgotten the session (idle eviction, a restart) the
/// next command starts a fresh session on the same game and is resubmitted
/// once.
#[derive(Debug)]
pub struct Player {
    client: GameClient,
    game: Option<String>,
    session_id: String,
}

impl Player {
    /// Start a session and return the player with the opening text.
    pub async fn start(client: GameClient, game: Option<String>) -> ClientResult<(Self, String)> {
        let created = client.create_session(game.as_deref()).await?;
        // Pin the resolved path so a recreated session plays the same story.
        let game = game.or(Some(created.game_path));
        let player = Self {
            client,
            game,
            session_id: created.session_id,
        };
        Ok((player, created.output))
    }

    /// The current session id.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Submit one command and return its output.
    pub async fn turn(&mut self, command: &str) -> ClientResult<String> {
        match self.client.send(&self.session_id, command).await {
            Ok(reply) => Ok(reply.output),
            Err(err) if err.is_not_found() => {
                let created = self.client.create_session(self.game.as_deref()).await?;
                self.session_id = created.session_id;
                let reply = self.client.send(&self.session_id, command).await?;
                Ok(reply.output)
            }
            Err(err) => Err(err),
        }
    }

    /// Delete the session. A session the server already dropped is fine.
    pub async fn finish(self) -> ClientResult<()> {
        match self.client.delete(&self.session_id).await {
            Err(err) if !err.is_not_found() => Err(err),
            _ => Ok(()),
        }
    }
}

fn is_quit(input: &str) -> bool {
    input.eq_ignore_ascii_case("quit") || input.eq_ignore_ascii_case("exit")
}

/// Play interactively, reading commands from `input` until `quit`, `exit`
/// or end of input.
pub async fn run(
    client: GameClient,
    game: Option<String>,
    mut input: impl AsyncBufRead + Unpin,
    out: &mut impl Write,
) -> ClientResult<()> {
    let (mut player, opening) = Player::start(client, game).await?;
    writeln!(out, "{}\n", strip_prompt(&opening))?;

    let mut line = String::new();
    loop {
        write!(out, "> ")?;
        out.flush()?;

        line.clear();
        if input.read_line(&mut line).await? == 0 {
            writeln!(out)?;
            break;
        }

        let command = line.trim();
        if command.is_empty() {
            continue;
        }
        if is_quit(command) {
            break;
        }

        match player.turn(command).await {
            Ok(output) => writeln!(out, "{}\n", strip_prompt(&output))?,
            Err(err) if err.status() == Some(StatusCode::CONFLICT) => {
                writeln!(out, "{}\n", err.to_string().yellow())?;
            }
            Err(err) => return Err(err),
        }
    }

    player.finish().await
}
