//! `zplay`: play interactive fiction on a zplay server.

use std::io;

use clap::{Parser, Subcommand};
use zplay_cli::{DEFAULT_SERVER, GameClient, commands};

#[derive(Parser)]
#[command(
    name = "zplay",
    about = "Play interactive fiction through a zplay server",
    version,
    propagate_version = true
)]
struct Cli {
    /// Server base URL
    #[arg(long, global = true, env = "ZPLAY_SERVER", default_value = DEFAULT_SERVER)]
    server: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a game and play it interactively (the default)
    Play {
        /// Story file on the server (default: the server's default game)
        #[arg(short, long)]
        game: Option<String>,
    },

    /// List the games the server can load
    Games,

    /// Check that the server is up
    Health,
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    let client = GameClient::new(cli.server);

    match cli.command.unwrap_or(Commands::Play { game: None }) {
        Commands::Play { game } => {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            commands::play::run(client, game, stdin, &mut io::stdout()).await?
        }
        Commands::Games => commands::games::run(&client).await?,
        Commands::Health => commands::health::run(&client).await?,
    }

    Ok(())
}
