use colored::Colorize;

use crate::client::{ClientResult, GameClient};

/// Print whether the server is up.
pub async fn run(client: &GameClient) -> ClientResult<()> {
    let health = client.health().await?;
    let status = if health.status == "ok" {
        health.status.green().bold()
    } else {
        health.status.yellow().bold()
    };
    println!("  {} {status} at {}", client.base_url(), health.timestamp.dimmed());
    Ok(())
}
