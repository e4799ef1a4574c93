use comfy_table::{ContentArrangement, Table};

use crate::client::{ClientResult, GameClient};

/// Print the server's game catalog as a table.
pub async fn run(client: &GameClient) -> ClientResult<()> {
    let games = client.games().await?;

    if games.is_empty() {
        println!("  No games found on {}.", client.base_url());
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Name", "Path"]);
    for game in &games {
        table.add_row(vec![&game.name, &game.path]);
    }

    println!("{table}");
    println!();
    println!("  {} games", games.len());

    Ok(())
}
