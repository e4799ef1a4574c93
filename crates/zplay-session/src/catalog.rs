//! Game catalog discovery.

use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// File extensions recognised as story files.
pub const STORY_EXTENSIONS: &[&str] = &["z1", "z2", "z3", "z4", "z5", "z6", "z7", "z8", "zip"];

/// One playable game file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameEntry {
    /// File name.
    pub name: String,
    /// Path usable as a session `gamePath`.
    pub path: PathBuf,
}

/// Whether `path` has a story file extension (case-insensitive).
pub fn is_story_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| STORY_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// List story files directly inside `dir`, sorted by name. A missing
/// directory is an empty catalog.
pub async fn list_games(dir: &Path) -> io::Result<Vec<GameEntry>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut games = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !entry.file_type().await?.is_file() || !is_story_file(&path) {
            continue;
        }
        games.push(GameEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            path,
        });
    }
    games.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(games)
}
