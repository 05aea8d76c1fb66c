use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::pipeline::EntityGraph;

pub const RAW_RECORDS_FILE: &str = "players_by_season.json";
pub const PLAYERS_FILE: &str = "players.json";
pub const CLUBS_FILE: &str = "clubs.json";
pub const SEASONS_FILE: &str = "seasons.json";
pub const STATS_FILE: &str = "player_season_stats.json";
pub const NATIONALITIES_FILE: &str = "nationalities.json";
pub const POSITIONS_FILE: &str = "positions.json";

/// Reads a whole JSON document.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))
}

/// Pretty-prints `value` next to `path` and swaps it into place, so a
/// reader never sees a half-written document.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut json = serde_json::to_string_pretty(value)
        .with_context(|| format!("serialize {}", path.display()))?;
    json.push('\n');
    write_text_atomic(path, &json)
}

pub fn write_text_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    let tmp = tmp_path(path);
    fs::write(&tmp, contents).with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("swap {}", path.display()))?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Writes every collection of `graph` into `dir` and returns the paths.
pub fn write_graph(dir: &Path, graph: &EntityGraph) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(7);
    put(dir, RAW_RECORDS_FILE, &graph.records, &mut written)?;
    put(dir, STATS_FILE, &graph.stats, &mut written)?;
    put(dir, PLAYERS_FILE, &graph.players, &mut written)?;
    put(dir, CLUBS_FILE, &graph.clubs, &mut written)?;
    put(dir, SEASONS_FILE, &graph.seasons, &mut written)?;
    put(dir, NATIONALITIES_FILE, &graph.nationalities, &mut written)?;
    put(dir, POSITIONS_FILE, &graph.positions, &mut written)?;
    Ok(written)
}

/// Reads back a directory written by [`write_graph`].
pub fn read_graph(dir: &Path) -> Result<EntityGraph> {
    Ok(EntityGraph {
        records: read_json(&dir.join(RAW_RECORDS_FILE))?,
        stats: read_json(&dir.join(STATS_FILE))?,
        players: read_json(&dir.join(PLAYERS_FILE))?,
        clubs: read_json(&dir.join(CLUBS_FILE))?,
        seasons: read_json(&dir.join(SEASONS_FILE))?,
        nationalities: read_json(&dir.join(NATIONALITIES_FILE))?,
        positions: read_json(&dir.join(POSITIONS_FILE))?,
    })
}

fn put<T: Serialize>(dir: &Path, file: &str, value: &T, written: &mut Vec<PathBuf>) -> Result<()> {
    let path = dir.join(file);
    write_json_atomic(&path, value)?;
    written.push(path);
    Ok(())
}
