use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::Result;

/// Scene ids of a newline-delimited list, trimmed, blank lines skipped.
pub fn load_scene_ids<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let text = fs::read_to_string(path.as_ref())?;
    let ids: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect();
    debug!("Loaded {} scene ids from {:?}", ids.len(), path.as_ref());
    Ok(ids)
}
