use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Serialize, Deserialize)]
struct Checkpoint {
    last_height: u64,
}

/// Read the highest fully processed height. A missing file means a first
/// run; an unreadable one is logged and treated the same, trading a small
/// re-scan window for availability.
pub fn get_checkpoint(path: &Path) -> Option<u64> {
    let contents = fs::read_to_string(path).ok()?;
    match serde_json::from_str::<Checkpoint>(&contents) {
        Ok(checkpoint) => Some(checkpoint.last_height),
        Err(err) => {
            warn!(path = %path.display(), %err, "unreadable scan state, falling back to recent window");
            None
        }
    }
}

pub fn put_checkpoint(path: &Path, height: u64) -> Result<()> {
    let payload = serde_json::to_string(&Checkpoint {
        last_height: height,
    })?;
    fs::write(path, payload)
        .with_context(|| format!("failed to write scan state to {}", path.display()))
}
