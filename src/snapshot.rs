//! Snapshot persistence
//!
//! The snapshot is pretty-printed JSON with a fixed field order and a trailing
//! newline, so successive files diff cleanly. Writes go to a sibling temporary
//! file which is then renamed over the target: readers see either the previous
//! snapshot or the new one, never a partial file.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::CongressError;
use crate::models::Snapshot;

pub fn to_json(snapshot: &Snapshot) -> Result<String, serde_json::Error> {
    let mut json = serde_json::to_string_pretty(snapshot)?;
    json.push('\n');
    Ok(json)
}

/// Temporary path next to `path` (same directory, so the rename stays on one filesystem)
pub fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "snapshot".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}

/// Replace the snapshot at `path` atomically
pub fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<(), CongressError> {
    let json = to_json(snapshot)?;
    let tmp_path = temp_path_for(path);
    let write_err = |source: std::io::Error| CongressError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(write_err)?;
    }

    if let Err(source) = fs::write(&tmp_path, json.as_bytes()) {
        let _ = fs::remove_file(&tmp_path);
        return Err(write_err(source));
    }
    if let Err(source) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(write_err(source));
    }

    info!("Wrote snapshot to {}", path.display());
    Ok(())
}

pub fn read_snapshot(path: &Path) -> Result<Snapshot, CongressError> {
    let raw = fs::read_to_string(path).map_err(|source| CongressError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&raw)?)
}
