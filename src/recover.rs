//! Cleaning up after a crash during parsing
//!
//! The vocabulary is only saved every so often, so a crash can leave bags on disk that use ids
//! the saved vocabulary never heard of. Those bags are exactly the ones written after the last
//! save; deleting them lets the next run parse those pages again.
use std::fs;
use std::path::PathBuf;
use std::time::SystemTime;

use walkdir::WalkDir;

use crate::errors::*;
use crate::layout::Layout;

/// When the vocabulary was last saved
pub fn vocabulary_saved_at(layout: &Layout) -> Result<SystemTime> {
    fs::metadata(layout.vocabulary_path())
        .and_then(|meta| meta.modified())
        .map_err(|err| Error::MissingFile("vocabulary", Some(err)))
}

/// Raw bags modified after `cutoff`, in path order
pub fn stale_bags(layout: &Layout, cutoff: SystemTime) -> Result<Vec<PathBuf>> {
    let mut stale = vec![];
    let root = layout.raw_bags_dir();
    if !root.is_dir() {
        return Ok(stale);
    }
    for entry in WalkDir::new(&root).sort_by_file_name() {
        let entry = entry.map_err(|err| Error::Other(format!("Walking {}: {}", root.display(), err)))?;
        if !entry.file_type().is_file()
            || entry.path().extension().map_or(true, |ext| ext != "csv") {
            continue;
        }
        if entry.metadata().map_err(|err| Error::Other(err.to_string()))?.modified()? > cutoff {
            stale.push(entry.into_path());
        }
    }
    Ok(stale)
}

/// Delete the given bags; returns how many were removed
pub fn remove(paths: &[PathBuf]) -> Result<usize> {
    for path in paths {
        debug!("Removing {}", path.display());
        fs::remove_file(path)?;
    }
    info!("Removed {} bags", paths.len());
    Ok(paths.len())
}
