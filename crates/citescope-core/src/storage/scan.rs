//! Corpus scanning — enumerate `<root>/<venue+year>/<title>.<ext>` files.
//!
//! Only one directory level is visited and entries come back in the order the
//! filesystem yields them. Names starting with `.` are ignored on both levels.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{CitescopeError, Result};
use crate::models::PaperRecord;

/// Collect every paper file under `root` with the given extension.
pub fn scan_papers(root: &Path, extension: &str) -> Result<Vec<PaperRecord>> {
    if !root.is_dir() {
        return Err(CitescopeError::DirectoryNotFound(
            root.to_string_lossy().into_owned(),
        ));
    }

    let mut papers = Vec::new();
    for venue_entry in fs::read_dir(root)? {
        let venue_entry = venue_entry?;
        let venue_path = venue_entry.path();
        if !venue_path.is_dir() || is_hidden(&venue_path) {
            continue;
        }

        for file_entry in fs::read_dir(&venue_path)? {
            let file_path = file_entry?.path();
            if !file_path.is_file() || is_hidden(&file_path) {
                continue;
            }
            let matches_ext = file_path
                .extension()
                .is_some_and(|ext| ext.to_string_lossy() == extension);
            if !matches_ext {
                continue;
            }
            if let Some(paper) = paper_from_path(&file_path) {
                papers.push(paper);
            }
        }
    }

    debug!(root = %root.display(), count = papers.len(), "scanned paper corpus");
    Ok(papers)
}

/// Build a record from `<venue+year>/<title>.<ext>`.
pub fn paper_from_path(path: &Path) -> Option<PaperRecord> {
    let title = path.file_stem()?.to_string_lossy().into_owned();
    let venue_dir = path.parent()?.file_name()?.to_string_lossy().into_owned();
    Some(PaperRecord::new(title, &venue_dir, path))
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().starts_with('.'))
}
