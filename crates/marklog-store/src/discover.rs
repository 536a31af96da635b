//! Session-folder file discovery
//!
//! Existence and modification time only; markup file content is an
//! external collaborator's concern.

use chrono::{DateTime, Utc};
use marklog_core::MarkupFile;
use std::path::{Path, PathBuf};

/// Markup files present in a session folder: `*.json`, excluding the
/// persisted log itself
pub fn list_markup_files(session_folder: &Path) -> std::io::Result<Vec<MarkupFile>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(session_folder)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !name.ends_with(".json") || name.starts_with("markup_log") {
            continue;
        }
        let modified: DateTime<Utc> = entry.metadata()?.modified()?.into();
        files.push(MarkupFile::new(name, modified));
    }
    files.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(files)
}

/// The case's free-text report: `report_*.txt`, at most one expected.
/// Extra matches are ignored deterministically (first in name order).
pub fn find_report_file(session_folder: &Path) -> std::io::Result<Option<PathBuf>> {
    let mut matches: Vec<PathBuf> = std::fs::read_dir(session_folder)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|n| n.starts_with("report_") && n.ends_with(".txt"))
        })
        .map(|entry| entry.path())
        .collect();
    matches.sort();
    Ok(matches.into_iter().next())
}
