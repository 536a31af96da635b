use marklog_core::{EntryStatus, MarkupEntry};
use marklog_store::{project_active_view, LogEncoding, LogStore};
use std::path::Path;

fn render(rows: &[MarkupEntry]) -> String {
    let mut out = String::new();
    out.push_str("identity | kind | display name | created | deleted | file\n");
    out.push_str("---------+------+--------------+---------+---------+-----\n");
    for row in rows {
        let deleted = row
            .deleted_at
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "{} | {} | {} | {} | {} | {}\n",
            row.identity,
            row.kind.as_str(),
            row.display_name,
            row.created_at.format("%Y-%m-%d %H:%M:%S"),
            deleted,
            row.source_filename.as_deref().unwrap_or("-"),
        ));
    }
    out
}

pub fn run(folder: &Path, all: bool, encoding: LogEncoding) -> anyhow::Result<()> {
    let snapshot = LogStore::new(encoding).load(folder)?;
    if snapshot.is_empty() {
        println!("No markup log in {}", folder.display());
        return Ok(());
    }

    let rows = if all {
        snapshot
    } else {
        project_active_view(&snapshot)
    };

    let deleted = rows
        .iter()
        .filter(|r| r.status() == EntryStatus::Deleted)
        .count();
    print!("{}", render(&rows));
    println!("{} rows ({} deleted)", rows.len(), deleted);
    Ok(())
}
