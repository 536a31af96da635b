use marklog_store::{LogEncoding, LogStore};
use std::path::Path;

/// Re-encode a session log. Loading reads whichever encoding is on
/// disk; both codecs round-trip losslessly, so nothing is dropped.
pub fn run(folder: &Path, to: LogEncoding) -> anyhow::Result<()> {
    let store = LogStore::new(to);
    let snapshot = store.load(folder)?;
    if snapshot.is_empty() {
        anyhow::bail!("no markup log found in {}", folder.display());
    }
    store.flush(folder, &snapshot)?;
    println!(
        "Wrote {} rows to {}",
        snapshot.len(),
        store.log_path(folder).display()
    );
    Ok(())
}
