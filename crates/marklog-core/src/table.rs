//! The log reconciler: one authoritative table per open session

use crate::event::MarkupEvent;
use crate::types::{split_identity, MarkupEntry, MarkupFile, MarkupKind};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, warn};

/// Result of applying one event to the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// New row inserted, with its allocated identity
    Inserted(String),
    Renamed(String),
    Removed(String),
    Ignored(IgnoreReason),
}

impl ApplyOutcome {
    pub fn is_change(&self) -> bool {
        !matches!(self, ApplyOutcome::Ignored(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Duplicate Created notification for an already-active key
    DuplicateCreate,
    /// Rename or removal for a key with no row at all
    UnknownKey,
    /// Rename or removal racing behind a deletion
    RowDeleted,
    /// Defensive: allocated identity already present in the table.
    /// Should be unreachable; the event is dropped and logged.
    DuplicateIdentity,
}

/// In-memory markup table for one session, indexed by identity.
///
/// Owned exclusively by the session for its lifetime; all mutation goes
/// through [`SessionTable::apply`] so live and filesystem-recovered
/// events follow the same rules.
#[derive(Debug, Default)]
pub struct SessionTable {
    entries: BTreeMap<String, MarkupEntry>,
    /// Scene key of each Active row -> its identity
    active: HashMap<String, String>,
    /// Highest generation ever allocated per scene key. Identities are
    /// never reused: a re-created key gets the next generation.
    generations: HashMap<String, u32>,
    /// Monotonic clock watermark for applied events
    watermark: Option<DateTime<Utc>>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, identity: &str) -> Option<&MarkupEntry> {
        self.entries.get(identity)
    }

    /// Seed the table from a persisted snapshot. Used once at load
    /// time, before any reconciliation; rows bypass `apply` and do not
    /// advance the clock watermark, so filesystem evidence keeps its
    /// real timestamps.
    pub fn load_rows(&mut self, rows: Vec<MarkupEntry>) {
        for row in rows {
            if self.entries.contains_key(&row.identity) {
                warn!(identity = %row.identity, "duplicate identity in persisted log, keeping first");
                continue;
            }
            let (key, gen) = split_identity(&row.identity);
            let slot = self.generations.entry(key.to_string()).or_insert(0);
            *slot = (*slot).max(gen);
            if row.is_active() {
                if let Some(prev) = self.active.insert(key.to_string(), row.identity.clone()) {
                    warn!(key, prev = %prev, "two active rows share a scene key, keeping latest");
                }
            }
            self.entries.insert(row.identity.clone(), row);
        }
    }

    /// Apply one lifecycle event. Created is idempotent per active key,
    /// Renamed only touches Active rows, Removed is a terminal no-op on
    /// already-deleted rows.
    pub fn apply(&mut self, event: MarkupEvent) -> ApplyOutcome {
        let at = self.clamp(event.at());
        let outcome = match event {
            MarkupEvent::Created {
                key,
                kind,
                display_name,
                source_filename,
                ..
            } => self.apply_created(key, kind, display_name, source_filename, at),
            MarkupEvent::Renamed {
                key, display_name, ..
            } => self.apply_renamed(&key, display_name),
            MarkupEvent::Removed { key, .. } => self.apply_removed(&key, at),
        };
        debug!(?outcome, "applied markup event");
        outcome
    }

    fn apply_created(
        &mut self,
        key: String,
        kind: MarkupKind,
        display_name: String,
        source_filename: Option<String>,
        at: DateTime<Utc>,
    ) -> ApplyOutcome {
        if self.active.contains_key(&key) {
            return ApplyOutcome::Ignored(IgnoreReason::DuplicateCreate);
        }

        let gen = self.generations.get(&key).copied().unwrap_or(0) + 1;
        let identity = if gen == 1 {
            key.clone()
        } else {
            format!("{}~{}", key, gen)
        };

        if self.entries.contains_key(&identity) {
            warn!(%identity, "duplicate identity allocation, dropping event");
            return ApplyOutcome::Ignored(IgnoreReason::DuplicateIdentity);
        }

        self.generations.insert(key.clone(), gen);
        self.active.insert(key, identity.clone());
        self.entries.insert(
            identity.clone(),
            MarkupEntry {
                identity: identity.clone(),
                display_name,
                kind,
                created_at: at,
                deleted_at: None,
                source_filename,
            },
        );
        ApplyOutcome::Inserted(identity)
    }

    fn apply_renamed(&mut self, key: &str, display_name: String) -> ApplyOutcome {
        match self.active.get(key) {
            Some(identity) => {
                let identity = identity.clone();
                if let Some(entry) = self.entries.get_mut(&identity) {
                    entry.display_name = display_name;
                }
                ApplyOutcome::Renamed(identity)
            }
            // A rename can race behind a deletion notification; once a
            // row is Deleted its label is frozen.
            None if self.generations.contains_key(key) => {
                ApplyOutcome::Ignored(IgnoreReason::RowDeleted)
            }
            None => ApplyOutcome::Ignored(IgnoreReason::UnknownKey),
        }
    }

    fn apply_removed(&mut self, key: &str, at: DateTime<Utc>) -> ApplyOutcome {
        match self.active.remove(key) {
            Some(identity) => {
                if let Some(entry) = self.entries.get_mut(&identity) {
                    // created_at <= deleted_at must hold even for rows
                    // loaded from a log written by a skewed clock
                    entry.deleted_at = Some(at.max(entry.created_at));
                }
                ApplyOutcome::Removed(identity)
            }
            None if self.generations.contains_key(key) => {
                ApplyOutcome::Ignored(IgnoreReason::RowDeleted)
            }
            None => ApplyOutcome::Ignored(IgnoreReason::UnknownKey),
        }
    }

    /// Reconcile the table against the markup files present on disk,
    /// at session start and session end.
    ///
    /// Files with no matching Active row become synthesized Created
    /// events (mtime as creation time); Active rows whose source file
    /// vanished become synthesized Removed events at `now`. Both flow
    /// through the same `apply` path as live events.
    pub fn reconcile_with_filesystem(
        &mut self,
        files: &[MarkupFile],
        now: DateTime<Utc>,
    ) -> Vec<ApplyOutcome> {
        let mut outcomes = Vec::new();

        let mut files: Vec<&MarkupFile> = files.iter().collect();
        files.sort_by(|a, b| {
            a.modified_at
                .cmp(&b.modified_at)
                .then_with(|| a.file_name.cmp(&b.file_name))
        });

        let known_sources: HashSet<String> = self
            .active
            .values()
            .filter_map(|id| self.entries.get(id))
            .filter_map(|e| e.source_filename.clone())
            .collect();

        let listing: HashSet<&str> = files.iter().map(|f| f.file_name.as_str()).collect();

        for file in &files {
            if known_sources.contains(&file.file_name) {
                continue;
            }
            // A live-created markup saved under its scene name: link the
            // row to its file instead of inventing a second one.
            if let Some(identity) = self.active.get(file.stem()) {
                let identity = identity.clone();
                if let Some(entry) = self.entries.get_mut(&identity) {
                    if entry.source_filename.is_none() {
                        entry.source_filename = Some(file.file_name.clone());
                        continue;
                    }
                }
            }
            let stem = file.stem().to_string();
            outcomes.push(self.apply(MarkupEvent::Created {
                kind: MarkupKind::from_file_stem(&stem),
                display_name: stem.clone(),
                key: stem,
                at: file.modified_at,
                source_filename: Some(file.file_name.clone()),
            }));
        }

        // Deletions that happened outside the observed session
        let vanished: Vec<String> = self
            .active
            .values()
            .filter_map(|id| self.entries.get(id))
            .filter(|e| {
                e.source_filename
                    .as_deref()
                    .is_some_and(|f| !listing.contains(f))
            })
            .map(|e| e.scene_key().to_string())
            .collect();

        for key in vanished {
            outcomes.push(self.apply(MarkupEvent::Removed { key, at: now }));
        }

        outcomes
    }

    /// Ordered view of the table: `created_at` ascending, ties broken
    /// by identity. The store and UI depend on this ordering.
    pub fn snapshot(&self) -> Vec<MarkupEntry> {
        let mut rows: Vec<MarkupEntry> = self.entries.values().cloned().collect();
        rows.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.identity.cmp(&b.identity))
        });
        rows
    }

    fn clamp(&mut self, at: DateTime<Utc>) -> DateTime<Utc> {
        let at = match self.watermark {
            Some(w) if at < w => w,
            _ => at,
        };
        self.watermark = Some(at);
        at
    }
}
