//! Markup lifecycle data model and log reconciliation

mod event;
mod table;
mod types;

pub use event::MarkupEvent;
pub use table::{ApplyOutcome, IgnoreReason, SessionTable};
pub use types::{EntryStatus, MarkupEntry, MarkupFile, MarkupKind};
