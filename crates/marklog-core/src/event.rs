//! Normalized markup lifecycle events

use crate::types::MarkupKind;
use chrono::{DateTime, Utc};

/// A lifecycle event keyed by the markup's in-scene unique name.
///
/// Live events come from the scene observer; reconciliation synthesizes
/// the same shapes from filesystem evidence, so both flow through one
/// apply path.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkupEvent {
    Created {
        key: String,
        kind: MarkupKind,
        display_name: String,
        at: DateTime<Utc>,
        /// Set when the event was recovered from an on-disk file
        source_filename: Option<String>,
    },
    Renamed {
        key: String,
        display_name: String,
        at: DateTime<Utc>,
    },
    Removed {
        key: String,
        at: DateTime<Utc>,
    },
}

impl MarkupEvent {
    pub fn key(&self) -> &str {
        match self {
            MarkupEvent::Created { key, .. }
            | MarkupEvent::Renamed { key, .. }
            | MarkupEvent::Removed { key, .. } => key,
        }
    }

    pub fn at(&self) -> DateTime<Utc> {
        match self {
            MarkupEvent::Created { at, .. }
            | MarkupEvent::Renamed { at, .. }
            | MarkupEvent::Removed { at, .. } => *at,
        }
    }
}
