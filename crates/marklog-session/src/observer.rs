//! Scene notification normalization

use chrono::{DateTime, Utc};
use marklog_core::{MarkupEvent, MarkupKind};
use thiserror::Error;
use tracing::debug;

/// What happened to a scene object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneChange {
    Added,
    Relabeled,
    Removed,
}

/// Raw notification payload from the host's object-lifecycle bus
#[derive(Debug, Clone)]
pub struct SceneNotification {
    /// The object's in-scene unique name
    pub unique_name: String,
    /// Free-form type tag; anything but the three markup kinds is ignored
    pub type_tag: String,
    /// Current display label, when the host supplies one
    pub label: Option<String>,
    pub change: SceneChange,
}

/// The host's subscription seam. One registration per open session;
/// failure to unregister risks leaking stale events into the next
/// session's log and is treated as fatal.
pub trait ScenePort {
    fn register(&mut self) -> Result<(), PortError>;
    fn unregister(&mut self) -> Result<(), PortError>;
    fn is_attached(&self) -> bool;
}

#[derive(Debug, Error)]
#[error("scene port: {0}")]
pub struct PortError(pub String);

/// Normalizes raw scene notifications into markup lifecycle events,
/// stamping wall-clock time at observation
pub struct MarkupObserver {
    clock: Box<dyn Fn() -> DateTime<Utc>>,
}

impl MarkupObserver {
    pub fn new() -> Self {
        Self::with_clock(Box::new(Utc::now))
    }

    /// Inject a clock, for tests
    pub fn with_clock(clock: Box<dyn Fn() -> DateTime<Utc>>) -> Self {
        Self { clock }
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Normalize one notification, or None for non-markup objects and
    /// payloads with nothing to record
    pub fn normalize(&self, raw: &SceneNotification) -> Option<MarkupEvent> {
        let Some(kind) = MarkupKind::parse(&raw.type_tag) else {
            debug!(tag = %raw.type_tag, "ignoring non-markup scene object");
            return None;
        };
        let at = self.now();

        match raw.change {
            SceneChange::Added => Some(MarkupEvent::Created {
                key: raw.unique_name.clone(),
                kind,
                display_name: raw
                    .label
                    .clone()
                    .unwrap_or_else(|| raw.unique_name.clone()),
                at,
                source_filename: None,
            }),
            SceneChange::Relabeled => {
                // A relabel without a label carries no information
                let display_name = raw.label.clone()?;
                Some(MarkupEvent::Renamed {
                    key: raw.unique_name.clone(),
                    display_name,
                    at,
                })
            }
            SceneChange::Removed => Some(MarkupEvent::Removed {
                key: raw.unique_name.clone(),
                at,
            }),
        }
    }
}

impl Default for MarkupObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MarkupObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkupObserver").finish_non_exhaustive()
    }
}
