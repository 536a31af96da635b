//! Session lifecycle controller
//!
//! Owns the session table, the log store, and the scene subscription
//! for exactly one open session, and drives the
//! Idle -> Loading -> Active -> Closing -> Closed state machine.

use crate::observer::{MarkupObserver, PortError, SceneNotification, ScenePort};
use crate::progress::{ProgressError, ProgressLog};
use marklog_core::{ApplyOutcome, MarkupEntry, MarkupFile, SessionTable};
use marklog_store::{project_active_view, LogStore, StoreError};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Loading,
    Active,
    Closing,
    Closed,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session is {state:?}, cannot {operation}")]
    InvalidState {
        state: SessionState,
        operation: &'static str,
    },
    /// The previous session's listener is still attached; starting a
    /// new one would leak its events into this session's log.
    #[error("scene listener still attached from a previous session")]
    StaleListener,
    #[error("scene observer registration failed")]
    Register(#[source] PortError),
    /// Fatal: a listener that cannot be detached would corrupt the next
    /// session's log with stale events.
    #[error("scene observer could not be detached")]
    Unregister(#[source] PortError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to mark case progress")]
    Progress(#[from] ProgressError),
}

/// Passive renderer fed the active view whenever the table changes
pub trait LogView {
    fn refresh(&mut self, active_rows: &[MarkupEntry]);
}

/// The case row to flip on clean close
pub struct ProgressMark<'a> {
    pub log: &'a mut ProgressLog,
    pub case_id: &'a str,
}

pub struct SessionController<P: ScenePort> {
    state: SessionState,
    session_folder: PathBuf,
    store: LogStore,
    table: SessionTable,
    observer: MarkupObserver,
    port: P,
    view: Option<Box<dyn LogView>>,
}

impl<P: ScenePort> SessionController<P> {
    pub fn new(
        session_folder: impl Into<PathBuf>,
        store: LogStore,
        observer: MarkupObserver,
        port: P,
    ) -> Self {
        Self {
            state: SessionState::Idle,
            session_folder: session_folder.into(),
            store,
            table: SessionTable::new(),
            observer,
            port,
            view: None,
        }
    }

    pub fn with_view(mut self, view: Box<dyn LogView>) -> Self {
        self.view = Some(view);
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Ordered table snapshot (store/UI ordering contract)
    pub fn snapshot(&self) -> Vec<MarkupEntry> {
        self.table.snapshot()
    }

    /// Start the session: load the persisted log, reconcile against the
    /// files present at open, then register the scene observer.
    pub fn open(&mut self, files_at_open: &[MarkupFile]) -> Result<(), SessionError> {
        if self.state != SessionState::Idle {
            return Err(SessionError::InvalidState {
                state: self.state,
                operation: "open",
            });
        }
        if self.port.is_attached() {
            return Err(SessionError::StaleListener);
        }
        self.state = SessionState::Loading;

        match self.store.load(&self.session_folder) {
            Ok(rows) => self.table.load_rows(rows),
            // Availability over strict durability: a damaged log must
            // not block annotation work.
            Err(StoreError::CorruptLog { path, source }) => {
                warn!(path = %path.display(), %source, "corrupt markup log, starting empty");
            }
            Err(err) => {
                self.state = SessionState::Idle;
                return Err(err.into());
            }
        }

        self.table
            .reconcile_with_filesystem(files_at_open, self.observer.now());

        if let Err(err) = self.port.register() {
            self.state = SessionState::Idle;
            return Err(SessionError::Register(err));
        }
        self.state = SessionState::Active;
        self.refresh_view();
        info!(folder = %self.session_folder.display(), rows = self.table.len(), "session active");
        Ok(())
    }

    /// Apply one live scene notification. Synchronous and bounded; runs
    /// on the host's UI thread.
    pub fn scene_event(&mut self, raw: &SceneNotification) -> Option<ApplyOutcome> {
        if self.state != SessionState::Active {
            warn!(state = ?self.state, "dropping scene event outside active session");
            return None;
        }
        let event = self.observer.normalize(raw)?;
        let outcome = self.table.apply(event);
        if outcome.is_change() {
            self.refresh_view();
        }
        Some(outcome)
    }

    /// End the session: detach the observer, reconcile against the
    /// files present at close, flush the log, then mark the case done.
    ///
    /// Any failure leaves the state in `Closing` with the progress row
    /// untouched; close may be re-invoked to retry.
    pub fn close(
        &mut self,
        files_at_close: &[MarkupFile],
        progress: Option<ProgressMark<'_>>,
    ) -> Result<(), SessionError> {
        if self.state != SessionState::Active && self.state != SessionState::Closing {
            return Err(SessionError::InvalidState {
                state: self.state,
                operation: "close",
            });
        }
        self.state = SessionState::Closing;

        if self.port.is_attached() {
            self.port.unregister().map_err(SessionError::Unregister)?;
        }

        self.table
            .reconcile_with_filesystem(files_at_close, self.observer.now());
        self.refresh_view();

        let snapshot = self.table.snapshot();
        self.store.flush(&self.session_folder, &snapshot)?;

        if let Some(mark) = progress {
            mark.log.mark_done(mark.case_id)?;
            mark.log.save()?;
        }

        self.state = SessionState::Closed;
        info!(folder = %self.session_folder.display(), rows = snapshot.len(), "session closed");
        Ok(())
    }

    fn refresh_view(&mut self) {
        if let Some(view) = &mut self.view {
            view.refresh(&project_active_view(&self.table.snapshot()));
        }
    }
}
