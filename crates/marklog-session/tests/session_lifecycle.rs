//! End-to-end session lifecycle: open, live events, close, reopen.

use chrono::{DateTime, TimeZone, Utc};
use marklog_core::{EntryStatus, MarkupKind};
use marklog_session::{
    LogView, MarkupObserver, PortError, ProgressLog, ProgressMark, SceneChange, SceneNotification,
    ScenePort, SessionController, SessionError, SessionState,
};
use marklog_store::{list_markup_files, LogEncoding, LogStore};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct FakeScene {
    attached: bool,
    fail_unregister: bool,
}

impl ScenePort for FakeScene {
    fn register(&mut self) -> Result<(), PortError> {
        self.attached = true;
        Ok(())
    }

    fn unregister(&mut self) -> Result<(), PortError> {
        if self.fail_unregister {
            return Err(PortError("host refused detach".to_string()));
        }
        self.attached = false;
        Ok(())
    }

    fn is_attached(&self) -> bool {
        self.attached
    }
}

/// Records every active view it is handed
struct RecordingView(Rc<RefCell<Vec<Vec<String>>>>);

impl LogView for RecordingView {
    fn refresh(&mut self, active_rows: &[marklog_core::MarkupEntry]) {
        self.0
            .borrow_mut()
            .push(active_rows.iter().map(|e| e.identity.clone()).collect());
    }
}

/// Clock advancing one second per observation, for deterministic stamps
fn ticking_clock(start: i64) -> Box<dyn Fn() -> DateTime<Utc>> {
    let counter = Arc::new(AtomicI64::new(start));
    Box::new(move || {
        let t = counter.fetch_add(1, Ordering::SeqCst);
        Utc.timestamp_opt(t, 0).unwrap()
    })
}

fn controller(folder: &Path, clock_start: i64) -> SessionController<FakeScene> {
    SessionController::new(
        folder,
        LogStore::new(LogEncoding::Flat),
        MarkupObserver::with_clock(ticking_clock(clock_start)),
        FakeScene::default(),
    )
}

fn notify(name: &str, tag: &str, label: Option<&str>, change: SceneChange) -> SceneNotification {
    SceneNotification {
        unique_name: name.to_string(),
        type_tag: tag.to_string(),
        label: label.map(|s| s.to_string()),
        change,
    }
}

fn write_progress_log(path: &Path, case_id: &str, folder: &str) {
    std::fs::write(
        path,
        format!("Report,Path,Done\n{},{},\n", case_id, folder),
    )
    .unwrap();
}

#[test]
fn full_session_records_lifecycle_and_marks_done() {
    let temp = tempfile::TempDir::new().unwrap();
    let session = temp.path().join("patients").join("101");
    std::fs::create_dir_all(&session).unwrap();
    // Markup left behind by a previous tool, never observed live
    std::fs::write(session.join("roi_1.json"), b"{}").unwrap();

    let progress_path = temp.path().join("log.csv");
    write_progress_log(&progress_path, "101", "./patients/101");
    let mut progress = ProgressLog::load(&progress_path).unwrap();

    let views = Rc::new(RefCell::new(Vec::new()));
    let mut ctrl =
        controller(&session, 100).with_view(Box::new(RecordingView(Rc::clone(&views))));

    let files = list_markup_files(&session).unwrap();
    ctrl.open(&files).unwrap();
    assert_eq!(ctrl.state(), SessionState::Active);

    // roi_1.json was recovered as an active row
    assert_eq!(ctrl.snapshot().len(), 1);
    assert_eq!(ctrl.snapshot()[0].identity, "roi_1");

    ctrl.scene_event(&notify("pt_1", "point", None, SceneChange::Added));
    ctrl.scene_event(&notify(
        "pt_1",
        "point",
        Some("Lesion A"),
        SceneChange::Relabeled,
    ));
    ctrl.scene_event(&notify("line_1", "line", None, SceneChange::Added));
    ctrl.scene_event(&notify("line_1", "line", None, SceneChange::Removed));
    // Non-markup scene traffic is filtered out
    ctrl.scene_event(&notify("vol_1", "volume", None, SceneChange::Added));

    let files = list_markup_files(&session).unwrap();
    ctrl.close(
        &files,
        Some(ProgressMark {
            log: &mut progress,
            case_id: "101",
        }),
    )
    .unwrap();
    assert_eq!(ctrl.state(), SessionState::Closed);

    // Persisted log holds every artifact ever seen, deleted included
    let persisted = LogStore::new(LogEncoding::Flat).load(&session).unwrap();
    assert_eq!(persisted.len(), 3);

    let pt = persisted.iter().find(|e| e.identity == "pt_1").unwrap();
    assert_eq!(pt.display_name, "Lesion A");
    assert_eq!(pt.status(), EntryStatus::Active);

    let line = persisted.iter().find(|e| e.identity == "line_1").unwrap();
    assert_eq!(line.status(), EntryStatus::Deleted);
    assert!(line.deleted_at.unwrap() >= line.created_at);

    let roi = persisted.iter().find(|e| e.identity == "roi_1").unwrap();
    assert_eq!(roi.kind, MarkupKind::Roi);
    assert_eq!(roi.source_filename.as_deref(), Some("roi_1.json"));

    // Case marked done only after the clean close
    let progress = ProgressLog::load(&progress_path).unwrap();
    assert!(progress.get("101").unwrap().done);

    // The view only ever sees active rows; the deleted line is gone
    // from the final refresh
    let views = views.borrow();
    assert!(!views.is_empty());
    let last = views.last().unwrap();
    assert!(last.contains(&"pt_1".to_string()));
    assert!(last.contains(&"roi_1".to_string()));
    assert!(!last.contains(&"line_1".to_string()));
}

#[test]
fn reopening_a_session_preserves_history_without_duplicates() {
    let temp = tempfile::TempDir::new().unwrap();
    let session = temp.path().to_path_buf();
    std::fs::write(session.join("roi_1.json"), b"{}").unwrap();

    // First session: recover the file, create and delete a point
    let mut ctrl = controller(&session, 100);
    ctrl.open(&list_markup_files(&session).unwrap()).unwrap();
    ctrl.scene_event(&notify("pt_1", "point", None, SceneChange::Added));
    ctrl.scene_event(&notify("pt_1", "point", None, SceneChange::Removed));
    ctrl.close(&list_markup_files(&session).unwrap(), None)
        .unwrap();

    // Second session on the same folder
    let mut ctrl = controller(&session, 200);
    ctrl.open(&list_markup_files(&session).unwrap()).unwrap();

    let snapshot = ctrl.snapshot();
    assert_eq!(snapshot.len(), 2, "history must not be rediscovered");
    let roi = snapshot.iter().find(|e| e.identity == "roi_1").unwrap();
    assert_eq!(roi.status(), EntryStatus::Active);
    let pt = snapshot.iter().find(|e| e.identity == "pt_1").unwrap();
    assert_eq!(pt.status(), EntryStatus::Deleted);

    // Deleting roi_1.json outside any session shows up at next open
    ctrl.close(&list_markup_files(&session).unwrap(), None)
        .unwrap();
    std::fs::remove_file(session.join("roi_1.json")).unwrap();

    let mut ctrl = controller(&session, 300);
    ctrl.open(&list_markup_files(&session).unwrap()).unwrap();
    let roi = ctrl
        .snapshot()
        .into_iter()
        .find(|e| e.identity == "roi_1")
        .unwrap();
    assert_eq!(roi.status(), EntryStatus::Deleted);
}

#[test]
fn failed_unregister_aborts_close_and_leaves_done_unset() {
    let temp = tempfile::TempDir::new().unwrap();
    let session = temp.path().join("case");
    std::fs::create_dir_all(&session).unwrap();
    let progress_path = temp.path().join("log.csv");
    write_progress_log(&progress_path, "7", "./case");
    let mut progress = ProgressLog::load(&progress_path).unwrap();

    let mut ctrl = SessionController::new(
        &session,
        LogStore::new(LogEncoding::Flat),
        MarkupObserver::with_clock(ticking_clock(50)),
        FakeScene {
            attached: false,
            fail_unregister: true,
        },
    );
    ctrl.open(&[]).unwrap();
    ctrl.scene_event(&notify("pt_1", "point", None, SceneChange::Added));

    let err = ctrl
        .close(
            &[],
            Some(ProgressMark {
                log: &mut progress,
                case_id: "7",
            }),
        )
        .unwrap_err();
    assert!(matches!(err, SessionError::Unregister(_)));
    assert_eq!(ctrl.state(), SessionState::Closing);
    assert!(!ProgressLog::load(&progress_path).unwrap().get("7").unwrap().done);
}

#[test]
fn close_is_retryable_after_flush_failure() {
    let temp = tempfile::TempDir::new().unwrap();
    // Pointing the session folder below a regular file makes the flush
    // fail while everything in memory stays valid
    let blocker = temp.path().join("blocker");
    std::fs::write(&blocker, b"").unwrap();
    let bad_session = blocker.join("session");

    let mut ctrl = controller(&bad_session, 10);
    ctrl.open(&[]).unwrap();
    ctrl.scene_event(&notify("pt_1", "point", None, SceneChange::Added));

    let err = ctrl.close(&[], None).unwrap_err();
    assert!(matches!(err, SessionError::Store(_)));
    assert_eq!(ctrl.state(), SessionState::Closing);

    // Table intact; a retry against a healthy folder path would flush.
    assert_eq!(ctrl.snapshot().len(), 1);
    let retry = ctrl.close(&[], None);
    assert!(retry.is_err(), "folder is still unwritable");
    assert_eq!(ctrl.state(), SessionState::Closing);
}

#[test]
fn duplicate_created_notifications_yield_one_row() {
    let temp = tempfile::TempDir::new().unwrap();
    let mut ctrl = controller(temp.path(), 10);
    ctrl.open(&[]).unwrap();

    let raw = notify("pt_1", "point", None, SceneChange::Added);
    ctrl.scene_event(&raw);
    ctrl.scene_event(&raw);
    assert_eq!(ctrl.snapshot().len(), 1);
}

#[test]
fn log_round_trips_across_encodings() {
    let temp = tempfile::TempDir::new().unwrap();
    let session = temp.path().to_path_buf();

    let mut ctrl = controller(&session, 10);
    ctrl.open(&[]).unwrap();
    ctrl.scene_event(&notify("roi_1", "roi", Some("Target"), SceneChange::Added));
    ctrl.scene_event(&notify("roi_1", "roi", None, SceneChange::Removed));
    ctrl.close(&[], None).unwrap();

    let flat = LogStore::new(LogEncoding::Flat).load(&session).unwrap();
    LogStore::new(LogEncoding::Rich)
        .flush(&session, &flat)
        .unwrap();
    std::fs::remove_file(session.join("markup_log.csv")).unwrap();

    let rich = LogStore::new(LogEncoding::Rich).load(&session).unwrap();
    assert_eq!(flat, rich);
}
