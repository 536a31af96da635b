//! Session orchestration: scene observation, lifecycle control, and the
//! case-level progress log

mod controller;
mod observer;
mod progress;

pub use controller::{LogView, ProgressMark, SessionController, SessionError, SessionState};
pub use observer::{MarkupObserver, PortError, SceneChange, SceneNotification, ScenePort};
pub use progress::{ProgressError, ProgressLog, ProgressRow};
