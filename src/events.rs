use serde::Serialize;

use crate::models::Phase;

/// Tauri event name used for all backend -> UI events.
/// The UI should subscribe once and switch on `event` to update state.
pub const SNATCHVID_EVENT_NAME: &str = "snatchvid://event";

/// Backend -> UI events, in the order the job state changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum AppEvent {
    PhaseChanged {
        phase: Phase,
        code: u8,
    },
    ProgressChanged {
        /// 0..=100
        percent: u8,
        current_item: u32,
        total_items: u32,
    },
    /// A submission was refused without starting a job (bad input, nothing to download).
    SubmissionRejected {
        reason: String,
    },
    JobFailed {
        message: String,
    },
    /// No download folder is configured; the UI should open the folder picker.
    FolderSelectionRequired,
}

impl AppEvent {
    pub fn phase(phase: Phase) -> Self {
        AppEvent::PhaseChanged {
            phase,
            code: phase.code(),
        }
    }
}

/// Emit an `AppEvent` to the UI.
/// The frontend should subscribe to `SNATCHVID_EVENT_NAME`.
#[cfg(feature = "desktop")]
pub fn emit_event(app: &tauri::AppHandle, event: AppEvent) -> Result<(), tauri::Error> {
    use tauri::Emitter;

    app.emit(SNATCHVID_EVENT_NAME, event)
}
