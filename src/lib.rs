//! SnatchVid backend: a single-job video downloader driven by yt-dlp.
//!
//! The UI submits a URL with a format and quality; the orchestrator
//! classifies it, dispatches the download and turns yt-dlp's output into a
//! phase and an overall percentage the UI can render.

pub mod aggregator;
pub mod collaborator;
pub mod error;
pub mod events;
pub mod gate;
pub mod models;
pub mod orchestrator;
pub mod progress;
pub mod settings;
pub mod state;
pub mod url_utils;
pub mod ytdlp;

#[cfg(feature = "desktop")]
mod app;

#[cfg(feature = "desktop")]
pub use app::run;

pub use collaborator::{Collaborator, ConfigSource, DownloadSignal, FolderPicker};
pub use error::{CollaboratorError, SubmitError, TransitionError};
pub use events::AppEvent;
pub use gate::ConfigGate;
pub use models::{DownloadRequest, MediaFormat, Phase, Quality, RawSubmission, StatusSnapshot};
pub use orchestrator::{Orchestrator, OrchestratorConfig, SubmitOutcome};
