//! External collaborator boundary
//!
//! Everything the orchestrator waits on lives behind these traits: URL
//! classification, playlist folder setup and the download itself
//! (`Collaborator`), the persisted download folder (`ConfigSource`) and the
//! native folder dialog (`FolderPicker`). The yt-dlp backed implementation is
//! in `ytdlp`, the SQLite one in `settings`.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::CollaboratorError;
use crate::models::{Classification, DownloadRequest};

/// Topic names of the download signal stream, as seen by the UI.
pub mod topics {
    pub const PROGRESS: &str = "download_progress";
    pub const COMPLETE: &str = "download_complete";
    pub const FAILED: &str = "download_failed";
}

/// One item on the download signal stream.
///
/// Lines and terminal signals share one channel so they arrive in the order
/// the downloader produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadSignal {
    Line(String),
    Complete,
    Failed(String),
}

impl DownloadSignal {
    pub fn topic(&self) -> &'static str {
        match self {
            DownloadSignal::Line(_) => topics::PROGRESS,
            DownloadSignal::Complete => topics::COMPLETE,
            DownloadSignal::Failed(_) => topics::FAILED,
        }
    }
}

pub type SignalSender = mpsc::Sender<DownloadSignal>;
pub type SignalReceiver = mpsc::Receiver<DownloadSignal>;

#[async_trait]
pub trait Collaborator: Send + Sync {
    /// Decide whether `url` is a single video, a playlist, or nothing usable.
    async fn classify_url(&self, url: &str) -> Result<Classification, CollaboratorError>;

    /// Create the output location for a playlist and return its token
    /// (the folder name under the download directory).
    async fn prepare_playlist_output(
        &self,
        url: &str,
        title: Option<&str>,
    ) -> Result<String, CollaboratorError>;

    /// Run the download. Progress and the terminal outcome are reported on
    /// the signal stream; an `Err` here means the download never got going.
    async fn start_download(&self, request: &DownloadRequest) -> Result<(), CollaboratorError>;
}

#[async_trait]
pub trait ConfigSource: Send + Sync {
    async fn config_exists(&self) -> bool;

    /// The configured download directory, if any.
    async fn read_config(&self) -> Option<String>;

    async fn create_config(&self, dir: &str) -> Result<(), CollaboratorError>;
}

#[async_trait]
pub trait FolderPicker: Send + Sync {
    /// `None` when the user dismissed the dialog.
    async fn pick_folder(&self) -> Option<PathBuf>;
}
