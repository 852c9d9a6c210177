use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::collaborator::{ConfigSource, FolderPicker};
use crate::error::CollaboratorError;

/// Blocks downloads until a download folder has been configured.
///
/// Starts closed. `check` opens it when a configuration already exists;
/// otherwise the folder has to be picked (`select_folder`) or confirmed by
/// the UI (`confirm`) first.
pub struct ConfigGate {
    source: Arc<dyn ConfigSource>,
    open: AtomicBool,
}

impl ConfigGate {
    pub fn new(source: Arc<dyn ConfigSource>) -> Self {
        Self {
            source,
            open: AtomicBool::new(false),
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Consult the persisted configuration. Returns whether the gate is open.
    pub async fn check(&self) -> bool {
        let exists = self.source.config_exists().await;
        self.open.store(exists, Ordering::SeqCst);
        if !exists {
            log::info!("no download folder configured, waiting for folder selection");
        }
        exists
    }

    pub async fn download_dir(&self) -> Option<String> {
        self.source.read_config().await
    }

    /// Persist a folder chosen in the UI and open the gate.
    pub async fn confirm(&self, dir: &str) -> Result<(), CollaboratorError> {
        let dir = dir.trim();
        if dir.is_empty() {
            return Err(CollaboratorError::new("download folder must not be empty"));
        }

        self.source.create_config(dir).await?;
        self.open.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Ask the folder picker for a directory. A dismissed dialog leaves the
    /// gate as it was and returns `Ok(None)`.
    pub async fn select_folder(
        &self,
        picker: &dyn FolderPicker,
    ) -> Result<Option<PathBuf>, CollaboratorError> {
        let Some(dir) = picker.pick_folder().await else {
            log::info!("folder selection dismissed");
            return Ok(None);
        };

        self.confirm(&dir.to_string_lossy()).await?;
        Ok(Some(dir))
    }
}
