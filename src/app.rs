//! Tauri shell: plugin setup, shared state and the commands the UI invokes.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tauri::{AppHandle, Manager, State};
use tauri_plugin_dialog::DialogExt;

use crate::collaborator::{ConfigSource, FolderPicker};
use crate::events::emit_event;
use crate::gate::ConfigGate;
use crate::models::{format_options, FormatOption, RawSubmission, StatusSnapshot};
use crate::orchestrator::{Orchestrator, OrchestratorConfig, SubmitOutcome};
use crate::settings::{default_download_dir, SettingsStore};
use crate::ytdlp::{YtDlpConfig, YtDlpRunner};

/// Shared application state.
pub struct AppState {
    orchestrator: Arc<Orchestrator>,
    gate: Arc<ConfigGate>,
    settings: Arc<SettingsStore>,
}

/// Native folder dialog, opened on the OS download folder.
struct DialogFolderPicker {
    app: AppHandle,
}

#[async_trait]
impl FolderPicker for DialogFolderPicker {
    async fn pick_folder(&self) -> Option<PathBuf> {
        let app = self.app.clone();
        tauri::async_runtime::spawn_blocking(move || {
            app.dialog()
                .file()
                .set_directory(default_download_dir())
                .blocking_pick_folder()
        })
        .await
        .ok()
        .flatten()
        .and_then(|path| path.into_path().ok())
    }
}

// ============================================================================
// Tauri Commands - Configuration
// ============================================================================

#[tauri::command]
async fn config_exists(state: State<'_, AppState>) -> Result<bool, String> {
    Ok(state.settings.config_exists().await)
}

#[tauri::command]
async fn create_config(state: State<'_, AppState>, dir: String) -> Result<(), String> {
    state.gate.confirm(&dir).await.map_err(|e| e.to_string())
}

#[tauri::command]
async fn read_config(state: State<'_, AppState>) -> Result<Option<String>, String> {
    Ok(state.settings.read_config().await)
}

#[tauri::command]
fn get_default_download_dir() -> String {
    default_download_dir().to_string_lossy().to_string()
}

#[tauri::command]
async fn pick_download_folder(
    app: AppHandle,
    state: State<'_, AppState>,
) -> Result<Option<String>, String> {
    let picker = DialogFolderPicker { app };
    let picked = state
        .gate
        .select_folder(&picker)
        .await
        .map_err(|e| format!("Failed to save download folder: {e}"))?;
    Ok(picked.map(|p| p.to_string_lossy().to_string()))
}

// ============================================================================
// Tauri Commands - Downloads
// ============================================================================

#[tauri::command]
async fn submit_download(
    state: State<'_, AppState>,
    url: String,
    format: String,
    quality: Option<String>,
) -> Result<SubmitOutcome, String> {
    log::info!("submit_download called with url: {url:?}, format: {format:?}");
    let raw = RawSubmission::new(url, format, quality.unwrap_or_default());
    state
        .orchestrator
        .submit(raw)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
async fn reset_download(state: State<'_, AppState>) -> Result<(), String> {
    state
        .orchestrator
        .reset()
        .await
        .map_err(|e| format!("Nothing to dismiss: {e}"))
}

#[tauri::command]
async fn get_status(state: State<'_, AppState>) -> Result<StatusSnapshot, String> {
    Ok(state.orchestrator.snapshot().await)
}

#[tauri::command]
fn get_formats() -> Vec<FormatOption> {
    format_options()
}

// ============================================================================
// App Entry Point
// ============================================================================

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .setup(|app| {
            // Enable logging in both debug and release modes
            app.handle().plugin(
                tauri_plugin_log::Builder::default()
                    .level(log::LevelFilter::Info)
                    .build(),
            )?;

            let settings = Arc::new(SettingsStore::open().map_err(tauri::Error::Anyhow)?);
            if let Some(path) = settings.path() {
                log::info!("settings at {}", path.display());
            }

            let config = OrchestratorConfig::default();
            let (event_tx, mut event_rx) = config.event_channel();
            let (signal_tx, signal_rx) = config.signal_channel();

            let gate = Arc::new(ConfigGate::new(settings.clone()));
            let runner = Arc::new(YtDlpRunner::new(
                YtDlpConfig::default(),
                settings.clone(),
                signal_tx,
            ));
            log::info!("using yt-dlp at {}", runner.yt_dlp_path().display());
            let orchestrator = Arc::new(Orchestrator::new(runner, gate.clone(), event_tx));

            tauri::async_runtime::spawn(orchestrator.clone().run_listener(signal_rx));

            let handle = app.handle().clone();
            tauri::async_runtime::spawn(async move {
                while let Some(event) = event_rx.recv().await {
                    if let Err(e) = emit_event(&handle, event) {
                        log::warn!("failed to emit event: {e}");
                    }
                }
            });

            // Settle the gate before any command can reach the orchestrator.
            tauri::async_runtime::block_on(orchestrator.init());

            app.manage(AppState {
                orchestrator,
                gate,
                settings,
            });

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            // Configuration
            config_exists,
            create_config,
            read_config,
            get_default_download_dir,
            pick_download_folder,
            // Downloads
            submit_download,
            reset_download,
            get_status,
            get_formats,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
