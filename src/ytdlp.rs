//! yt-dlp collaborator
//!
//! Classifies URLs with `yt-dlp -J --flat-playlist`, creates playlist
//! folders under the configured download directory and runs the download
//! itself, forwarding every output line on the signal stream.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

#[cfg(windows)]
use std::os::windows::process::CommandExt;

/// Windows flag to prevent console window from appearing when spawning processes.
#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x08000000;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};

use crate::collaborator::{Collaborator, ConfigSource, DownloadSignal, SignalSender};
use crate::error::CollaboratorError;
use crate::models::{Classification, DownloadRequest, MediaFormat, UrlKind};

/// How many stderr lines are kept for the failure message.
const STDERR_TAIL_LINES: usize = 20;

/// Where to find yt-dlp and ffmpeg.
#[derive(Debug, Clone)]
pub struct YtDlpConfig {
    pub yt_dlp_path: PathBuf,

    /// Passed as `--ffmpeg-location` when set.
    pub ffmpeg_path: Option<PathBuf>,

    /// Optional extra arguments injected into every yt-dlp call (e.g., proxy).
    pub global_args: Vec<String>,

    /// Timeout for classification calls (not for downloads).
    pub metadata_timeout: Duration,
}

impl YtDlpConfig {
    pub fn new(yt_dlp_path: PathBuf) -> Self {
        Self {
            yt_dlp_path,
            ffmpeg_path: None,
            global_args: vec![],
            metadata_timeout: Duration::from_secs(30),
        }
    }
}

impl Default for YtDlpConfig {
    fn default() -> Self {
        let yt_dlp_path = find_tool("yt-dlp").unwrap_or_else(|| {
            log::warn!("could not find yt-dlp, falling back to PATH lookup");
            PathBuf::from("yt-dlp")
        });
        let ffmpeg_path = find_tool("ffmpeg");
        if ffmpeg_path.is_none() {
            log::warn!("could not find ffmpeg, merging and audio extraction may fail");
        }

        Self {
            ffmpeg_path,
            ..Self::new(yt_dlp_path)
        }
    }
}

/// Locate a helper binary: bundled sidecar next to the executable first,
/// then the macOS bundle `Resources` dir, common install paths and `PATH`.
pub fn find_tool(name: &str) -> Option<PathBuf> {
    let file_name = format!("{name}{}", std::env::consts::EXE_SUFFIX);

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let sidecar = exe_dir.join(&file_name);
            if sidecar.exists() {
                log::info!("found bundled {name} sidecar at {}", sidecar.display());
                return Some(sidecar);
            }

            if let Some(parent) = exe_dir.parent() {
                let resources = parent.join("Resources").join(&file_name);
                if resources.exists() {
                    log::info!("found bundled {name} in Resources at {}", resources.display());
                    return Some(resources);
                }
            }
        }
    }

    // Bundled macOS apps don't inherit the shell PATH.
    for dir in ["/opt/homebrew/bin", "/usr/local/bin", "/opt/local/bin"] {
        let candidate = Path::new(dir).join(&file_name);
        if candidate.exists() {
            log::info!("found {name} at {}", candidate.display());
            return Some(candidate);
        }
    }

    match which::which(name) {
        Ok(path) => {
            log::info!("found {name} via PATH at {}", path.display());
            Some(path)
        }
        Err(_) => None,
    }
}

/// Decide what a `yt-dlp -J --flat-playlist` dump describes.
///
/// A playlist needs at least one entry. Anything that isn't recognisably
/// a video or a playlist has nothing to download.
pub fn classify_json(json: &str) -> Classification {
    let v: Value = match serde_json::from_str(json) {
        Ok(v) => v,
        Err(e) => {
            log::warn!("failed to parse yt-dlp JSON output: {e}");
            return Classification::none();
        }
    };

    match v.get("_type").and_then(|t| t.as_str()) {
        Some("playlist") => {
            let has_entries = v
                .get("entries")
                .and_then(|e| e.as_array())
                .is_some_and(|e| !e.is_empty());
            if !has_entries {
                return Classification::none();
            }
            let title = v
                .get("title")
                .and_then(|t| t.as_str())
                .unwrap_or_default();
            Classification::playlist(title)
        }
        Some("video") => Classification::video(),
        None if v.get("id").is_some() => Classification::video(),
        _ => Classification::none(),
    }
}

/// Create `<base>/<title>` for a playlist, or `<title> (2)`, `<title> (3)`,
/// ... when taken. Returns the folder name that was created.
pub fn create_playlist_folder(base: &Path, title: &str) -> Result<String> {
    let mut name = sanitize_filename::sanitize(title.trim());
    if name.trim().is_empty() {
        name = "playlist".to_string();
    }

    let mut candidate = name.clone();
    let mut count = 2;
    while base.join(&candidate).exists() {
        candidate = format!("{name} ({count})");
        count += 1;
    }

    let path = base.join(&candidate);
    std::fs::create_dir_all(&path)
        .with_context(|| format!("create playlist folder: {}", path.display()))?;
    log::info!("created playlist folder {}", path.display());
    Ok(candidate)
}

/// Arguments for one download, URL excluded.
pub fn build_args(request: &DownloadRequest, ffmpeg: Option<&Path>, dest: &Path) -> Vec<String> {
    let mut args = Vec::new();

    if let Some(ffmpeg) = ffmpeg {
        args.push("--ffmpeg-location".to_string());
        args.push(ffmpeg.to_string_lossy().to_string());
    }
    args.push("-P".to_string());
    args.push(dest.to_string_lossy().to_string());

    let height = request.quality.map(|q| q.height()).unwrap_or(1080);
    match request.format {
        MediaFormat::Mp4 => {
            args.push("-f".to_string());
            args.push(format!("bestvideo[height={height}]+bestaudio[ext=m4a]/best"));
            args.push("--merge-output-format".to_string());
            args.push("mp4".to_string());
        }
        MediaFormat::Webm => {
            args.push("-f".to_string());
            args.push(format!(
                "bestvideo[height={height}][ext=webm]+bestaudio[ext=webm]/best"
            ));
            args.push("--merge-output-format".to_string());
            args.push("webm".to_string());
        }
        MediaFormat::Mp3 | MediaFormat::Wav => {
            args.push("-f".to_string());
            args.push("bestaudio".to_string());
            args.push("--extract-audio".to_string());
            args.push("--audio-format".to_string());
            args.push(request.format.as_str().to_string());
        }
        MediaFormat::M4a => {
            args.push("-f".to_string());
            args.push("bestaudio[ext=m4a]".to_string());
            args.push("--extract-audio".to_string());
            args.push("--audio-format".to_string());
            args.push("m4a".to_string());
        }
    }

    if request.kind == UrlKind::Playlist {
        args.push("--yes-playlist".to_string());
    }

    args.push("-o".to_string());
    args.push("%(title)s.%(ext)s".to_string());
    args.push("--newline".to_string());
    args
}

/// The yt-dlp backed `Collaborator`.
pub struct YtDlpRunner {
    cfg: YtDlpConfig,
    config: Arc<dyn ConfigSource>,
    signals: SignalSender,
}

impl YtDlpRunner {
    pub fn new(cfg: YtDlpConfig, config: Arc<dyn ConfigSource>, signals: SignalSender) -> Self {
        Self {
            cfg,
            config,
            signals,
        }
    }

    pub fn yt_dlp_path(&self) -> &Path {
        &self.cfg.yt_dlp_path
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.cfg.yt_dlp_path);
        cmd.args(&self.cfg.global_args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // Hide console window on Windows
        #[cfg(windows)]
        cmd.creation_flags(CREATE_NO_WINDOW);

        cmd
    }

    async fn download_dir(&self) -> Result<PathBuf> {
        self.config
            .read_config()
            .await
            .map(PathBuf::from)
            .ok_or_else(|| anyhow!("no download folder configured"))
    }

    async fn dump_json(&self, url: &str) -> Result<Option<String>> {
        let mut cmd = self.command();
        cmd.args(["-J", "--no-warnings", "--flat-playlist", url])
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.cfg.metadata_timeout, cmd.output())
            .await
            .map_err(|_| anyhow!("yt-dlp timed out after {:?}", self.cfg.metadata_timeout))?
            .with_context(|| {
                format!("failed to spawn yt-dlp: {}", self.cfg.yt_dlp_path.display())
            })?;

        if !output.status.success() {
            log::warn!(
                "yt-dlp could not inspect {url} (exit {:?}): {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return Ok(None);
        }

        Ok(Some(String::from_utf8_lossy(&output.stdout).into_owned()))
    }
}

#[async_trait]
impl Collaborator for YtDlpRunner {
    async fn classify_url(&self, url: &str) -> Result<Classification, CollaboratorError> {
        let classification = match self.dump_json(url).await? {
            Some(json) => classify_json(&json),
            None => Classification::none(),
        };
        log::info!("{url} classified as {}", classification.kind.as_str());
        Ok(classification)
    }

    async fn prepare_playlist_output(
        &self,
        url: &str,
        title: Option<&str>,
    ) -> Result<String, CollaboratorError> {
        let base = self.download_dir().await?;
        let title = title.unwrap_or_default().to_string();
        log::info!("preparing playlist folder for {url}");

        let folder = tokio::task::spawn_blocking(move || create_playlist_folder(&base, &title))
            .await
            .map_err(|e| anyhow!("playlist folder task failed: {e}"))??;
        Ok(folder)
    }

    async fn start_download(&self, request: &DownloadRequest) -> Result<(), CollaboratorError> {
        let mut dest = self.download_dir().await?;
        if let Some(location) = &request.playlist_output_location {
            dest.push(location);
        }

        let args = build_args(request, self.cfg.ffmpeg_path.as_deref(), &dest);
        log::info!("starting download {} with args: {:?}", request.id, args);

        let mut cmd = self.command();
        cmd.arg(&request.url).args(&args);
        let child = cmd
            .spawn()
            .with_context(|| format!("failed to spawn yt-dlp: {}", self.cfg.yt_dlp_path.display()))?;

        let signals = self.signals.clone();
        let id = request.id;
        tokio::spawn(async move {
            let signal = match stream_output(child, &signals).await {
                Ok(()) => DownloadSignal::Complete,
                Err(e) => DownloadSignal::Failed(format!("{e:#}")),
            };
            log::info!("download {id} ended: {}", signal.topic());
            if signals.send(signal).await.is_err() {
                log::warn!("download {id} outcome dropped, listener is gone");
            }
        });

        Ok(())
    }
}

/// Forward stdout and stderr line by line until both close, then wait for
/// the exit status. A failed exit carries the stderr tail as its message.
async fn stream_output(mut child: Child, signals: &SignalSender) -> Result<()> {
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("failed to capture yt-dlp stdout"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("failed to capture yt-dlp stderr"))?;

    let mut stdout_reader = BufReader::new(stdout).lines();
    let mut stderr_reader = BufReader::new(stderr).lines();
    let mut stdout_done = false;
    let mut stderr_done = false;
    let mut stderr_tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);

    while !(stdout_done && stderr_done) {
        tokio::select! {
            line = stdout_reader.next_line(), if !stdout_done => {
                match line {
                    Ok(Some(l)) => {
                        let _ = signals.send(DownloadSignal::Line(l)).await;
                    }
                    Ok(None) => stdout_done = true,
                    Err(e) => {
                        log::error!("error reading yt-dlp stdout: {e}");
                        stdout_done = true;
                    }
                }
            }
            line = stderr_reader.next_line(), if !stderr_done => {
                match line {
                    Ok(Some(l)) => {
                        if stderr_tail.len() == STDERR_TAIL_LINES {
                            stderr_tail.pop_front();
                        }
                        stderr_tail.push_back(l.clone());
                        let _ = signals.send(DownloadSignal::Line(l)).await;
                    }
                    Ok(None) => stderr_done = true,
                    Err(e) => {
                        log::error!("error reading yt-dlp stderr: {e}");
                        stderr_done = true;
                    }
                }
            }
        }
    }

    let status = child
        .wait()
        .await
        .context("failed to wait for yt-dlp")?;
    if status.success() {
        return Ok(());
    }

    let tail = stderr_tail.into_iter().collect::<Vec<_>>().join("\n");
    if tail.trim().is_empty() {
        Err(anyhow!("yt-dlp exited with status {:?}", status.code()))
    } else {
        Err(anyhow!(tail))
    }
}
