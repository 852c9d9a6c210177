use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SubmitError;

/// Lifecycle of the single active download job.
///
/// The numeric codes are stable and shared with the UI:
/// - `Idle` (0): nothing running, the only phase that accepts a submission
/// - `Resolving` (1): classifying the URL / preparing the playlist folder
/// - `Downloading` (2): yt-dlp is streaming progress
/// - `Finished` (3): terminal success
/// - `Failed` (4): terminal error, distinct from the reset back to `Idle`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Resolving,
    Downloading,
    Finished,
    Failed,
}

impl Phase {
    pub fn code(self) -> u8 {
        match self {
            Phase::Idle => 0,
            Phase::Resolving => 1,
            Phase::Downloading => 2,
            Phase::Finished => 3,
            Phase::Failed => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Resolving => "resolving",
            Phase::Downloading => "downloading",
            Phase::Finished => "finished",
            Phase::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Finished | Phase::Failed)
    }

    /// Transition table. Anything not listed here is illegal.
    pub fn can_transition_to(self, next: Phase) -> bool {
        matches!(
            (self, next),
            (Phase::Idle, Phase::Resolving)
                | (Phase::Resolving, Phase::Idle)
                | (Phase::Resolving, Phase::Downloading)
                | (Phase::Resolving, Phase::Failed)
                | (Phase::Downloading, Phase::Finished)
                | (Phase::Downloading, Phase::Failed)
                | (Phase::Finished, Phase::Idle)
                | (Phase::Failed, Phase::Idle)
        )
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output container / audio format offered in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaFormat {
    Mp4,
    Webm,
    Mp3,
    M4a,
    Wav,
}

impl MediaFormat {
    pub const ALL: [MediaFormat; 5] = [
        MediaFormat::Mp4,
        MediaFormat::Webm,
        MediaFormat::Mp3,
        MediaFormat::M4a,
        MediaFormat::Wav,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MediaFormat::Mp4 => "mp4",
            MediaFormat::Webm => "webm",
            MediaFormat::Mp3 => "mp3",
            MediaFormat::M4a => "m4a",
            MediaFormat::Wav => "wav",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s.trim().to_ascii_lowercase().as_str() {
            "mp4" => MediaFormat::Mp4,
            "webm" => MediaFormat::Webm,
            "mp3" => MediaFormat::Mp3,
            "m4a" => MediaFormat::M4a,
            "wav" => MediaFormat::Wav,
            _ => return None,
        })
    }

    /// Only video containers have resolution variants.
    pub fn supports_quality(self) -> bool {
        matches!(self, MediaFormat::Mp4 | MediaFormat::Webm)
    }
}

/// Resolution tier for video containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quality {
    #[serde(rename = "2160p")]
    P2160,
    #[serde(rename = "1440p")]
    P1440,
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "480p")]
    P480,
    #[serde(rename = "360p")]
    P360,
}

impl Quality {
    pub const ALL: [Quality; 6] = [
        Quality::P2160,
        Quality::P1440,
        Quality::P1080,
        Quality::P720,
        Quality::P480,
        Quality::P360,
    ];

    pub fn height(self) -> u32 {
        match self {
            Quality::P2160 => 2160,
            Quality::P1440 => 1440,
            Quality::P1080 => 1080,
            Quality::P720 => 720,
            Quality::P480 => 480,
            Quality::P360 => 360,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Quality::P2160 => "2160p",
            Quality::P1440 => "1440p",
            Quality::P1080 => "1080p",
            Quality::P720 => "720p",
            Quality::P480 => "480p",
            Quality::P360 => "360p",
        }
    }

    /// Accepts both `1080p` and a bare `1080`.
    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.trim().to_ascii_lowercase();
        let digits = s.strip_suffix('p').unwrap_or(&s);
        let height: u32 = digits.parse().ok()?;
        Self::ALL.into_iter().find(|q| q.height() == height)
    }
}

/// What the collaborator found behind a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlKind {
    None,
    Video,
    Playlist,
}

impl UrlKind {
    pub fn as_str(self) -> &'static str {
        match self {
            UrlKind::None => "none",
            UrlKind::Video => "video",
            UrlKind::Playlist => "playlist",
        }
    }
}

/// Classification result. `title` is only filled in for playlists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub kind: UrlKind,
    pub title: Option<String>,
}

impl Classification {
    pub fn none() -> Self {
        Self {
            kind: UrlKind::None,
            title: None,
        }
    }

    pub fn video() -> Self {
        Self {
            kind: UrlKind::Video,
            title: None,
        }
    }

    pub fn playlist<S: Into<String>>(title: S) -> Self {
        Self {
            kind: UrlKind::Playlist,
            title: Some(title.into()),
        }
    }
}

/// Untrusted form input as sent by the UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSubmission {
    pub url: String,
    pub format: String,
    #[serde(default)]
    pub quality: String,
}

impl RawSubmission {
    pub fn new<U: Into<String>, F: Into<String>, Q: Into<String>>(
        url: U,
        format: F,
        quality: Q,
    ) -> Self {
        Self {
            url: url.into(),
            format: format.into(),
            quality: quality.into(),
        }
    }
}

/// Validated form input, before the URL has been classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftRequest {
    pub url: String,
    pub format: MediaFormat,
    pub quality: Option<Quality>,
}

impl DraftRequest {
    /// Validate a raw submission. The URL check comes first so a bad URL is
    /// always reported as such, whatever else is wrong with the form.
    pub fn parse(raw: &RawSubmission) -> Result<Self, SubmitError> {
        let url = crate::url_utils::validate_download_url(&raw.url)?;

        let format = MediaFormat::from_str(&raw.format)
            .ok_or_else(|| SubmitError::InvalidFormat(raw.format.clone()))?;

        let quality = if format.supports_quality() {
            Some(
                Quality::from_str(&raw.quality)
                    .ok_or_else(|| SubmitError::InvalidQuality(raw.quality.clone()))?,
            )
        } else {
            None
        };

        Ok(Self {
            url,
            format,
            quality,
        })
    }

    /// Freeze into the immutable request handed to the downloader.
    pub fn into_request(
        self,
        kind: UrlKind,
        playlist_output_location: Option<String>,
    ) -> DownloadRequest {
        DownloadRequest {
            id: Uuid::new_v4(),
            submitted_at: Utc::now(),
            url: self.url,
            format: self.format,
            quality: self.quality,
            kind,
            playlist_output_location: playlist_output_location
                .filter(|_| kind == UrlKind::Playlist),
        }
    }
}

/// Snapshot of one accepted job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadRequest {
    pub id: Uuid,
    pub submitted_at: DateTime<Utc>,
    pub url: String,
    pub format: MediaFormat,
    /// `None` for audio-only formats.
    pub quality: Option<Quality>,
    pub kind: UrlKind,
    /// Folder name under the download directory; playlists only.
    pub playlist_output_location: Option<String>,
}

/// Read-only view of the job state for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub phase: Phase,
    pub phase_code: u8,
    /// 0..=100
    pub progress: u8,
    pub current_item: u32,
    pub total_items: u32,
    pub request: Option<DownloadRequest>,
    pub last_error: Option<String>,
}

/// Format option as listed in the UI.
#[derive(Debug, Clone, Serialize)]
pub struct FormatOption {
    pub id: &'static str,
    pub supports_quality: bool,
    pub qualities: Vec<&'static str>,
}

pub fn format_options() -> Vec<FormatOption> {
    MediaFormat::ALL
        .into_iter()
        .map(|f| FormatOption {
            id: f.as_str(),
            supports_quality: f.supports_quality(),
            qualities: if f.supports_quality() {
                Quality::ALL.into_iter().map(Quality::as_str).collect()
            } else {
                vec![]
            },
        })
        .collect()
}
