//! Download orchestrator
//!
//! Owns the single job: validates a submission, drives the phase machine
//! through classification and dispatch, and folds the downloader's signal
//! stream into overall progress. Every state change goes through `mutate`,
//! which publishes the resulting events while the state lock is still held,
//! so the UI sees them in the order the state changed.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, Mutex};

use crate::collaborator::{Collaborator, DownloadSignal, SignalReceiver, SignalSender};
use crate::error::{SubmitError, TransitionError};
use crate::events::AppEvent;
use crate::gate::ConfigGate;
use crate::models::{DraftRequest, Phase, RawSubmission, StatusSnapshot, UrlKind};
use crate::progress;
use crate::state::JobState;

/// Channel sizing for the event and signal streams.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub event_capacity: usize,
    pub signal_capacity: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            event_capacity: 256,
            signal_capacity: 256,
        }
    }
}

impl OrchestratorConfig {
    pub fn event_channel(&self) -> (mpsc::Sender<AppEvent>, mpsc::Receiver<AppEvent>) {
        mpsc::channel(self.event_capacity)
    }

    pub fn signal_channel(&self) -> (SignalSender, SignalReceiver) {
        mpsc::channel(self.signal_capacity)
    }
}

/// What an accepted submission led to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "message", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// The URL has nothing to download; back to idle.
    NoMatch,
    /// The download is running; progress follows on the signal stream.
    Dispatched,
    /// Classification, playlist setup or dispatch failed.
    Failed(String),
}

pub struct Orchestrator {
    collaborator: Arc<dyn Collaborator>,
    gate: Arc<ConfigGate>,
    state: Arc<Mutex<JobState>>,
    event_tx: mpsc::Sender<AppEvent>,
}

impl Orchestrator {
    pub fn new(
        collaborator: Arc<dyn Collaborator>,
        gate: Arc<ConfigGate>,
        event_tx: mpsc::Sender<AppEvent>,
    ) -> Self {
        Self {
            collaborator,
            gate,
            state: Arc::new(Mutex::new(JobState::new())),
            event_tx,
        }
    }

    /// Check the configuration gate once at startup and ask the UI for a
    /// folder when none is configured.
    pub async fn init(&self) {
        if !self.gate.check().await {
            self.mutate(|_, events| events.push(AppEvent::FolderSelectionRequired))
                .await;
        }
    }

    pub async fn snapshot(&self) -> StatusSnapshot {
        self.state.lock().await.snapshot()
    }

    pub async fn phase(&self) -> Phase {
        self.state.lock().await.phase()
    }

    async fn mutate<R>(&self, f: impl FnOnce(&mut JobState, &mut Vec<AppEvent>) -> R) -> R {
        let mut state = self.state.lock().await;
        let mut events = Vec::new();
        let out = f(&mut state, &mut events);
        for event in events {
            if self.event_tx.send(event).await.is_err() {
                log::debug!("event receiver dropped");
            }
        }
        out
    }

    /// Accept a download request from the UI.
    ///
    /// `Err` means the submission was turned away and the phase did not
    /// change. Once classification starts, problems are reported through
    /// `SubmitOutcome::Failed` and the `Failed` phase instead.
    pub async fn submit(&self, raw: RawSubmission) -> Result<SubmitOutcome, SubmitError> {
        let phase = self.phase().await;
        if phase != Phase::Idle {
            log::warn!("submission ignored, job is {phase}");
            return Err(SubmitError::Busy(phase));
        }

        if !self.gate.is_open() {
            self.mutate(|_, events| events.push(AppEvent::FolderSelectionRequired))
                .await;
            return Err(SubmitError::NotConfigured);
        }

        let draft = match DraftRequest::parse(&raw) {
            Ok(draft) => draft,
            Err(e) => {
                log::info!("submission rejected: {e}");
                let reason = e.to_string();
                self.mutate(|_, events| events.push(AppEvent::SubmissionRejected { reason }))
                    .await;
                return Err(e);
            }
        };

        self.mutate(|state, events| {
            state
                .begin_resolving()
                .map_err(|e| SubmitError::Busy(e.from))?;
            events.push(AppEvent::phase(Phase::Resolving));
            Ok(())
        })
        .await?;

        log::info!("classifying {}", draft.url);
        let classification = match self.collaborator.classify_url(&draft.url).await {
            Ok(c) => c,
            Err(e) => return Ok(self.fail(format!("could not inspect URL: {e}")).await),
        };

        let location = match classification.kind {
            UrlKind::None => {
                let url = draft.url.clone();
                self.mutate(|state, events| {
                    if state.reject_classification().is_ok() {
                        events.push(AppEvent::SubmissionRejected {
                            reason: format!("nothing to download at {url}"),
                        });
                        events.push(AppEvent::phase(Phase::Idle));
                    }
                })
                .await;
                return Ok(SubmitOutcome::NoMatch);
            }
            UrlKind::Video => None,
            UrlKind::Playlist => {
                match self
                    .collaborator
                    .prepare_playlist_output(&draft.url, classification.title.as_deref())
                    .await
                {
                    Ok(location) => Some(location),
                    Err(e) => {
                        return Ok(self
                            .fail(format!("could not prepare playlist folder: {e}"))
                            .await)
                    }
                }
            }
        };

        let request = draft.into_request(classification.kind, location);
        log::info!(
            "starting {} download {} ({})",
            request.kind.as_str(),
            request.id,
            request.format.as_str()
        );

        let started = self
            .mutate(|state, events| match state.begin_downloading(request.clone()) {
                Ok(()) => {
                    events.push(AppEvent::phase(Phase::Downloading));
                    events.push(progress_event(state));
                    true
                }
                Err(e) => {
                    log::warn!("could not start download: {e}");
                    false
                }
            })
            .await;
        if !started {
            return Ok(SubmitOutcome::Failed("job state changed during resolution".into()));
        }

        match self.collaborator.start_download(&request).await {
            Ok(()) => Ok(SubmitOutcome::Dispatched),
            Err(e) => Ok(self.fail(format!("could not start download: {e}")).await),
        }
    }

    async fn fail(&self, message: String) -> SubmitOutcome {
        let outcome = SubmitOutcome::Failed(message.clone());
        self.mutate(|state, events| match state.fail(message.clone()) {
            Ok(()) => {
                log::error!("download failed: {message}");
                events.push(AppEvent::JobFailed { message });
                events.push(AppEvent::phase(Phase::Failed));
            }
            Err(e) => log::warn!("ignoring failure ({message}): {e}"),
        })
        .await;
        outcome
    }

    /// Fold one item from the signal stream into the job state.
    pub async fn handle_signal(&self, signal: DownloadSignal) {
        match signal {
            DownloadSignal::Line(line) => {
                log::debug!("yt-dlp: {line}");
                let Some(event) = progress::parse_line(&line) else {
                    return;
                };
                self.mutate(|state, events| {
                    if state.apply_progress(event).is_some() {
                        events.push(progress_event(state));
                    }
                })
                .await;
            }
            DownloadSignal::Complete => {
                self.mutate(|state, events| {
                    let before = state.progress();
                    match state.finish() {
                        Ok(()) => {
                            if before != state.progress() {
                                events.push(progress_event(state));
                            }
                            events.push(AppEvent::phase(Phase::Finished));
                            log::info!("download finished");
                        }
                        Err(e) => log::warn!("ignoring completion: {e}"),
                    }
                })
                .await;
            }
            DownloadSignal::Failed(message) => {
                self.fail(message).await;
            }
        }
    }

    /// Drain the signal stream until every sender is gone.
    pub async fn run_listener(self: Arc<Self>, mut rx: SignalReceiver) {
        while let Some(signal) = rx.recv().await {
            self.handle_signal(signal).await;
        }
        log::debug!("download signal stream closed");
    }

    /// Dismiss a finished or failed job.
    pub async fn reset(&self) -> Result<(), TransitionError> {
        self.mutate(|state, events| {
            state.reset()?;
            events.push(AppEvent::phase(Phase::Idle));
            events.push(progress_event(state));
            Ok(())
        })
        .await
    }
}

fn progress_event(state: &JobState) -> AppEvent {
    AppEvent::ProgressChanged {
        percent: state.progress(),
        current_item: state.aggregator().current_item(),
        total_items: state.aggregator().total_items(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::collaborator::ConfigSource;
    use crate::error::CollaboratorError;
    use crate::models::{Classification, DownloadRequest, MediaFormat, Quality};
    use crate::settings::SettingsStore;

    /// Replays a fixed signal script when a download starts.
    struct FakeCollaborator {
        signals: SignalSender,
        classification: Result<Classification, String>,
        script: Vec<DownloadSignal>,
        calls: StdMutex<Vec<&'static str>>,
        started: StdMutex<Vec<DownloadRequest>>,
        prepare_error: StdMutex<Option<String>>,
        start_error: StdMutex<Option<String>>,
    }

    impl FakeCollaborator {
        fn new(
            signals: SignalSender,
            classification: Result<Classification, String>,
            script: Vec<DownloadSignal>,
        ) -> Self {
            Self {
                signals,
                classification,
                script,
                calls: StdMutex::new(Vec::new()),
                started: StdMutex::new(Vec::new()),
                prepare_error: StdMutex::new(None),
                start_error: StdMutex::new(None),
            }
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }

        fn fail_prepare(&self, message: &str) {
            *self.prepare_error.lock().unwrap() = Some(message.to_string());
        }

        fn fail_start(&self, message: &str) {
            *self.start_error.lock().unwrap() = Some(message.to_string());
        }
    }

    #[async_trait]
    impl Collaborator for FakeCollaborator {
        async fn classify_url(&self, _url: &str) -> Result<Classification, CollaboratorError> {
            self.calls.lock().unwrap().push("classify");
            self.classification.clone().map_err(CollaboratorError::new)
        }

        async fn prepare_playlist_output(
            &self,
            _url: &str,
            title: Option<&str>,
        ) -> Result<String, CollaboratorError> {
            self.calls.lock().unwrap().push("prepare");
            let error = self.prepare_error.lock().unwrap().clone();
            if let Some(message) = error {
                return Err(CollaboratorError::new(message));
            }
            Ok(title.unwrap_or("playlist").to_string())
        }

        async fn start_download(&self, request: &DownloadRequest) -> Result<(), CollaboratorError> {
            self.calls.lock().unwrap().push("start");
            let error = self.start_error.lock().unwrap().clone();
            if let Some(message) = error {
                return Err(CollaboratorError::new(message));
            }
            self.started.lock().unwrap().push(request.clone());
            for signal in &self.script {
                self.signals.send(signal.clone()).await.unwrap();
            }
            Ok(())
        }
    }

    struct Harness {
        orchestrator: Arc<Orchestrator>,
        collaborator: Arc<FakeCollaborator>,
        events: mpsc::Receiver<AppEvent>,
    }

    async fn harness(
        classification: Result<Classification, String>,
        script: Vec<DownloadSignal>,
        configured: bool,
    ) -> Harness {
        let config = OrchestratorConfig::default();
        let (event_tx, events) = config.event_channel();
        let (signal_tx, signal_rx) = config.signal_channel();

        let store = Arc::new(SettingsStore::in_memory().unwrap());
        if configured {
            store.create_config("/downloads").await.unwrap();
        }
        let gate = Arc::new(ConfigGate::new(store));

        let collaborator = Arc::new(FakeCollaborator::new(signal_tx, classification, script));
        let orchestrator = Arc::new(Orchestrator::new(collaborator.clone(), gate, event_tx));
        orchestrator.init().await;
        tokio::spawn(orchestrator.clone().run_listener(signal_rx));

        Harness {
            orchestrator,
            collaborator,
            events,
        }
    }

    fn line(s: &str) -> DownloadSignal {
        DownloadSignal::Line(s.to_string())
    }

    async fn drain_until_terminal(rx: &mut mpsc::Receiver<AppEvent>) -> Vec<AppEvent> {
        let mut seen = Vec::new();
        loop {
            let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
                .await
                .expect("timed out waiting for events")
                .expect("event channel closed");
            let terminal = matches!(
                event,
                AppEvent::PhaseChanged {
                    phase: Phase::Finished | Phase::Failed,
                    ..
                }
            );
            seen.push(event);
            if terminal {
                return seen;
            }
        }
    }

    fn drain_now(rx: &mut mpsc::Receiver<AppEvent>) -> Vec<AppEvent> {
        let mut seen = Vec::new();
        while let Ok(event) = rx.try_recv() {
            seen.push(event);
        }
        seen
    }

    fn phases(events: &[AppEvent]) -> Vec<Phase> {
        events
            .iter()
            .filter_map(|e| match e {
                AppEvent::PhaseChanged { phase, .. } => Some(*phase),
                _ => None,
            })
            .collect()
    }

    fn percents(events: &[AppEvent]) -> Vec<u8> {
        events
            .iter()
            .filter_map(|e| match e {
                AppEvent::ProgressChanged { percent, .. } => Some(*percent),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_single_video_download() {
        let mut h = harness(
            Ok(Classification::video()),
            vec![
                line("[youtube] abc: Downloading webpage"),
                line("[download] Destination: /downloads/My video 3 of 7.mp4"),
                line("[download]  12.5% of 10.00MiB at 1.00MiB/s ETA 00:09"),
                line("[download] 100% of 10.00MiB in 00:10"),
                DownloadSignal::Complete,
            ],
            true,
        )
        .await;

        let outcome = h
            .orchestrator
            .submit(RawSubmission::new(
                "https://www.youtube.com/watch?v=abc",
                "mp4",
                "1080p",
            ))
            .await
            .unwrap();
        assert_eq!(outcome, SubmitOutcome::Dispatched);

        let events = drain_until_terminal(&mut h.events).await;
        assert_eq!(
            phases(&events),
            vec![Phase::Resolving, Phase::Downloading, Phase::Finished]
        );
        assert_eq!(percents(&events), vec![0, 13, 100]);
        assert!(matches!(
            events[events.len() - 2],
            AppEvent::ProgressChanged { percent: 100, .. }
        ));

        let snapshot = h.orchestrator.snapshot().await;
        assert_eq!(snapshot.phase, Phase::Finished);
        assert_eq!(snapshot.phase_code, 3);
        let request = snapshot.request.unwrap();
        assert_eq!(request.kind, UrlKind::Video);
        assert_eq!(request.format, MediaFormat::Mp4);
        assert_eq!(request.quality, Some(Quality::P1080));
        assert_eq!(request.playlist_output_location, None);
        assert_eq!(h.collaborator.calls(), vec!["classify", "start"]);
    }

    #[tokio::test]
    async fn test_playlist_download() {
        let mut h = harness(
            Ok(Classification::playlist("Road Trip")),
            vec![
                line("[download] Downloading item 1 of 2"),
                line("[download]  50.0% of 3.00MiB"),
                line("[download] 100% of 3.00MiB"),
                line("[download] Downloading item 2 of 2"),
                line("[download]  50.0% of 4.00MiB"),
                line("[download] 100% of 4.00MiB"),
                DownloadSignal::Complete,
            ],
            true,
        )
        .await;

        let outcome = h
            .orchestrator
            .submit(RawSubmission::new(
                "https://www.youtube.com/playlist?list=PL1",
                "webm",
                "720p",
            ))
            .await
            .unwrap();
        assert_eq!(outcome, SubmitOutcome::Dispatched);

        let events = drain_until_terminal(&mut h.events).await;
        assert_eq!(percents(&events), vec![0, 25, 50, 75, 100]);
        assert_eq!(phases(&events).last(), Some(&Phase::Finished));
        assert_eq!(h.collaborator.calls(), vec!["classify", "prepare", "start"]);

        let started = h.collaborator.started.lock().unwrap().clone();
        assert_eq!(started.len(), 1);
        assert_eq!(started[0].kind, UrlKind::Playlist);
        assert_eq!(
            started[0].playlist_output_location.as_deref(),
            Some("Road Trip")
        );

        let snapshot = h.orchestrator.snapshot().await;
        assert_eq!(snapshot.current_item, 2);
        assert_eq!(snapshot.total_items, 2);
        assert_eq!(snapshot.progress, 100);
    }

    #[tokio::test]
    async fn test_audio_format_has_no_quality() {
        let mut h = harness(
            Ok(Classification::video()),
            vec![DownloadSignal::Complete],
            true,
        )
        .await;

        h.orchestrator
            .submit(RawSubmission::new("https://example.com/v/1", "mp3", ""))
            .await
            .unwrap();
        let events = drain_until_terminal(&mut h.events).await;
        // No percent lines: completion alone forces 100.
        assert_eq!(percents(&events), vec![0, 100]);

        let started = h.collaborator.started.lock().unwrap().clone();
        assert_eq!(started[0].format, MediaFormat::Mp3);
        assert_eq!(started[0].quality, None);
    }

    #[tokio::test]
    async fn test_invalid_url_never_classifies() {
        let mut h = harness(Ok(Classification::video()), vec![], true).await;

        let err = h
            .orchestrator
            .submit(RawSubmission::new("not a url", "mp4", "1080p"))
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::InvalidUrl(_)));
        assert!(h.collaborator.calls().is_empty());
        assert_eq!(h.orchestrator.phase().await, Phase::Idle);

        let events = drain_now(&mut h.events);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], AppEvent::SubmissionRejected { .. }));
    }

    #[tokio::test]
    async fn test_invalid_quality_rejected() {
        let mut h = harness(Ok(Classification::video()), vec![], true).await;

        let err = h
            .orchestrator
            .submit(RawSubmission::new("https://example.com/v/1", "mp4", "999p"))
            .await
            .unwrap_err();
        assert_eq!(err, SubmitError::InvalidQuality("999p".to_string()));
        assert!(h.collaborator.calls().is_empty());
        assert!(phases(&drain_now(&mut h.events)).is_empty());
    }

    #[tokio::test]
    async fn test_no_match_returns_to_idle() {
        let mut h = harness(Ok(Classification::none()), vec![], true).await;

        let outcome = h
            .orchestrator
            .submit(RawSubmission::new("https://example.com/about", "mp4", "480p"))
            .await
            .unwrap();
        assert_eq!(outcome, SubmitOutcome::NoMatch);
        assert_eq!(h.orchestrator.phase().await, Phase::Idle);
        assert_eq!(h.collaborator.calls(), vec!["classify"]);

        let events = drain_now(&mut h.events);
        assert_eq!(phases(&events), vec![Phase::Resolving, Phase::Idle]);
        assert!(events
            .iter()
            .any(|e| matches!(e, AppEvent::SubmissionRejected { .. })));
    }

    #[tokio::test]
    async fn test_submit_while_busy_is_ignored() {
        // Empty script: the job stays in Downloading.
        let mut h = harness(Ok(Classification::video()), vec![], true).await;

        h.orchestrator
            .submit(RawSubmission::new("https://example.com/v/1", "mp4", "360p"))
            .await
            .unwrap();
        let before = h.orchestrator.snapshot().await;
        assert_eq!(before.phase, Phase::Downloading);
        drain_now(&mut h.events);

        let err = h
            .orchestrator
            .submit(RawSubmission::new("https://example.com/v/2", "mp3", ""))
            .await
            .unwrap_err();
        assert_eq!(err, SubmitError::Busy(Phase::Downloading));
        assert_eq!(h.orchestrator.snapshot().await, before);
        assert_eq!(h.collaborator.calls(), vec!["classify", "start"]);
        assert!(drain_now(&mut h.events).is_empty());
    }

    #[tokio::test]
    async fn test_classification_error_then_reset() {
        let mut h = harness(Err("network unreachable".to_string()), vec![], true).await;

        let outcome = h
            .orchestrator
            .submit(RawSubmission::new("https://example.com/v/1", "mp4", "1080p"))
            .await
            .unwrap();
        assert!(matches!(outcome, SubmitOutcome::Failed(ref m) if m.contains("network unreachable")));

        let events = drain_until_terminal(&mut h.events).await;
        assert_eq!(phases(&events), vec![Phase::Resolving, Phase::Failed]);
        let snapshot = h.orchestrator.snapshot().await;
        assert_eq!(snapshot.phase_code, 4);
        assert!(snapshot.last_error.is_some());
        assert_eq!(h.collaborator.calls(), vec!["classify"]);

        h.orchestrator.reset().await.unwrap();
        let snapshot = h.orchestrator.snapshot().await;
        assert_eq!(snapshot.phase, Phase::Idle);
        assert_eq!(snapshot.progress, 0);
        assert_eq!(snapshot.current_item, 1);
        assert_eq!(snapshot.total_items, 1);
        assert!(snapshot.request.is_none());
        assert!(snapshot.last_error.is_none());
    }

    #[tokio::test]
    async fn test_failure_signal_wins_over_late_completion() {
        let mut h = harness(
            Ok(Classification::video()),
            vec![
                line("[download]  40.0% of 8.00MiB"),
                DownloadSignal::Failed("ERROR: HTTP Error 403: Forbidden".to_string()),
            ],
            true,
        )
        .await;

        h.orchestrator
            .submit(RawSubmission::new("https://example.com/v/1", "webm", "2160p"))
            .await
            .unwrap();
        let events = drain_until_terminal(&mut h.events).await;
        assert_eq!(percents(&events), vec![0, 40]);
        assert!(events.iter().any(|e| matches!(
            e,
            AppEvent::JobFailed { message } if message.contains("403")
        )));

        h.orchestrator.handle_signal(DownloadSignal::Complete).await;
        assert_eq!(h.orchestrator.phase().await, Phase::Failed);
        assert!(drain_now(&mut h.events).is_empty());
    }

    #[tokio::test]
    async fn test_playlist_preparation_error_fails_before_start() {
        let mut h = harness(Ok(Classification::playlist("Road Trip")), vec![], true).await;
        h.collaborator.fail_prepare("permission denied");

        let outcome = h
            .orchestrator
            .submit(RawSubmission::new(
                "https://www.youtube.com/playlist?list=PL1",
                "mp4",
                "1080p",
            ))
            .await
            .unwrap();
        assert!(matches!(outcome, SubmitOutcome::Failed(ref m) if m.contains("permission denied")));

        let events = drain_until_terminal(&mut h.events).await;
        assert_eq!(phases(&events), vec![Phase::Resolving, Phase::Failed]);
        assert_eq!(h.collaborator.calls(), vec!["classify", "prepare"]);
        assert!(h.collaborator.started.lock().unwrap().is_empty());

        let snapshot = h.orchestrator.snapshot().await;
        assert_eq!(snapshot.phase, Phase::Failed);
        assert!(snapshot
            .last_error
            .is_some_and(|e| e.contains("permission denied")));
    }

    #[tokio::test]
    async fn test_start_error_fails_download() {
        let mut h = harness(Ok(Classification::video()), vec![], true).await;
        h.collaborator.fail_start("yt-dlp not found");

        let outcome = h
            .orchestrator
            .submit(RawSubmission::new("https://example.com/v/1", "m4a", ""))
            .await
            .unwrap();
        assert!(matches!(outcome, SubmitOutcome::Failed(ref m) if m.contains("yt-dlp not found")));

        let events = drain_until_terminal(&mut h.events).await;
        assert_eq!(
            phases(&events),
            vec![Phase::Resolving, Phase::Downloading, Phase::Failed]
        );
        assert_eq!(h.collaborator.calls(), vec!["classify", "start"]);

        let snapshot = h.orchestrator.snapshot().await;
        assert_eq!(snapshot.phase_code, 4);
        assert!(snapshot
            .last_error
            .is_some_and(|e| e.contains("yt-dlp not found")));

        h.orchestrator.reset().await.unwrap();
        assert_eq!(h.orchestrator.phase().await, Phase::Idle);
    }

    #[tokio::test]
    async fn test_init_opens_gate_for_existing_config() {
        let mut h = harness(Ok(Classification::video()), vec![], true).await;
        // Nothing asks for a folder when one is already saved.
        assert!(drain_now(&mut h.events).is_empty());

        let outcome = h
            .orchestrator
            .submit(RawSubmission::new("https://example.com/v/1", "mp4", "480p"))
            .await
            .unwrap();
        assert_eq!(outcome, SubmitOutcome::Dispatched);
    }

    #[tokio::test]
    async fn test_reset_rejected_while_idle() {
        let h = harness(Ok(Classification::video()), vec![], true).await;
        assert!(h.orchestrator.reset().await.is_err());
    }

    #[tokio::test]
    async fn test_unconfigured_gate_blocks_submission() {
        let mut h = harness(Ok(Classification::video()), vec![], false).await;
        // init() already asked for a folder.
        assert_eq!(
            drain_now(&mut h.events),
            vec![AppEvent::FolderSelectionRequired]
        );

        let err = h
            .orchestrator
            .submit(RawSubmission::new("https://example.com/v/1", "mp4", "1080p"))
            .await
            .unwrap_err();
        assert_eq!(err, SubmitError::NotConfigured);
        assert!(h.collaborator.calls().is_empty());
        assert_eq!(h.orchestrator.phase().await, Phase::Idle);
        assert_eq!(
            drain_now(&mut h.events),
            vec![AppEvent::FolderSelectionRequired]
        );
    }
}
