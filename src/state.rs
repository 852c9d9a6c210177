//! Job state
//!
//! `JobState` is the one owned record behind the UI: the phase, the
//! aggregator, the published progress and what went wrong last. It is the
//! authority on which transitions are legal; callers that try anything else
//! get a `TransitionError` and the state is left untouched.

use crate::aggregator::ProgressAggregator;
use crate::error::TransitionError;
use crate::models::{DownloadRequest, Phase, StatusSnapshot};
use crate::progress::ProgressEvent;

#[derive(Debug, Clone)]
pub struct JobState {
    phase: Phase,
    aggregator: ProgressAggregator,
    progress: u8,
    request: Option<DownloadRequest>,
    last_error: Option<String>,
}

impl Default for JobState {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            aggregator: ProgressAggregator::default(),
            progress: 0,
            request: None,
            last_error: None,
        }
    }
}

impl JobState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn aggregator(&self) -> &ProgressAggregator {
        &self.aggregator
    }

    pub fn request(&self) -> Option<&DownloadRequest> {
        self.request.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            phase: self.phase,
            phase_code: self.phase.code(),
            progress: self.progress,
            current_item: self.aggregator.current_item(),
            total_items: self.aggregator.total_items(),
            request: self.request.clone(),
            last_error: self.last_error.clone(),
        }
    }

    fn transition(&mut self, to: Phase) -> Result<Phase, TransitionError> {
        let from = self.phase;
        if !from.can_transition_to(to) {
            return Err(TransitionError { from, to });
        }
        self.phase = to;
        log::info!("phase {from} -> {to}");
        Ok(from)
    }

    /// `Idle -> Resolving`. Also the re-entrancy guard: fails in every other phase.
    pub fn begin_resolving(&mut self) -> Result<(), TransitionError> {
        self.transition(Phase::Resolving)?;
        self.last_error = None;
        Ok(())
    }

    /// `Resolving -> Idle` when the URL turned out to have nothing to download.
    pub fn reject_classification(&mut self) -> Result<(), TransitionError> {
        if self.phase != Phase::Resolving {
            return Err(TransitionError {
                from: self.phase,
                to: Phase::Idle,
            });
        }
        self.transition(Phase::Idle)?;
        Ok(())
    }

    /// `Resolving -> Downloading`, starting from a fresh aggregator.
    pub fn begin_downloading(&mut self, request: DownloadRequest) -> Result<(), TransitionError> {
        self.transition(Phase::Downloading)?;
        self.aggregator.reset();
        self.progress = 0;
        self.request = Some(request);
        Ok(())
    }

    /// Feed a parsed line. Only has an effect while downloading.
    ///
    /// Returns the overall percentage when it changed, so callers publish
    /// each distinct value once.
    pub fn apply_progress(&mut self, event: ProgressEvent) -> Option<u8> {
        if self.phase != Phase::Downloading {
            return None;
        }

        let overall = self.aggregator.apply(event)?;
        if overall == self.progress {
            return None;
        }
        self.progress = overall;
        Some(overall)
    }

    /// `Downloading -> Finished`.
    pub fn finish(&mut self) -> Result<(), TransitionError> {
        self.transition(Phase::Finished)?;
        self.progress = 100;
        Ok(())
    }

    /// `Resolving | Downloading -> Failed`, keeping the message for display.
    pub fn fail<S: Into<String>>(&mut self, message: S) -> Result<(), TransitionError> {
        self.transition(Phase::Failed)?;
        self.last_error = Some(message.into());
        Ok(())
    }

    /// `Finished | Failed -> Idle`, the dismiss action. Clears the job.
    pub fn reset(&mut self) -> Result<(), TransitionError> {
        if !self.phase.is_terminal() {
            return Err(TransitionError {
                from: self.phase,
                to: Phase::Idle,
            });
        }
        self.transition(Phase::Idle)?;
        self.aggregator.reset();
        self.progress = 0;
        self.request = None;
        self.last_error = None;
        Ok(())
    }
}
