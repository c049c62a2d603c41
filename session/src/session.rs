//! The session: one analysis configuration, one audio backend and at most
//! one active mode.

use std::cell::RefCell;
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::Sender;
use fcp_analysis::{AnalysisConfig, Analyzer, PitchTracker, Summary, WindowResult, YinTracker};
use fcp_audio::{PlaybackCursor, peak_normalize};
use fcp_buffer::RingBuffer;

use crate::backend::{AudioBackend, StreamHandle};
use crate::error::SessionError;
use crate::live::{LiveMonitor, LiveStats, LiveUpdate};
use crate::playback::{PlaybackTicker, PlaybackUpdate, ResultTimeline};
use crate::state::SessionState;

enum Mode {
    Idle,
    Live {
        capture: Box<dyn StreamHandle>,
        monitor: LiveMonitor,
    },
    Playback {
        stream: Box<dyn StreamHandle>,
        ticker: PlaybackTicker,
        cursor: Arc<PlaybackCursor>,
    },
}

impl Mode {
    fn state(&self) -> SessionState {
        match self {
            Mode::Idle => SessionState::Idle,
            Mode::Live { .. } => SessionState::Live,
            Mode::Playback { .. } => SessionState::Playback,
        }
    }
}

/// Drives live monitoring, offline analysis and synchronised playback.
///
/// The session owns the current result sequence. Starting live capture or
/// loading a recording replaces it; playback replays it. Results can only
/// be read while idle.
///
/// Playback that reaches the end of the recording is torn down the next
/// time the session is queried, so the session returns to idle without a
/// call to [`Session::stop_playback`].
///
/// Audio streams are not `Send` on every platform, so a session stays on the
/// thread that created it. Analysis and display run on worker threads.
pub struct Session<B: AudioBackend> {
    backend: B,
    analyzer: Analyzer,
    mode: RefCell<Mode>,
    windows: Vec<WindowResult>,
    summary: Option<Summary>,
    recording: Option<Arc<[f32]>>,
}

impl<B: AudioBackend> Session<B> {
    /// Creates a session that tracks pitch with YIN.
    pub fn new(backend: B, config: &AnalysisConfig) -> Result<Self, SessionError> {
        Self::with_tracker(backend, Arc::new(YinTracker::new(config.pitch.clone())), config)
    }

    pub fn with_tracker(
        backend: B,
        tracker: Arc<dyn PitchTracker>,
        config: &AnalysisConfig,
    ) -> Result<Self, SessionError> {
        Ok(Self {
            backend,
            analyzer: Analyzer::with_tracker(tracker, config)?,
            mode: RefCell::new(Mode::Idle),
            windows: Vec::new(),
            summary: None,
            recording: None,
        })
    }

    pub fn state(&self) -> SessionState {
        self.reap_finished_playback();
        self.mode.borrow().state()
    }

    pub fn config(&self) -> &AnalysisConfig {
        self.analyzer.config()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Window results of the last live run or loaded recording.
    pub fn windows(&self) -> Result<&[WindowResult], SessionError> {
        let state = self.state();
        if !state.is_idle() {
            return Err(SessionError::ResultsUnavailable { state });
        }
        Ok(&self.windows)
    }

    /// Summary of the last live run or loaded recording, if any.
    pub fn summary(&self) -> Result<Option<&Summary>, SessionError> {
        let state = self.state();
        if !state.is_idle() {
            return Err(SessionError::ResultsUnavailable { state });
        }
        Ok(self.summary.as_ref())
    }

    /// Reports whether a recording is loaded and can be played.
    pub fn has_recording(&self) -> bool {
        self.recording.is_some()
    }

    fn update_interval(&self) -> Duration {
        Duration::from_secs_f64(self.config().update_interval)
    }

    fn clear(&mut self) {
        self.windows.clear();
        self.summary = None;
        self.recording = None;
    }

    /// Analyzes a whole recording and keeps it for playback.
    ///
    /// `audio` must be mono at the configured sample rate.
    pub fn load(&mut self, audio: Vec<f32>) -> Result<&Summary, SessionError> {
        let state = self.state();
        if !state.is_idle() {
            return Err(SessionError::Busy { state });
        }
        self.clear();

        let analysis = self.analyzer.analyze_recording(&audio);
        self.windows = analysis.windows;
        self.recording = Some(audio.into());
        Ok(self.summary.insert(analysis.summary))
    }

    /// Starts capturing and analyzing the input device.
    ///
    /// Previous results are discarded. Tick outcomes are offered to
    /// `updates` as they happen.
    pub fn start_live(&mut self, updates: Option<Sender<LiveUpdate>>) -> Result<(), SessionError> {
        let from = self.state();
        let to = from.start(SessionState::Live)?;
        self.clear();

        let config = self.config();
        let buffer = RingBuffer::<f32>::new(config.window_samples().max(1));
        let mut capture = self.backend.open_capture(config.sample_rate, buffer.clone())?;
        let monitor = match LiveMonitor::spawn(
            self.analyzer.scanner().clone(),
            buffer,
            self.update_interval(),
            updates,
        ) {
            Ok(monitor) => monitor,
            Err(e) => {
                if let Err(stop_err) = capture.stop() {
                    tracing::warn!("session: stop capture after failed start: {stop_err}");
                }
                return Err(e);
            }
        };

        *self.mode.get_mut() = Mode::Live { capture, monitor };
        tracing::info!("session: {from} -> {to}");
        Ok(())
    }

    /// Counters of the running live monitor.
    pub fn live_stats(&self) -> Option<Arc<LiveStats>> {
        match &*self.mode.borrow() {
            Mode::Live { monitor, .. } => Some(Arc::clone(monitor.stats())),
            _ => None,
        }
    }

    /// Stops capture, waits for the analysis thread and summarizes the run.
    pub fn stop_live(&mut self) -> Result<&Summary, SessionError> {
        let from = self.state();
        let to = from.stop(SessionState::Live)?;
        let Mode::Live {
            mut capture,
            monitor,
        } = self.mode.replace(Mode::Idle)
        else {
            return Err(SessionError::NotActive {
                mode: SessionState::Live,
                state: from,
            });
        };

        if let Err(e) = capture.stop() {
            tracing::warn!("session: stop capture: {e}");
        }
        drop(capture);
        self.windows = monitor.join()?;
        tracing::info!(windows = self.windows.len(), "session: {from} -> {to}");
        Ok(self.summary.insert(Summary::from_windows(&self.windows)))
    }

    /// Plays the loaded recording and emits the synchronised result each
    /// update interval.
    ///
    /// The update channel disconnects once playback reaches the end, and the
    /// session goes back to idle on its own.
    pub fn start_playback(&mut self, updates: Sender<PlaybackUpdate>) -> Result<(), SessionError> {
        let from = self.state();
        let to = from.start(SessionState::Playback)?;
        let Some(recording) = &self.recording else {
            return Err(SessionError::NothingToPlay);
        };

        let config = self.config();
        let mut samples = recording.to_vec();
        peak_normalize(&mut samples);
        let cursor = Arc::new(PlaybackCursor::new(samples, config.sample_rate));
        let timeline = ResultTimeline::new(
            self.windows.clone(),
            config.window_hop_samples(),
            config.sample_rate,
        );

        let (done_tx, done_rx) = crossbeam_channel::bounded(1);
        let mut stream = self.backend.open_playback(Arc::clone(&cursor), done_tx)?;
        let ticker = match PlaybackTicker::spawn(
            Arc::clone(&cursor),
            timeline,
            self.update_interval(),
            done_rx,
            updates,
        ) {
            Ok(ticker) => ticker,
            Err(e) => {
                if let Err(stop_err) = stream.stop() {
                    tracing::warn!("session: stop playback after failed start: {stop_err}");
                }
                return Err(e);
            }
        };

        *self.mode.get_mut() = Mode::Playback {
            stream,
            ticker,
            cursor,
        };
        tracing::info!("session: {from} -> {to}");
        Ok(())
    }

    /// Current playback position, while playing.
    pub fn playback_position(&self) -> Option<Duration> {
        match &*self.mode.borrow() {
            Mode::Playback { cursor, .. } => Some(cursor.elapsed()),
            _ => None,
        }
    }

    /// Stops playback and waits for the display ticker.
    pub fn stop_playback(&mut self) -> Result<(), SessionError> {
        let from = self.state();
        from.stop(SessionState::Playback)?;
        self.end_playback("stopped")
    }

    fn reap_finished_playback(&self) {
        let finished = matches!(
            &*self.mode.borrow(),
            Mode::Playback { cursor, .. } if cursor.is_finished()
        );
        if finished {
            if let Err(e) = self.end_playback("finished") {
                tracing::warn!("session: end playback: {e}");
            }
        }
    }

    fn end_playback(&self, reason: &str) -> Result<(), SessionError> {
        let (mut stream, ticker, cursor) = match self.mode.replace(Mode::Idle) {
            Mode::Playback {
                stream,
                ticker,
                cursor,
            } => (stream, ticker, cursor),
            other => {
                let state = other.state();
                self.mode.replace(other);
                return Err(SessionError::NotActive {
                    mode: SessionState::Playback,
                    state,
                });
            }
        };

        cursor.cancel();
        if let Err(e) = stream.stop() {
            tracing::warn!("session: stop playback: {e}");
        }
        drop(stream);
        ticker.join()?;
        tracing::info!(
            position_sec = cursor.elapsed().as_secs_f64(),
            reason,
            "session: {} -> {}",
            SessionState::Playback,
            SessionState::Idle
        );
        Ok(())
    }

    /// Stops whatever mode is active.
    pub fn stop(&mut self) -> Result<(), SessionError> {
        match self.state() {
            SessionState::Idle => Ok(()),
            SessionState::Live => self.stop_live().map(|_| ()),
            SessionState::Playback => self.stop_playback(),
        }
    }
}

impl<B: AudioBackend> Drop for Session<B> {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            tracing::warn!("session: stop on drop: {e}");
        }
    }
}
