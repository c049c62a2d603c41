//! Session transitions driven by fake audio devices.

use std::f64::consts::PI;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::Sender;
use fcp_analysis::{AnalysisConfig, EnergyGate, Severity};
use fcp_audio::{AudioError, Direction, PlaybackCursor};
use fcp_buffer::RingBuffer;
use fcp_session::{AudioBackend, Session, SessionError, SessionState, StreamHandle};

const FS: u32 = 44100;

fn cluster_tone(seconds: f64) -> Vec<f32> {
    let n = (seconds * FS as f64) as usize;
    (0..n)
        .map(|i| {
            let t = i as f64 / FS as f64;
            (0.5 * (2.0 * PI * 500.0 * t).sin()
                + (2.0 * PI * 3000.0 * t).sin()
                + 0.3 * (2.0 * PI * 6000.0 * t).sin()) as f32
        })
        .collect()
}

/// Capture that delivers a fixed signal at once; playback that renders in
/// 100 ms blocks at roughly four times real time.
#[derive(Default)]
struct FakeBackend {
    signal: Vec<f32>,
    no_input: bool,
    captures: AtomicUsize,
}

struct FakeCapture {
    buffer: RingBuffer<f32>,
}

impl StreamHandle for FakeCapture {
    fn stop(&mut self) -> Result<(), AudioError> {
        self.buffer.close();
        Ok(())
    }
}

struct FakePlayback {
    cursor: Arc<PlaybackCursor>,
    worker: Option<JoinHandle<()>>,
}

impl StreamHandle for FakePlayback {
    fn stop(&mut self) -> Result<(), AudioError> {
        self.cursor.cancel();
        if let Some(worker) = self.worker.take() {
            worker.join().unwrap();
        }
        Ok(())
    }
}

impl AudioBackend for FakeBackend {
    fn open_capture(
        &self,
        _sample_rate: u32,
        buffer: RingBuffer<f32>,
    ) -> Result<Box<dyn StreamHandle>, AudioError> {
        if self.no_input {
            return Err(AudioError::NoDevice(Direction::Input));
        }
        self.captures.fetch_add(1, Ordering::SeqCst);
        buffer.push(&self.signal).unwrap();
        Ok(Box::new(FakeCapture { buffer }))
    }

    fn open_playback(
        &self,
        cursor: Arc<PlaybackCursor>,
        done: Sender<()>,
    ) -> Result<Box<dyn StreamHandle>, AudioError> {
        let device_cursor = Arc::clone(&cursor);
        let worker = thread::spawn(move || {
            let mut block = vec![0.0f32; 4410];
            loop {
                if device_cursor.fill(&mut block, 1) {
                    let _ = done.try_send(());
                    break;
                }
                thread::sleep(Duration::from_millis(25));
            }
        });
        Ok(Box::new(FakePlayback {
            cursor,
            worker: Some(worker),
        }))
    }
}

fn session(backend: FakeBackend) -> Session<FakeBackend> {
    Session::with_tracker(
        backend,
        Arc::new(EnergyGate::new(0.01, 0.01)),
        &AnalysisConfig::default(),
    )
    .unwrap()
}

#[test]
fn test_live_run_produces_summary() {
    let mut s = session(FakeBackend {
        signal: cluster_tone(1.0),
        ..Default::default()
    });

    let (tx, rx) = crossbeam_channel::bounded(16);
    s.start_live(Some(tx)).unwrap();
    assert_eq!(s.state(), SessionState::Live);
    assert!(matches!(
        s.windows(),
        Err(SessionError::ResultsUnavailable { state: SessionState::Live })
    ));

    let update = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(update.result.is_some());

    let summary = s.stop_live().unwrap().clone();
    assert_eq!(s.state(), SessionState::Idle);
    assert!(summary.window_count >= 1);
    assert!(summary.mean_windowed_fcp > 10.0, "mean = {}", summary.mean_windowed_fcp);
    assert!(summary.pooled_fcp.is_nan());
    assert_eq!(s.windows().unwrap().len(), summary.window_count);
    assert!(!s.has_recording());
}

#[test]
fn test_guarded_transitions() {
    let mut s = session(FakeBackend {
        signal: cluster_tone(1.0),
        ..Default::default()
    });

    assert!(matches!(
        s.stop_live(),
        Err(SessionError::NotActive { mode: SessionState::Live, state: SessionState::Idle })
    ));
    let (tx, _rx) = crossbeam_channel::unbounded();
    assert!(matches!(s.start_playback(tx), Err(SessionError::NothingToPlay)));
    assert_eq!(s.state(), SessionState::Idle);

    s.start_live(None).unwrap();
    assert!(matches!(s.start_live(None), Err(SessionError::Busy { state: SessionState::Live })));
    let (tx, _rx) = crossbeam_channel::unbounded();
    assert!(matches!(s.start_playback(tx), Err(SessionError::Busy { .. })));
    assert!(matches!(s.load(vec![0.0; 100]), Err(SessionError::Busy { .. })));
    assert!(matches!(s.stop_playback(), Err(SessionError::NotActive { .. })));
    assert_eq!(s.backend().captures.load(Ordering::SeqCst), 1);

    s.stop_live().unwrap();
    assert_eq!(s.state(), SessionState::Idle);
}

#[test]
fn test_device_failure_leaves_session_idle() {
    let mut s = session(FakeBackend {
        no_input: true,
        ..Default::default()
    });
    let err = s.start_live(None).unwrap_err();
    assert!(matches!(err, SessionError::Audio(AudioError::NoDevice(Direction::Input))));
    assert_eq!(s.state(), SessionState::Idle);
}

#[test]
fn test_playback_replays_loaded_results() {
    let mut s = session(FakeBackend::default());
    let summary = s.load(cluster_tone(2.0)).unwrap();
    assert_eq!(summary.window_count, 11);
    assert!(summary.pooled_fcp > 10.0);
    assert_eq!(Severity::classify(summary.pooled_fcp), Severity::Red);

    let (tx, rx) = crossbeam_channel::unbounded();
    s.start_playback(tx).unwrap();
    assert_eq!(s.state(), SessionState::Playback);
    assert!(s.playback_position().is_some());

    let updates: Vec<_> = rx.iter().collect();
    let last = updates.last().expect("at least the final update");
    assert!(last.finished);
    assert!(last.result.is_none());
    assert!((last.position_sec - 2.0).abs() < 1e-9);

    let synced: Vec<_> = updates.iter().filter_map(|u| u.result.as_ref()).collect();
    assert!(!synced.is_empty(), "no update fell inside an analyzed window");
    for w in synced {
        assert!(w.result.fcp > 10.0);
    }

    assert_eq!(s.state(), SessionState::Idle);
    assert_eq!(s.windows().unwrap().len(), 11);
    assert!(s.has_recording());
}

#[test]
fn test_playback_returns_to_idle_at_end() {
    let mut s = session(FakeBackend::default());
    s.load(cluster_tone(0.5)).unwrap();

    let (tx, rx) = crossbeam_channel::unbounded();
    s.start_playback(tx).unwrap();
    assert!(matches!(
        s.summary(),
        Err(SessionError::ResultsUnavailable { state: SessionState::Playback })
    ));

    // The ticker disconnects once the device has rendered everything.
    for _ in rx.iter() {}

    assert_eq!(s.state(), SessionState::Idle);
    assert!(s.playback_position().is_none());
    assert!(s.summary().unwrap().is_some());
    assert!(matches!(
        s.stop_playback(),
        Err(SessionError::NotActive { mode: SessionState::Playback, state: SessionState::Idle })
    ));

    // A finished playback does not block the next one.
    let (tx, rx) = crossbeam_channel::unbounded();
    s.start_playback(tx).unwrap();
    for _ in rx.iter() {}
    assert_eq!(s.state(), SessionState::Idle);
}

#[test]
fn test_stop_playback_midway() {
    let mut s = session(FakeBackend::default());
    s.load(cluster_tone(2.0)).unwrap();

    let (tx, rx) = crossbeam_channel::unbounded();
    s.start_playback(tx).unwrap();
    rx.recv_timeout(Duration::from_secs(5)).unwrap();
    s.stop_playback().unwrap();

    assert_eq!(s.state(), SessionState::Idle);
    let position = rx.iter().last().map(|u| u.position_sec).unwrap_or(0.0);
    assert!(position < 2.0, "position = {position}");
}

#[test]
fn test_new_run_discards_previous_results() {
    let mut s = session(FakeBackend::default());
    s.load(cluster_tone(2.0)).unwrap();
    assert_eq!(s.windows().unwrap().len(), 11);

    // The fake input is silent this time.
    s.start_live(None).unwrap();
    s.stop_live().unwrap();
    assert!(s.windows().unwrap().is_empty());
    assert!(!s.has_recording());
    assert_eq!(s.summary().unwrap().unwrap().window_count, 0);
}
