//! Result display in step with playback.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, select};
use fcp_analysis::WindowResult;
use fcp_audio::PlaybackCursor;

use crate::error::SessionError;

/// Maps a playback position to the precomputed window that covers it.
///
/// The window index at sample `position` is `position / hop`. Windows the
/// scan omitted have no entry, so the lookup returns `None` for them.
#[derive(Debug, Clone)]
pub struct ResultTimeline {
    windows: Arc<[WindowResult]>,
    // Window index of each entry in `windows`, ascending.
    indices: Vec<usize>,
    hop: usize,
}

impl ResultTimeline {
    pub fn new(windows: impl Into<Arc<[WindowResult]>>, hop: usize, sample_rate: u32) -> Self {
        let windows = windows.into();
        let hop = hop.max(1);
        let indices = windows
            .iter()
            .map(|w| (w.start_sec * sample_rate as f64 / hop as f64).round() as usize)
            .collect();
        Self {
            windows,
            indices,
            hop,
        }
    }

    pub fn windows(&self) -> &[WindowResult] {
        &self.windows
    }

    pub fn hop(&self) -> usize {
        self.hop
    }

    /// Window index at sample `position`.
    pub fn index_at(&self, position: usize) -> usize {
        position / self.hop
    }

    /// The result to display at sample `position`.
    pub fn lookup(&self, position: usize) -> Option<&WindowResult> {
        let index = self.index_at(position);
        self.indices
            .binary_search(&index)
            .ok()
            .map(|i| &self.windows[i])
    }
}

/// What the display shows during playback.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackUpdate {
    pub position_sec: f64,
    pub window_index: usize,
    /// `None` where the window was omitted, and after playback ends.
    pub result: Option<WindowResult>,
    pub finished: bool,
}

/// Thread that samples a [`PlaybackCursor`] on a fixed interval and emits
/// the matching [`PlaybackUpdate`].
///
/// When the cursor reports the end, one last update with no result is sent
/// and the thread exits, which disconnects the update channel. A stop that
/// arrives after the end but before the device signal still sends it.
pub struct PlaybackTicker {
    stop_tx: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl PlaybackTicker {
    pub fn spawn(
        cursor: Arc<PlaybackCursor>,
        timeline: ResultTimeline,
        interval: Duration,
        done: Receiver<()>,
        updates: Sender<PlaybackUpdate>,
    ) -> Result<Self, SessionError> {
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);
        let handle = thread::Builder::new()
            .name("fcp-playback".into())
            .spawn(move || {
                let ticker = crossbeam_channel::tick(interval);
                let emit = |finished: bool| {
                    let position = cursor.position();
                    let result = if finished {
                        None
                    } else {
                        timeline.lookup(position).cloned()
                    };
                    let _ = updates.try_send(PlaybackUpdate {
                        position_sec: position as f64 / cursor.sample_rate() as f64,
                        window_index: timeline.index_at(position),
                        result,
                        finished,
                    });
                };
                loop {
                    select! {
                        recv(stop_rx) -> _ => {
                            if cursor.is_finished() {
                                emit(true);
                            }
                            break;
                        }
                        recv(done) -> _ => {
                            emit(true);
                            break;
                        }
                        recv(ticker) -> _ => emit(cursor.is_finished()),
                    }
                }
                tracing::debug!("playback: display ticker stopped");
            })
            .map_err(|source| SessionError::Spawn {
                name: "playback",
                source,
            })?;

        Ok(Self {
            stop_tx,
            handle: Some(handle),
        })
    }

    /// Stops the thread and waits for it.
    pub fn join(mut self) -> Result<(), SessionError> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<(), SessionError> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        let _ = self.stop_tx.try_send(());
        handle
            .join()
            .map_err(|_| SessionError::WorkerPanicked("playback"))
    }
}

impl Drop for PlaybackTicker {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            tracing::error!("playback ticker: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fcp_analysis::{BandedSpectrum, FcpResult};

    fn window(start_sec: f64, fcp: f64) -> WindowResult {
        WindowResult {
            start_sec,
            end_sec: start_sec + 1.0,
            result: FcpResult {
                fcp,
                ..FcpResult::undetermined()
            },
            spectrum: BandedSpectrum::default(),
        }
    }

    #[test]
    fn test_lookup_by_hop_index() {
        // Window 2 (0.2 s) was omitted by the scan.
        let timeline = ResultTimeline::new(
            vec![window(0.0, 1.0), window(0.1, 2.0), window(0.3, 4.0)],
            4410,
            44100,
        );

        assert_eq!(timeline.lookup(0).unwrap().result.fcp, 1.0);
        assert_eq!(timeline.lookup(4409).unwrap().result.fcp, 1.0);
        assert_eq!(timeline.lookup(4410).unwrap().result.fcp, 2.0);
        assert!(timeline.lookup(2 * 4410 + 5).is_none());
        assert_eq!(timeline.lookup(3 * 4410).unwrap().result.fcp, 4.0);
        assert!(timeline.lookup(100 * 4410).is_none());
        assert_eq!(timeline.index_at(3 * 4410 + 1), 3);
    }

    #[test]
    fn test_ticker_follows_cursor_and_finishes() {
        let cursor = Arc::new(PlaybackCursor::new(vec![0.1f32; 8820], 44100));
        let timeline = ResultTimeline::new(vec![window(0.0, 7.0)], 4410, 44100);
        let (done_tx, done_rx) = crossbeam_channel::bounded(1);
        let (tx, rx) = crossbeam_channel::unbounded();

        let ticker = PlaybackTicker::spawn(
            Arc::clone(&cursor),
            timeline,
            Duration::from_millis(5),
            done_rx,
            tx,
        )
        .unwrap();

        let first = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(first.window_index, 0);
        assert_eq!(first.result.unwrap().result.fcp, 7.0);
        assert!(!first.finished);

        // Drive the cursor to the end the way an output callback would.
        let mut out = vec![0.0f32; 4410];
        while !cursor.fill(&mut out, 1) {}
        done_tx.send(()).unwrap();

        let last = rx
            .iter()
            .last()
            .expect("final update before disconnect");
        assert!(last.finished);
        assert!(last.result.is_none());
        assert_eq!(last.position_sec, 0.2);
        ticker.join().unwrap();
    }
}
