use fcp_analysis::ConfigError;
use fcp_audio::AudioError;
use thiserror::Error;

use crate::state::SessionState;

/// Errors from session control.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session busy: {state} is active")]
    Busy { state: SessionState },

    #[error("{mode} is not active (state: {state})")]
    NotActive {
        mode: SessionState,
        state: SessionState,
    },

    #[error("results unavailable while {state} is active")]
    ResultsUnavailable { state: SessionState },

    #[error("nothing to play: no recording loaded")]
    NothingToPlay,

    #[error("{0} worker panicked")]
    WorkerPanicked(&'static str),

    #[error("spawn {name} worker: {source}")]
    Spawn {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Audio(#[from] AudioError),
}
