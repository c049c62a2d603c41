use std::path::PathBuf;

use clap::Args;
use fcp_audio::load_for_analysis;
use fcp_session::{CpalBackend, Session};

use crate::Cli;

use super::{format_tick, get_config, print_summary};

/// Play a WAV file with synchronised FCP.
///
/// The whole file is analyzed first. During playback the result of the
/// window under the playback position is printed at every update interval.
#[derive(Args)]
pub struct PlayCommand {
    /// WAV file to play
    pub file: PathBuf,
}

impl PlayCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = get_config(cli)?;
        let audio = load_for_analysis(&self.file, cfg.analysis.sample_rate)?;

        let backend = CpalBackend::new(cfg.input_device.clone(), cfg.output_device.clone());
        let mut session = Session::new(backend, &cfg.analysis)?;
        let summary = session.load(audio)?;
        print_summary(summary.mean_windowed_fcp, Some(summary.pooled_fcp));

        let (tx, rx) = crossbeam_channel::unbounded();
        session.start_playback(tx)?;
        for update in rx {
            if update.finished {
                println!("{}", format_tick(update.position_sec, None));
                break;
            }
            println!("{}", format_tick(update.position_sec, update.result.as_ref()));
        }
        // Idle already if the recording ran to its end.
        session.stop()?;
        Ok(())
    }
}
