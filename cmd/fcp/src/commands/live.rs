use std::io::BufRead;
use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use crossbeam_channel::{never, select};
use fcp_cli::Report;
use fcp_session::{CpalBackend, Session};

use crate::Cli;

use super::{format_tick, get_config, print_summary, report_output};

/// Monitor the input device.
///
/// Prints the FCP of the last second of audio at every update interval.
/// Stops on Enter, or after --seconds, then prints the report of the run.
#[derive(Args)]
pub struct LiveCommand {
    /// Stop after this many seconds
    #[arg(short = 's', long)]
    pub seconds: Option<f64>,

    /// Write the report to a file instead of stdout
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,
}

impl LiveCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = get_config(cli)?;
        let backend = CpalBackend::new(cfg.input_device.clone(), cfg.output_device.clone());
        let mut session = Session::new(backend, &cfg.analysis)?;

        let (enter_tx, enter_rx) = crossbeam_channel::bounded::<()>(1);
        std::thread::spawn(move || {
            let mut line = String::new();
            let _ = std::io::stdin().lock().read_line(&mut line);
            let _ = enter_tx.send(());
        });
        let deadline = match self.seconds {
            Some(s) if s > 0.0 => crossbeam_channel::after(Duration::from_secs_f64(s)),
            Some(s) => anyhow::bail!("--seconds must be positive, got {s}"),
            None => never(),
        };

        let (tx, rx) = crossbeam_channel::bounded(64);
        session.start_live(Some(tx))?;
        eprintln!("Listening. Press Enter to stop.");

        let mut elapsed_sec = 0.0;
        loop {
            select! {
                recv(rx) -> update => match update {
                    Ok(update) => {
                        elapsed_sec = update.elapsed_sec;
                        println!("{}", format_tick(update.elapsed_sec, update.result.as_ref()));
                    }
                    Err(_) => break,
                },
                recv(enter_rx) -> _ => break,
                recv(deadline) -> _ => break,
            }
        }

        let stats = session.live_stats();
        let summary = session.stop_live()?.clone();
        if let Some(stats) = stats.filter(|s| s.overruns() > 0) {
            tracing::warn!(
                overruns = stats.overruns(),
                ticks = stats.ticks(),
                "live: analysis could not keep up with the update interval"
            );
        }

        let report = Report::new("live", elapsed_sec, session.windows()?, &summary);
        report_output(cli, &cfg, self.output.clone()).write(&report)?;
        print_summary(summary.mean_windowed_fcp, None);
        Ok(())
    }
}
