use std::path::PathBuf;

use clap::Args;
use fcp_analysis::Analyzer;
use fcp_audio::load_for_analysis;
use fcp_cli::Report;

use crate::Cli;

use super::{get_config, print_summary, report_output};

/// Analyze a WAV file.
///
/// Prints one row per voiced window plus the field means, the mean of the
/// windowed FCPs and the FCP of all voiced audio pooled together.
#[derive(Args)]
pub struct AnalyzeCommand {
    /// WAV file to analyze
    pub file: PathBuf,

    /// Write the report to a file instead of stdout
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,
}

impl AnalyzeCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = get_config(cli)?;
        let analyzer = Analyzer::new(&cfg.analysis)?;
        let audio = load_for_analysis(&self.file, cfg.analysis.sample_rate)?;
        if audio.len() < analyzer.scanner().window_len() {
            tracing::warn!(
                "{} is shorter than one {:.1}s analysis window",
                self.file.display(),
                cfg.analysis.buffer_seconds
            );
        }

        let analysis = analyzer.analyze_recording(&audio);
        let source = self
            .file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.file.display().to_string());
        let report = Report::new(source, analysis.duration_sec, &analysis.windows, &analysis.summary);

        report_output(cli, &cfg, self.output.clone()).write(&report)?;
        print_summary(analysis.summary.mean_windowed_fcp, Some(analysis.summary.pooled_fcp));
        Ok(())
    }
}
