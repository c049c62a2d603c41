use fcp_analysis::{Severity, WindowResult};
use fcp_cli::{AppConfig, Output, OutputFormat, load_config};

use crate::Cli;

/// Loads the configuration selected on the command line.
pub(crate) fn get_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    load_config(cli.config.as_deref())
}

/// Output for reports: `--json` wins over the configured format.
pub(crate) fn report_output(cli: &Cli, cfg: &AppConfig, file: Option<std::path::PathBuf>) -> Output {
    let format = if cli.json {
        OutputFormat::Json
    } else {
        cfg.output_format
    };
    Output::new(format, file)
}

/// One display line: `  12.30s  FCP  13.52 dB  orange  (10–15 dB)`.
pub(crate) fn format_tick(time_sec: f64, result: Option<&WindowResult>) -> String {
    match result.map(|w| w.result.fcp).filter(|v| !v.is_nan()) {
        Some(fcp) => {
            let severity = Severity::classify(fcp);
            let name = severity.to_string();
            format!(
                "{time_sec:>8.2}s  FCP {fcp:>7.2} dB  {name:<8} ({})",
                severity.label()
            )
        }
        None => format!("{time_sec:>8.2}s  FCP      -- dB  {}", Severity::Undetermined),
    }
}

/// Prints the closing summary line of a run.
pub(crate) fn print_summary(mean_windowed_fcp: f64, pooled_fcp: Option<f64>) {
    let show = |v: f64| {
        if v.is_nan() {
            "--".to_string()
        } else {
            format!("{v:.2}")
        }
    };
    eprintln!(
        "Mean FCP = {} dB ({})",
        show(mean_windowed_fcp),
        Severity::classify(mean_windowed_fcp)
    );
    if let Some(pooled) = pooled_fcp {
        eprintln!("Global FCP = {} dB ({})", show(pooled), Severity::classify(pooled));
    }
}

pub(crate) fn print_success(msg: &str) {
    eprintln!("✓ {msg}");
}
