use clap::Args;
use fcp_audio::{Direction, list_devices};

use crate::Cli;

use super::get_config;

/// List audio devices.
///
/// Defaults are listed first and marked with `*`. Devices selected in the
/// configuration are marked with `>`.
#[derive(Args)]
pub struct DevicesCommand {}

impl DevicesCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let devices = list_devices()?;
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&devices)?);
            return Ok(());
        }

        let cfg = get_config(cli)?;
        if devices.is_empty() {
            println!("No audio devices found.");
            return Ok(());
        }
        for d in &devices {
            let mark = |direction: Direction, selected: &Option<String>| {
                if selected.as_deref() == Some(d.name.as_str()) {
                    '>'
                } else if d.is_default(direction) {
                    '*'
                } else {
                    ' '
                }
            };
            println!(
                "{}in {:>2}ch  {}out {:>2}ch  {}",
                mark(Direction::Input, &cfg.input_device),
                d.max_input_channels,
                mark(Direction::Output, &cfg.output_device),
                d.max_output_channels,
                d.name
            );
        }
        Ok(())
    }
}
