//! Configuration management commands.

use clap::{Args, Subcommand};
use fcp_cli::{Output, OutputFormat};

use super::{get_config, print_success};
use crate::Cli;

/// Manage configuration.
///
/// Configuration is stored in ~/.fcp/config.yaml
#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: ConfigSubcommand,
}

#[derive(Subcommand)]
enum ConfigSubcommand {
    /// View the current configuration
    Show,
    /// Print the config file path
    Path,
    /// Select the input device (omit the name to use the default)
    #[command(name = "set-input")]
    SetInput {
        /// Device name, as listed by `fcp devices`
        name: Option<String>,
    },
    /// Select the output device (omit the name to use the default)
    #[command(name = "set-output")]
    SetOutput {
        /// Device name, as listed by `fcp devices`
        name: Option<String>,
    },
    /// Restore the defaults
    Reset,
}

impl ConfigCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let mut cfg = get_config(cli)?;
        match &self.command {
            ConfigSubcommand::Show => {
                let format = if cli.json { OutputFormat::Json } else { OutputFormat::Yaml };
                let out = Output::new(format, None).render(&cfg)?;
                println!("{}", out.trim_end());
            }
            ConfigSubcommand::Path => println!("{}", cfg.path().display()),
            ConfigSubcommand::SetInput { name } => {
                cfg.set_input_device(name.clone())?;
                print_success(&format!(
                    "Input device: {}",
                    cfg.input_device.as_deref().unwrap_or("default")
                ));
            }
            ConfigSubcommand::SetOutput { name } => {
                cfg.set_output_device(name.clone())?;
                print_success(&format!(
                    "Output device: {}",
                    cfg.output_device.as_deref().unwrap_or("default")
                ));
            }
            ConfigSubcommand::Reset => {
                cfg.reset()?;
                print_success(&format!("Configuration reset: {}", cfg.path().display()));
            }
        }
        Ok(())
    }
}
