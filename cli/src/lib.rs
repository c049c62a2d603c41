//! Configuration, reports and output helpers for the `fcp` tool.

pub mod config;
pub mod output;
pub mod report;

pub use config::{AppConfig, load_config};
pub use output::{Output, OutputFormat};
pub use report::{Levels, Report, WindowRow};
