//! CLI commands module.

mod analyze;
mod config;
mod devices;
mod live;
mod play;
mod util;

pub use analyze::AnalyzeCommand;
pub use config::ConfigCommand;
pub use devices::DevicesCommand;
pub use live::LiveCommand;
pub use play::PlayCommand;

pub(crate) use util::*;
