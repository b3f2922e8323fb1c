//! Command implementations.

pub mod config;
pub mod log;

use std::path::PathBuf;
use std::sync::Arc;

use sinkhole_config::ConfigStore;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Config file the store was read from and is saved to
    pub config_path: PathBuf,

    /// Loaded settings
    pub store: Arc<ConfigStore>,

    /// Verbosity level from `-v`
    pub verbose: u8,
}
