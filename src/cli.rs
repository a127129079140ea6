use crate::logging::LogFormat;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Find default config path with priority:
/// 1. /etc/autoremove/config.yml (system-wide, preferred)
/// 2. ~/.config/autoremove/config.yml (user-specific)
/// 3. Fallback to /etc even if doesn't exist
pub fn default_config_path() -> PathBuf {
    let etc_path = PathBuf::from("/etc/autoremove/config.yml");

    if etc_path.exists() {
        return etc_path;
    }

    if let Some(config_dir) = dirs::config_dir() {
        let user_path = config_dir.join("autoremove/config.yml");
        if user_path.exists() {
            return user_path;
        }
    }

    // Fallback to /etc (will show clear error if missing)
    etc_path
}

#[derive(Parser)]
#[command(name = "autoremove")]
#[command(version)]
#[command(about = "Remove torrents from your client according to declared strategies", long_about = None)]
pub struct Cli {
    /// Log output format
    #[arg(long, value_enum, global = true, default_value_t = LogFormat::Console)]
    pub log_format: LogFormat,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct RunArgs {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// Run only these tasks (repeatable); all tasks when omitted
    #[arg(short, long = "task", value_name = "TASK")]
    pub tasks: Vec<String>,

    /// View mode: show what would be removed without removing anything
    #[arg(short, long)]
    pub view: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the configured tasks once
    Run(RunArgs),

    /// Run the configured tasks periodically
    Daemon {
        #[command(flatten)]
        run: RunArgs,

        /// Interval between runs (in seconds)
        #[arg(short, long, value_name = "SECONDS", default_value = "3600")]
        interval: u64,
    },
}
