use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Task, project and productivity tracker.
/// Storage defaults to ~/.workboard or a directory passed via --data-dir.
#[derive(Parser)]
#[command(name = "wb", version, about = "Task, project and productivity tracker")]
pub struct Cli {
    /// Directory holding the JSON snapshots.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Path to a config.toml file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}
