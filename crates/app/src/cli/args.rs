pub use clap::Parser;

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "tasklist")]
#[command(about = "Save and load a task list through a signed registry slot")]
pub struct Args {
    /// Path to the tasklist state directory (defaults to ~/.tasklist)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    /// Log level override (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: crate::Command,
}

/// Selects a slot other than the one in config.toml
#[derive(clap::Args, Debug, Clone, Default)]
pub struct SlotArgs {
    /// Key pair tag (defaults to config `key_pair_tag`)
    #[arg(long)]
    pub key_pair_tag: Option<String>,

    /// Data key tag (defaults to config `data_key_tag`)
    #[arg(long)]
    pub data_key_tag: Option<String>,
}
