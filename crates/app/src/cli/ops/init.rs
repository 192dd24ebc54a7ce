use std::path::PathBuf;

use clap::Args;

use common::crypto::{Seed, SeedError};
use tasklist::state::{AppConfig, AppState, StateError, DEFAULT_DATA_KEY_TAG, DEFAULT_KEY_PAIR_TAG};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Import an existing root secret (32 hex characters) instead of generating one
    #[arg(long)]
    pub seed_hex: Option<String>,

    /// Key pair tag of the default task list slot
    #[arg(long, default_value = DEFAULT_KEY_PAIR_TAG)]
    pub key_pair_tag: String,

    /// Data key tag of the default task list slot
    #[arg(long, default_value = DEFAULT_DATA_KEY_TAG)]
    pub data_key_tag: String,

    /// Also write daily-rolling log files to this directory
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] StateError),
    #[error("invalid --seed-hex: {0}")]
    InvalidSeed(#[from] SeedError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let seed = self.seed_hex.as_deref().map(Seed::from_hex).transpose()?;

        let config = AppConfig {
            key_pair_tag: self.key_pair_tag.clone(),
            data_key_tag: self.data_key_tag.clone(),
            log_dir: self.log_dir.clone(),
            ..AppConfig::default()
        };

        let state = AppState::init(ctx.config_path.clone(), Some(config), seed)?;

        let log_dir_str = match &state.config.log_dir {
            Some(dir) => dir.display().to_string(),
            None => "stderr only".to_string(),
        };

        let output = format!(
            "Initialized tasklist directory at: {}\n\
             - Database: {}\n\
             - Seed: {}\n\
             - Blobs: {}\n\
             - Config: {}\n\
             - Slot: {}/{}\n\
             - Logs: {}",
            state.state_dir.display(),
            state.db_path.display(),
            state.seed_path.display(),
            state.blobs_path.display(),
            state.config_path.display(),
            state.config.key_pair_tag,
            state.config.data_key_tag,
            log_dir_str
        );

        Ok(output)
    }
}
