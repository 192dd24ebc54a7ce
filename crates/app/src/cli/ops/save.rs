use std::path::PathBuf;

use clap::Args;

use common::document::{ListItem, TaskList};
use tasklist::HostError;

use crate::cli::args::SlotArgs;

#[derive(Args, Debug, Clone)]
pub struct Save {
    /// Labels of new, incomplete items
    pub items: Vec<String>,

    /// Read the whole task list from a JSON file instead
    #[arg(long, conflicts_with = "items")]
    pub file: Option<PathBuf>,

    /// Add the items to the saved list instead of replacing it
    #[arg(long, conflicts_with = "file")]
    pub append: bool,

    #[command(flatten)]
    pub slot: SlotArgs,
}

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error(transparent)]
    Host(#[from] HostError),
    #[error("failed to read task list file: {0}")]
    Io(#[from] std::io::Error),
    #[error("task list file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Save {
    type Error = SaveError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let host = ctx.host(&self.slot).await?;

        let list = match &self.file {
            Some(path) => {
                let json = tokio::fs::read_to_string(path).await?;
                serde_json::from_str::<TaskList>(&json)?
            }
            None => {
                let mut list = if self.append {
                    host.hydrate().await?
                } else {
                    TaskList::default()
                };
                list.items
                    .extend(self.items.iter().map(|label| ListItem::new(label.as_str())));
                list
            }
        };

        let locator = host.save(&list).await?;
        Ok(locator.to_string())
    }
}
