use clap::Args;

use common::document::TaskList;
use tasklist::HostError;

use crate::cli::args::SlotArgs;

#[derive(Args, Debug, Clone)]
pub struct Load {
    /// Print the task list as JSON
    #[arg(long)]
    pub json: bool,

    /// Fail if nothing was ever saved, instead of printing an empty list
    #[arg(long)]
    pub strict: bool,

    #[command(flatten)]
    pub slot: SlotArgs,
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Host(#[from] HostError),
    #[error("failed to render task list: {0}")]
    Json(#[from] serde_json::Error),
}

/// One line per item, `[x]` marking completed ones
pub fn render(list: &TaskList) -> String {
    if list.is_empty() {
        return "(no items)".to_string();
    }
    list.items
        .iter()
        .map(|item| {
            let mark = if item.is_complete { "x" } else { " " };
            format!("[{}] {}  ({})", mark, item.label, item.item_id)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Load {
    type Error = LoadError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let host = ctx.host(&self.slot).await?;

        let list = if self.strict {
            host.load().await?
        } else {
            host.hydrate().await?
        };

        if self.json {
            Ok(serde_json::to_string_pretty(&list)?)
        } else {
            Ok(render(&list))
        }
    }
}
