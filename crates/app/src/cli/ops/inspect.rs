use clap::Args;

use tasklist::HostError;

use crate::cli::args::SlotArgs;

/// Show the registry entry currently backing the slot
#[derive(Args, Debug, Clone)]
pub struct Inspect {
    #[command(flatten)]
    pub slot: SlotArgs,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Inspect {
    type Error = HostError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let host = ctx.host(&self.slot).await?;
        let locator = host.locator();

        let output = match host.inspect().await? {
            Some(state) => format!(
                "locator: {}\nrevision: {}\ncontent: {}",
                locator, state.revision, state.locator
            ),
            None => format!("locator: {}\nrevision: none (never saved)", locator),
        };
        Ok(output)
    }
}
