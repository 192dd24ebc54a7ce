use clap::Args;

use tasklist::HostError;

use crate::cli::args::SlotArgs;

/// Print the slot's resolvable locator; it never changes between saves
#[derive(Args, Debug, Clone)]
pub struct Locator {
    #[command(flatten)]
    pub slot: SlotArgs,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Locator {
    type Error = HostError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let host = ctx.host(&self.slot).await?;
        Ok(host.locator().to_string())
    }
}
