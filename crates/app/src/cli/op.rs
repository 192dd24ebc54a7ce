use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::OnceCell;

use tasklist::{AppState, Host, HostError};

use crate::cli::args::SlotArgs;

#[derive(Clone, Debug)]
pub struct OpContext {
    /// Optional custom state directory (defaults to ~/.tasklist)
    pub config_path: Option<PathBuf>,
    /// Opened on first use; the blob store is held open for the process
    host: Arc<OnceCell<Host>>,
}

impl OpContext {
    pub fn new(config_path: Option<PathBuf>) -> Self {
        Self {
            config_path,
            host: Arc::new(OnceCell::new()),
        }
    }

    /// The host, pointed at the selected slot
    pub async fn host(&self, slot: &SlotArgs) -> Result<Host, HostError> {
        let host = self
            .host
            .get_or_try_init(|| async {
                let state = AppState::load(self.config_path.clone())?;
                Host::open(&state).await
            })
            .await?;
        Ok(host
            .clone()
            .with_slot(slot.key_pair_tag.clone(), slot.data_key_tag.clone()))
    }
}

#[async_trait::async_trait]
pub trait Op: Send + Sync {
    type Error: Error + Send + Sync + 'static;
    type Output;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error>;
}

#[macro_export]
macro_rules! command_enum {
    ($(($variant:ident, $type:ty)),* $(,)?) => {
        #[derive(Subcommand, Debug, Clone)]
        pub enum Command {
            $($variant($type),)*
        }

        #[derive(Debug)]
        pub enum OpOutput {
            $($variant(<$type as $crate::cli::op::Op>::Output),)*
        }

        #[derive(Debug, thiserror::Error)]
        pub enum OpError {
            $(
                #[error(transparent)]
                $variant(<$type as $crate::cli::op::Op>::Error),
            )*
        }

        #[async_trait::async_trait]
        impl $crate::cli::op::Op for Command {
            type Output = OpOutput;
            type Error = OpError;

            async fn execute(
                &self,
                ctx: &$crate::cli::op::OpContext,
            ) -> Result<Self::Output, Self::Error> {
                match self {
                    $(
                        Command::$variant(op) => {
                            op.execute(ctx).await
                                .map(OpOutput::$variant)
                                .map_err(OpError::$variant)
                        },
                    )*
                }
            }
        }

        impl std::fmt::Display for OpOutput {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        OpOutput::$variant(output) => write!(f, "{}", output),
                    )*
                }
            }
        }
    };
}
