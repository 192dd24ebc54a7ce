// Host library: on-disk state, registry database and logging for the CLI

pub mod database;
pub mod host;
pub mod logging;
pub mod state;
pub mod version;

pub use database::Database;
pub use host::{Host, HostError};
pub use state::{AppConfig, AppState, StateError};
pub use version::BuildInfo;
