// CLI modules
mod cli;

use clap::{Parser, Subcommand};
use cli::{args::Args, op::Op, Init, Inspect, Load, Locator, Save, Version};

use tasklist::logging;
use tasklist::AppState;

command_enum! {
    (Init, Init),
    (Save, Save),
    (Load, Load),
    (Locator, Locator),
    (Inspect, Inspect),
    (Version, Version),
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Log settings come from config.toml when the state directory exists
    let config = AppState::load(args.config_path.clone())
        .map(|state| state.config)
        .unwrap_or_default();
    let level = logging::parse_level(args.log_level.as_deref().unwrap_or(&config.log_level));
    let guards = logging::init_logging(level, config.log_dir.as_deref());

    let ctx = cli::op::OpContext::new(args.config_path);

    let code = match args.command.execute(&ctx).await {
        Ok(output) => {
            println!("{}", output);
            0
        }
        Err(e) => {
            tracing::debug!("command failed: {:?}", e);
            eprintln!("Error: {}", e);
            1
        }
    };

    // Flush the non-blocking writers; exit skips destructors
    drop(guards);
    std::process::exit(code);
}
