mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Show {
            folder,
            all,
            encoding,
        } => commands::show::run(&folder, all, encoding.into()),
        Commands::Convert { folder, to } => commands::convert::run(&folder, to.into()),
        Commands::Progress { log } => commands::progress::run(&log),
        Commands::Version => commands::version::run(),
    }
}
