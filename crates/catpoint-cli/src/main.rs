//! Catpoint CLI - Command-line front end for the home security engine

mod commands;
mod display;

use anyhow::Context;
use catpoint_core::{
    CatpointConfig, MemoryRepository, PersistentRepository, SecurityRepository, SecurityService,
};
use clap::Parser;
use commands::{Command, Engine};
use display::ConsoleListener;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "catpoint")]
#[command(about = "Catpoint - Home security with a cat detector")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "catpoint.toml")]
    config: PathBuf,

    /// Keep all state in memory for this run
    #[arg(long)]
    in_memory: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let Some(command) = cli.command else {
        println!("Catpoint v{} - Use --help for commands", env!("CARGO_PKG_VERSION"));
        return Ok(());
    };

    let mut config = CatpointConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if cli.in_memory {
        config.storage.in_memory = true;
    }

    let color = console::colors_enabled();
    let mut engine = build_engine(&config, color)?;

    let mut stdout = std::io::stdout();
    match command {
        Command::Shell => {
            let stdin = std::io::stdin();
            commands::run_shell(&mut engine, stdin.lock(), color, &mut stdout)
        }
        command => commands::execute(&mut engine, command, color, &mut stdout),
    }
}

fn build_engine(config: &CatpointConfig, color: bool) -> anyhow::Result<Engine> {
    let repository: Box<dyn SecurityRepository> = if config.storage.in_memory {
        info!("Using in-memory storage");
        Box::new(MemoryRepository::new())
    } else {
        let path = &config.storage.db_path;
        info!(path = %path.display(), "Opening database");
        Box::new(
            PersistentRepository::open(path)
                .with_context(|| format!("opening database {}", path.display()))?,
        )
    };

    let mut engine = SecurityService::new(repository, config.detector.build());
    engine.add_status_listener(Arc::new(ConsoleListener::new(color)));
    Ok(engine)
}
