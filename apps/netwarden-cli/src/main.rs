//! NetWarden CLI
//!
//! Lists live network connections, flags suspicious ones and keeps a local
//! copy of a public malicious-IP blocklist up to date.

mod commands;

use clap::{Parser, Subcommand};
use netwarden_core::NetWardenError;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// NetWarden - network connection monitor and threat classifier
#[derive(Parser)]
#[command(name = "netwarden")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, global = true)]
    format: Option<String>,

    /// Configuration file (YAML or JSON)
    #[arg(short, long, global = true, env = "NETWARDEN_CONFIG")]
    config: Option<PathBuf>,

    /// Blocklist file, overriding the configured path
    #[arg(long, global = true)]
    blocklist: Option<PathBuf>,

    /// Capture directory, overriding the configured one
    #[arg(long, global = true)]
    captures: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List current network connections
    Connections(commands::connections::ConnectionsArgs),

    /// Show suspicious connections and why they were flagged
    Alerts,

    /// Blocklist commands
    #[command(subcommand)]
    Blocklist(commands::blocklist::BlocklistCommands),

    /// Capture commands
    #[command(subcommand)]
    Capture(commands::capture::CaptureCommands),

    /// Poll connections and report new alerts until interrupted
    Watch(commands::watch::WatchArgs),

    /// Show system and monitor information
    Info,
}

fn main() {
    let cli = Cli::parse();

    let ctx = match commands::Context::load(
        cli.config.as_deref(),
        cli.format.as_deref(),
        cli.blocklist,
        cli.captures,
    ) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(2);
        }
    };

    // Initialize logging
    let verbose = cli.verbose || ctx.config.general.verbose;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();

    let result = match cli.command {
        Commands::Connections(args) => commands::connections::run(&ctx, args),
        Commands::Alerts => commands::alerts::run(&ctx),
        Commands::Blocklist(cmd) => commands::blocklist::run(&ctx, cmd),
        Commands::Capture(cmd) => commands::capture::run(&ctx, cmd),
        Commands::Watch(args) => commands::watch::run(&ctx, args),
        Commands::Info => commands::info::run(&ctx),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        let denied = e
            .downcast_ref::<NetWardenError>()
            .is_some_and(NetWardenError::is_permission_denied);
        if denied {
            eprintln!("Hint: {}", netwarden_platform::elevation_hint());
        }
        std::process::exit(1);
    }
}
