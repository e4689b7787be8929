//! Blocklist commands

use clap::{Args, Subcommand};
use netwarden_blocklist::HttpFetcher;
use netwarden_engine::{format_blocklist_text, format_json};
use std::time::Duration;

use super::Context;

#[derive(Subcommand)]
pub enum BlocklistCommands {
    /// Show the loaded blocklist
    Show(ShowArgs),

    /// Re-read the local blocklist file
    Reload,

    /// Download the remote blocklist and replace the local copy
    Update(UpdateArgs),
}

#[derive(Args)]
pub struct ShowArgs {
    /// List every blocked address
    #[arg(long)]
    all: bool,
}

#[derive(Args)]
pub struct UpdateArgs {
    /// Source URL, overriding the configured one
    #[arg(long)]
    url: Option<String>,
}

pub fn run(ctx: &Context, cmd: BlocklistCommands) -> anyhow::Result<()> {
    let monitor = ctx.monitor()?;

    match cmd {
        BlocklistCommands::Show(args) => {
            let info = monitor.blocklist_info(args.all);
            ctx.emit(&info, format_blocklist_text)
        }
        BlocklistCommands::Reload => {
            let outcome = monitor.force_reload();
            if ctx.is_json() {
                println!("{}", format_json(&outcome, true)?);
            } else if let Some(error) = &outcome.error {
                println!("Reload failed: {}", error);
                println!("Keeping {} entries", outcome.count);
            } else {
                println!("Reloaded {} entries", outcome.count);
            }

            if outcome.error.is_some() {
                std::process::exit(1);
            }
            Ok(())
        }
        BlocklistCommands::Update(args) => {
            let url = args.url.as_deref().unwrap_or(&ctx.config.blocklist.url);
            let fetcher =
                HttpFetcher::new(Duration::from_secs(ctx.config.blocklist.fetch_timeout_secs))?;
            let count = monitor.refresh_now(&fetcher, url)?;

            if ctx.is_json() {
                let info = monitor.blocklist_info(false);
                println!("{}", format_json(&info, true)?);
            } else {
                println!(
                    "Downloaded {} entries into {}",
                    count,
                    ctx.config.blocklist.path.display()
                );
            }
            Ok(())
        }
    }
}
