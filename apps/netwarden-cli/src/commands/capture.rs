//! Capture commands

use clap::{Args, Subcommand};
use netwarden_engine::{format_connections_text, format_json};

use super::Context;

#[derive(Subcommand)]
pub enum CaptureCommands {
    /// Save the current connections as a new capture
    Save,

    /// List saved captures, most recent first
    List,

    /// Show a saved capture, classified against the current blocklist
    Load(LoadArgs),
}

#[derive(Args)]
pub struct LoadArgs {
    /// Capture file name (as printed by `capture list`)
    name: String,
}

pub fn run(ctx: &Context, cmd: CaptureCommands) -> anyhow::Result<()> {
    let monitor = ctx.monitor()?;

    match cmd {
        CaptureCommands::Save => {
            let connections = monitor.connections()?;
            let name = monitor.save_capture(&connections)?;

            if ctx.is_json() {
                let saved = serde_json::json!({
                    "status": "saved",
                    "file": name,
                    "count": connections.len(),
                });
                println!("{}", format_json(&saved, true)?);
            } else {
                println!("Saved {} connections to {}", connections.len(), name);
            }
            Ok(())
        }
        CaptureCommands::List => {
            let names = monitor.list_captures()?;
            ctx.emit(names.as_slice(), |names| {
                if names.is_empty() {
                    format!("No captures in {}", monitor.captures().dir().display())
                } else {
                    names.join("\n")
                }
            })
        }
        CaptureCommands::Load(args) => {
            let connections = monitor.review_capture(&args.name)?;
            ctx.emit(connections.as_slice(), format_connections_text)
        }
    }
}
