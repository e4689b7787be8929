//! Connection listing command

use clap::Args;
use netwarden_engine::format_connections_text;

use super::Context;

#[derive(Args)]
pub struct ConnectionsArgs {
    /// Only show connections flagged as suspicious
    #[arg(long)]
    suspicious: bool,
}

pub fn run(ctx: &Context, args: ConnectionsArgs) -> anyhow::Result<()> {
    let monitor = ctx.monitor()?;

    let connections = if args.suspicious {
        monitor.suspicious_connections()?
    } else {
        monitor.connections()?
    };

    ctx.emit(connections.as_slice(), format_connections_text)
}
