//! Continuous monitoring command

use clap::Args;
use netwarden_blocklist::{BlocklistFetcher, HttpFetcher};
use netwarden_engine::{format_alerts_text, format_json, Alert};
use std::collections::HashSet;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::Context;

#[derive(Args)]
pub struct WatchArgs {
    /// Seconds between connection polls
    #[arg(short, long, default_value = "5")]
    interval: u64,

    /// Do not refresh the blocklist in the background
    #[arg(long)]
    no_refresh: bool,
}

pub fn run(ctx: &Context, args: WatchArgs) -> anyhow::Result<()> {
    let monitor = ctx.monitor()?;

    let schedule = if args.no_refresh {
        None
    } else {
        let fetcher: Arc<dyn BlocklistFetcher> = Arc::new(HttpFetcher::new(Duration::from_secs(
            ctx.config.blocklist.fetch_timeout_secs,
        ))?);
        Some(monitor.start_refresh(
            fetcher,
            ctx.config.blocklist.url.clone(),
            ctx.config.refresh_interval(),
            ctx.config.blocklist.refresh_on_start,
        )?)
    };

    let (stop_tx, stop_rx) = mpsc::channel::<()>();
    ctrlc::set_handler(move || {
        let _ = stop_tx.send(());
    })?;

    info!("Watching connections every {}s, Ctrl-C to stop", args.interval);

    let interval = Duration::from_secs(args.interval.max(1));
    let mut seen = HashSet::new();
    let mut result = Ok(());

    loop {
        match monitor.alerts() {
            Ok(alerts) => {
                let fresh = new_alerts(&mut seen, alerts);
                if let Err(e) = report(ctx, &fresh) {
                    result = Err(e);
                    break;
                }
            }
            Err(e) if e.is_permission_denied() => {
                result = Err(e.into());
                break;
            }
            Err(e) => warn!("Connection poll failed: {}", e),
        }

        match stop_rx.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => continue,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    if let Some(schedule) = schedule {
        schedule.stop();
    }
    info!("Stopped watching");

    result
}

/// Keep only alerts not reported by an earlier poll
fn new_alerts(seen: &mut HashSet<String>, alerts: Vec<Alert>) -> Vec<Alert> {
    alerts
        .into_iter()
        .filter(|alert| {
            let record = &alert.connection.record;
            let key = format!(
                "{:?}|{}|{}|{}|{}",
                record.pid, record.process_name, record.protocol, record.local, record.remote
            );
            seen.insert(key)
        })
        .collect()
}

fn report(ctx: &Context, alerts: &[Alert]) -> anyhow::Result<()> {
    if alerts.is_empty() {
        return Ok(());
    }

    if ctx.is_json() {
        for alert in alerts {
            println!("{}", format_json(alert, false)?);
        }
    } else {
        println!("{}", format_alerts_text(alerts));
    }
    Ok(())
}
