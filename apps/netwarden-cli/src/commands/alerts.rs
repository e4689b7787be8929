//! Alerts command

use netwarden_engine::format_alerts_text;

use super::Context;

pub fn run(ctx: &Context) -> anyhow::Result<()> {
    let alerts = ctx.monitor()?.alerts()?;
    ctx.emit(alerts.as_slice(), format_alerts_text)
}
