//! System information command

use netwarden_platform::{detect_os, elevation_hint, get_system_info};

use super::Context;

pub fn run(ctx: &Context) -> anyhow::Result<()> {
    let sys_info = get_system_info();
    let os_info = detect_os();
    let monitor = ctx.monitor()?;
    let blocklist = monitor.blocklist_info(false);
    let captures = monitor.list_captures()?;

    if ctx.is_json() {
        let info = serde_json::json!({
            "os": sys_info.os_name,
            "os_version": sys_info.os_version,
            "distribution": os_info.distribution,
            "architecture": sys_info.architecture,
            "hostname": sys_info.hostname,
            "kernel": sys_info.kernel_version,
            "elevated": sys_info.is_elevated,
            "blocklist": {
                "path": ctx.config.blocklist.path.display().to_string(),
                "url": ctx.config.blocklist.url,
                "count": blocklist.count,
                "loaded_at": blocklist.loaded_at,
                "last_error": blocklist.last_error,
            },
            "captures": {
                "directory": ctx.config.capture.directory.display().to_string(),
                "count": captures.len(),
            },
        });
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("NetWarden System Information");
    println!("============================\n");

    println!("Operating System: {} {}", sys_info.os_name, sys_info.os_version);
    println!("Architecture: {}", sys_info.architecture);
    println!("Hostname: {}", sys_info.hostname);

    if let Some(kernel) = &sys_info.kernel_version {
        println!("Kernel: {}", kernel);
    }

    if let Some(distro) = &os_info.distribution {
        println!("Distribution: {}", distro);
    }

    println!();
    for line in privilege_lines(sys_info.is_elevated) {
        println!("{}", line);
    }

    println!("\nBlocklist: {}", ctx.config.blocklist.path.display());
    println!("  Entries: {}", blocklist.count);
    println!("  Remote: {}", ctx.config.blocklist.url);
    println!(
        "  Refresh every: {}s",
        ctx.config.blocklist.refresh_interval_secs
    );
    if let Some(error) = &blocklist.last_error {
        println!("  Last error: {}", error);
    }

    println!("\nCaptures: {}", ctx.config.capture.directory.display());
    println!("  Saved: {}", captures.len());

    Ok(())
}

fn privilege_lines(elevated: bool) -> Vec<String> {
    if elevated {
        return vec!["Privileges: Elevated (root)".to_string()];
    }
    vec![
        "Privileges: Normal user".to_string(),
        "  Connections owned by other users show as inaccessible;".to_string(),
        format!("  {}", elevation_hint()),
    ]
}
