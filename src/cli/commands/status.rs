//! Status command - show cache freshness and contents

use crate::cli::args::{OutputFormat, StatusArgs};
use crate::config::Settings;
use crate::coordinator::{CacheStatus, DownloadCoordinator};
use crate::error::ScaffoldResult;
use console::style;
use std::time::Duration;

/// Execute the status command
pub async fn execute(args: StatusArgs, settings: &Settings) -> ScaffoldResult<()> {
    let coordinator = DownloadCoordinator::new(settings);
    let status = coordinator.status().await;

    match args.format {
        OutputFormat::Text => print_status(&status),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&status)?),
    }
    Ok(())
}

fn print_status(status: &CacheStatus) {
    let freshness = if status.valid {
        style("fresh").green().to_string()
    } else {
        style("stale").yellow().to_string()
    };

    println!("{:<16} {}", "Cache root:", status.root.display());
    println!("{:<16} {}", "State:", freshness);
    println!(
        "{:<16} {}",
        "TTL:",
        format_duration(Duration::from_millis(status.ttl_ms))
    );

    let refreshed = status
        .last_refreshed
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string());
    println!("{:<16} {}", "Last refresh:", refreshed);

    let template = if status.template_present {
        style("present").green().to_string()
    } else {
        style("missing").red().to_string()
    };
    println!("{:<16} {}", "Template:", template);
    println!("{:<16} {}", "API documents:", status.documents.len());
    for doc in &status.documents {
        println!("  - {}", doc.id);
    }

    if status.lock_held {
        println!(
            "{}",
            style("A download is in progress in another process").yellow()
        );
    }
}

/// Format a TTL as the largest whole unit that fits
fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs == 0 {
        format!("{}ms", duration.as_millis())
    } else if secs % 3600 == 0 {
        format!("{}h", secs / 3600)
    } else if secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else {
        format!("{}s", secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_duration_units() {
        assert_eq!(format_duration(Duration::from_secs(86_400)), "24h");
        assert_eq!(format_duration(Duration::from_secs(120)), "2m");
        assert_eq!(format_duration(Duration::from_secs(90)), "90s");
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
    }
}
