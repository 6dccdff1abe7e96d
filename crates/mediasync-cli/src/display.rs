//! Display utilities for the mediasync CLI

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use mediasync_sync::{CycleReport, HostStatus, IndexEntry, SearchHit};
use mediasync_types::{HostEndpoint, HostSyncState};
use std::time::Duration;

/// Print a cycle summary followed by one line per host
pub fn display_cycle_report(report: &CycleReport) {
    println!();
    println!(
        "{} {}",
        style("⟲").blue().bold(),
        style(format!("Cycle {}", report.cycle_id)).bold().underlined()
    );

    for outcome in &report.outcomes {
        match outcome.status() {
            HostStatus::Skipped => println!(
                "  {} {} {}",
                style("=").dim(),
                style(&outcome.host_name).cyan(),
                style("unchanged").dim()
            ),
            HostStatus::Synced => println!(
                "  {} {} {} {}",
                style("✓").green().bold(),
                style(&outcome.host_name).cyan(),
                style(format!("+{}", outcome.added.len())).green(),
                style(format!("-{}", outcome.removed.len())).red()
            ),
            HostStatus::Failed => println!(
                "  {} {} {}",
                style("✗").red().bold(),
                style(&outcome.host_name).cyan(),
                style(
                    outcome
                        .error
                        .as_ref()
                        .map_or_else(String::new, ToString::to_string)
                )
                .red()
            ),
        }
    }

    println!();
    println!(
        "  Skipped: {}  Synced: {}  Failed: {}",
        style(report.skipped_count()).dim(),
        style(report.synced_count()).green(),
        if report.failed_count() > 0 {
            style(report.failed_count()).red()
        } else {
            style(report.failed_count()).green()
        }
    );
    println!(
        "  Entries: {} added, {} removed in {}",
        style(report.total_added()).green(),
        style(report.total_removed()).red(),
        style(format_duration(report.duration)).blue()
    );
}

/// Print the registry with each host's last sync state
pub fn display_hosts(hosts: &[HostEndpoint], states: &[HostSyncState], entry_counts: &[usize]) {
    println!("{}", style("Registered hosts:").bold().underlined());

    for (host, count) in hosts.iter().zip(entry_counts) {
        println!("  {} {}", style(&host.name).cyan().bold(), style(&host.url).dim());

        match states.iter().find(|s| s.host_name == host.name) {
            Some(state) => {
                let version = state
                    .last_fingerprint
                    .as_ref()
                    .map_or("none", |f| f.short());
                let synced_at = state
                    .last_synced_at
                    .map_or_else(|| "never".to_string(), |t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string());
                println!("    Version: {}", style(version).yellow());
                println!("    Last synced: {}", synced_at);
                println!("    Indexed entries: {}", style(count).green());
            }
            None => println!("    {}", style("never synced").dim()),
        }
    }
}

/// Print ranked search hits
pub fn display_search_hits(query: &str, hits: &[SearchHit]) {
    if hits.is_empty() {
        display_warning(&format!("No entries match '{query}'"));
        return;
    }

    for (rank, hit) in hits.iter().enumerate() {
        display_entry(rank + 1, &hit.entry);
    }
}

fn display_entry(rank: usize, entry: &IndexEntry) {
    println!(
        "{:>3}. {} {}",
        rank,
        style(&entry.name).bold(),
        style(format!("({})", format_bytes(entry.size))).dim()
    );
    println!("     {}:{}", style(&entry.host).cyan(), entry.path);
}

/// Spinner shown while a cycle runs
pub fn create_cycle_spinner(hosts: usize) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(format!("Reconciling {hosts} hosts..."));
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Format bytes in human-readable format
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_index])
}

/// Format duration in human-readable format
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{:.2}s", duration.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

/// Display a warning message with proper formatting
pub fn display_warning(message: &str) {
    println!("{} {}", style("⚠").yellow().bold(), style(message).yellow());
}

/// Display a success message with proper formatting
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green().bold(), style(message).green());
}

/// Display an info message with proper formatting
pub fn display_info(message: &str) {
    println!("{} {}", style("ℹ").blue().bold(), style(message).blue());
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(512, "512.00 B")]
    #[case(1536, "1.50 KB")]
    #[case(5 * 1024 * 1024 * 1024, "5.00 GB")]
    fn test_format_bytes(#[case] bytes: u64, #[case] expected: &str) {
        assert_eq!(format_bytes(bytes), expected);
    }

    #[rstest]
    #[case(Duration::from_millis(1250), "1.25s")]
    #[case(Duration::from_secs(125), "2m 5s")]
    #[case(Duration::from_secs(3725), "1h 2m 5s")]
    fn test_format_duration(#[case] duration: Duration, #[case] expected: &str) {
        assert_eq!(format_duration(duration), expected);
    }
}
