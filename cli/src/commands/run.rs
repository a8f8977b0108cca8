use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::Context;
use colored::*;
use tracing::{Instrument, Span, info_span, warn};
use tracing_indicatif::span_ext::IndicatifSpanExt;
use tracr_common::config::CampaignConfig;
use tracr_common::network::destination::parse_list;
use tracr_core::campaign::{CampaignCounts, CampaignScheduler, ProbeTask, TaskState};
use tracr_core::probe::CommandProbe;
use tracr_core::publisher::{JsonFileSink, ResultPublisher};
use tracr_protocols::payload::SourceIdentity;

use crate::commands::RunArgs;
use crate::mprint;
use crate::terminal::progress::{self, ProgressReporter};
use crate::terminal::{colors, print};

type Detail = (String, ColoredString);

pub async fn run(args: RunArgs, quiet: u8) -> anyhow::Result<()> {
    let destinations: Vec<String> = collect_destinations(&args).await?;
    if destinations.is_empty() {
        print::header("nothing to do", quiet);
        print::no_results();
        return Ok(());
    }

    let config: CampaignConfig = args.to_config();
    let hostname: String = local_hostname();
    let session: String = args
        .session
        .clone()
        .unwrap_or_else(|| default_session(&hostname));

    let sink: JsonFileSink = JsonFileSink::create(&args.output)
        .await
        .with_context(|| format!("cannot create output directory {}", args.output.display()))?;
    let source: SourceIdentity = SourceIdentity {
        name: hostname,
        address: None,
    };
    let publisher: ResultPublisher =
        ResultPublisher::new(Arc::new(sink), session.clone(), source, config.publish_attempts);

    let span: Span = if quiet == 0 {
        info_span!("campaign", indicatif.pb_show = true)
    } else {
        Span::none()
    };
    span.pb_set_style(&progress::campaign_style()?);
    span.pb_set_length(destinations.len() as u64);

    let probe: CommandProbe = CommandProbe::system(&config);
    let scheduler: CampaignScheduler = CampaignScheduler::new(
        config,
        Arc::new(probe),
        publisher,
        Arc::new(ProgressReporter::new(span.clone())),
    )?;

    if quiet == 0 {
        print::aligned_line("Session", session.as_str());
        print::aligned_line("Targets", destinations.len().to_string());
        print::aligned_line("Lanes", scheduler.config().concurrency.to_string());
        mprint!();
    }

    let interrupted: bool = drive(&scheduler, destinations, span.clone())
        .instrument(span.clone())
        .await?;

    let report: CampaignReport = CampaignReport::capture(&scheduler, interrupted);
    // The bar lives until the last span handle is gone.
    drop(scheduler);
    drop(span);

    campaign_ends(&report, &args.output, quiet);
    Ok(())
}

struct CampaignReport {
    counts: CampaignCounts,
    elapsed: Duration,
    failed: Vec<ProbeTask>,
    interrupted: bool,
}

impl CampaignReport {
    fn capture(scheduler: &CampaignScheduler, interrupted: bool) -> Self {
        Self {
            counts: scheduler.counts(),
            elapsed: scheduler.progress().elapsed,
            failed: scheduler
                .tasks()
                .into_iter()
                .filter(|task| task.state == TaskState::Failed)
                .collect(),
            interrupted,
        }
    }
}

/// Runs the campaign until it completes or Ctrl-C drains it.
async fn drive(
    scheduler: &CampaignScheduler,
    destinations: Vec<String>,
    span: Span,
) -> anyhow::Result<bool> {
    scheduler.start(destinations)?;
    let ticker = progress::spawn_eta_ticker(scheduler.clone(), span);

    let interrupted: bool = tokio::select! {
        _ = scheduler.wait_for_completion() => false,
        _ = interrupt() => true,
    };

    if interrupted {
        warn!("Interrupted, waiting for running probes to stop...");
        scheduler.cancel();
        scheduler.wait_for_quiescence().await;
    }

    ticker.abort();
    let _ = ticker.await;
    Ok(interrupted)
}

/// Resolves on Ctrl-C. Never resolves if the handler cannot be installed.
async fn interrupt() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}

async fn collect_destinations(args: &RunArgs) -> anyhow::Result<Vec<String>> {
    let mut listing: String = args.destinations.join("\n");

    if let Some(file) = &args.file {
        let contents: String = tokio::fs::read_to_string(file)
            .await
            .with_context(|| format!("cannot read destination list {}", file.display()))?;
        listing.push('\n');
        listing.push_str(&contents);
    }

    Ok(parse_list(&listing))
}

fn local_hostname() -> String {
    sys_info::hostname().unwrap_or_else(|_| "unknown".to_string())
}

fn default_session(hostname: &str) -> String {
    let secs: u64 = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    format!("{hostname}-{secs}")
}

fn campaign_ends(report: &CampaignReport, output: &Path, quiet: u8) {
    let counts: CampaignCounts = report.counts;

    if !report.failed.is_empty() && quiet < 2 {
        print::header("Unreachable Destinations", quiet);
        print_failures(&report.failed);
        mprint!();
    }

    print::header("Campaign Summary", quiet);
    if quiet == 0 {
        print::aligned_line("Traced", counts.completed.to_string().color(colors::SUCCESS));
        print::aligned_line("Failed", counts.failed.to_string().color(colors::FAILURE));
        if report.interrupted {
            print::aligned_line("Pending", counts.unfinished().to_string().color(colors::PENDING));
        }
        print::aligned_line("Results", output.display().to_string());
    }

    print_summary(counts, report.elapsed, report.interrupted, quiet);
}

fn print_failures(failed: &[ProbeTask]) {
    for (idx, task) in failed.iter().enumerate() {
        print::tree_head(idx, task.destination.host());
        let mut details: Vec<Detail> = Vec::new();
        if let Some(address) = task.destination.address() {
            details.push(("Address".to_string(), address.to_string().color(colors::IPV4_ADDR)));
        }
        details.push(("Attempts".to_string(), task.attempts.to_string().normal()));
        let reason: &str = task.last_error.as_deref().unwrap_or("unknown");
        details.push(("Reason".to_string(), reason.color(colors::FAILURE)));
        print::as_tree_one_level(details);
    }
}

fn print_summary(counts: CampaignCounts, elapsed: Duration, interrupted: bool, quiet: u8) {
    let traced: ColoredString = format!("{} destinations", counts.completed).bold().green();
    let total_time: ColoredString = format!("{:.2}s", elapsed.as_secs_f64()).bold().yellow();
    let output: ColoredString = if interrupted {
        let pending: ColoredString = format!("{} pending", counts.unfinished()).bold().yellow();
        format!("Campaign Interrupted: {traced} traced, {pending}").color(colors::TEXT_DEFAULT)
    } else {
        format!("Campaign Complete: {traced} traced in {total_time}").color(colors::TEXT_DEFAULT)
    };

    match quiet {
        0 => {
            print::fat_separator();
            print::centerln(&output.to_string());
        }
        _ => print::print(&output.to_string()),
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
