//! Progress display for a running campaign.
//!
//! The campaign span carries an `indicatif` bar through `tracing-indicatif`;
//! [`ProgressReporter`] moves it as destinations finish, and
//! [`spawn_eta_ticker`] keeps its message showing the estimated time left.

use std::time::Duration;

use colored::*;
use indicatif::ProgressStyle;
use indicatif::style::TemplateError;
use tokio::task::JoinHandle;
use tracing::{Span, debug, warn};
use tracing_indicatif::span_ext::IndicatifSpanExt;
use tracr_common::network::destination::Destination;
use tracr_core::campaign::{CampaignObserver, CampaignScheduler, CampaignSummary};

const ETA_REFRESH: Duration = Duration::from_secs(1);

const TICKS: &[&str] = &[
    "▁▁▁▁▁",
    "▁▂▂▂▁",
    "▁▄▂▄▁",
    "▂▄▆▄▂",
    "▄▆█▆▄",
    "▂▄▆▄▂",
    "▁▄▂▄▁",
    "▁▂▂▂▁",
];

pub fn campaign_style() -> Result<ProgressStyle, TemplateError> {
    Ok(ProgressStyle::with_template(
        "{spinner:.blue} [{bar:30.green/bright_black}] {pos}/{len} {elapsed:.dim} {msg}",
    )?
    .progress_chars("━╸─")
    .tick_strings(TICKS))
}

pub fn spinner_style() -> Result<ProgressStyle, TemplateError> {
    Ok(ProgressStyle::with_template("{spinner:.blue} {msg}")?.tick_strings(TICKS))
}

/// Moves the campaign bar and reports destinations that were given up on.
pub struct ProgressReporter {
    span: Span,
}

impl ProgressReporter {
    pub fn new(span: Span) -> Self {
        Self { span }
    }
}

impl CampaignObserver for ProgressReporter {
    fn on_progress(&self, done: usize, _total: usize) {
        self.span.pb_set_position(done as u64);
    }

    fn on_failed(&self, destination: &Destination, reason: &str) {
        warn!("Giving up on {}: {}", destination.to_string().bold(), reason);
    }

    fn on_complete(&self, summary: &CampaignSummary) {
        debug!("Progress reporter saw completion of {} destinations", summary.total);
        self.span.pb_set_message("");
    }
}

/// Refreshes the time-left estimate on the campaign bar until aborted.
pub fn spawn_eta_ticker(scheduler: CampaignScheduler, span: Span) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(ETA_REFRESH);
        loop {
            ticker.tick().await;
            let eta: String = scheduler.eta_text();
            let message: String = if eta.is_empty() {
                "estimating...".dimmed().to_string()
            } else {
                format!("{} left", eta.bold())
            };
            span.pb_set_message(&message);
        }
    })
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
