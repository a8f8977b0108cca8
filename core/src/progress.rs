//! # Progress Estimation
//!
//! The remaining time of a campaign is extrapolated from its own pace so far:
//! `remaining = elapsed × unfinished / finished`. Failed destinations count
//! as finished work here, since they will not be probed again.

use std::time::Duration;

use crate::campaign::CampaignCounts;

/// A consistent view of a campaign's counts and age.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub counts: CampaignCounts,
    pub elapsed: Duration,
}

impl ProgressSnapshot {
    /// Estimated time left, or `None` while nothing has finished yet.
    pub fn remaining(&self) -> Option<Duration> {
        estimate_remaining(self.elapsed, self.counts.finished(), self.counts.unfinished())
    }

    /// Human-readable estimate; empty when unknown or below one second.
    pub fn eta_text(&self) -> String {
        self.remaining().map(format_remaining).unwrap_or_default()
    }
}

/// `elapsed × pending / completed`, in whole milliseconds.
pub fn estimate_remaining(elapsed: Duration, completed: usize, pending: usize) -> Option<Duration> {
    if completed == 0 {
        return None;
    }
    let millis: u128 = elapsed.as_millis() * pending as u128 / completed as u128;
    let millis: u64 = u64::try_from(millis).unwrap_or(u64::MAX);
    Some(Duration::from_millis(millis))
}

/// Renders a duration as `"M minutes S seconds"`, dropping zero parts.
///
/// Sub-second remainders are truncated, so anything under one second renders
/// as an empty string.
pub fn format_remaining(remaining: Duration) -> String {
    let total: u64 = remaining.as_secs();
    let minutes: u64 = total / 60;
    let seconds: u64 = total % 60;

    match (minutes, seconds) {
        (0, 0) => String::new(),
        (m, 0) => unit(m, "minute"),
        (0, s) => unit(s, "second"),
        (m, s) => format!("{} {}", unit(m, "minute"), unit(s, "second")),
    }
}

fn unit(value: u64, name: &str) -> String {
    if value == 1 {
        format!("{value} {name}")
    } else {
        format!("{value} {name}s")
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
