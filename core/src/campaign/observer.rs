use tracr_common::network::destination::Destination;

use super::ledger::CampaignSummary;

/// Receives campaign events. Called from lane tasks, never under the ledger
/// lock, so implementations may query the scheduler.
pub trait CampaignObserver: Send + Sync {
    /// A task reached Completed or Failed. `done` counts both.
    fn on_progress(&self, _done: usize, _total: usize) {}

    /// A task ran out of attempts.
    fn on_failed(&self, _destination: &Destination, _reason: &str) {}

    /// Fired once per campaign, when nothing is pending or running.
    fn on_complete(&self, _summary: &CampaignSummary) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl CampaignObserver for NoopObserver {}
