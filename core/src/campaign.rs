//! # Campaign Scheduling
//!
//! A campaign probes an ordered list of destinations with a fixed pool of
//! `K` concurrent lanes. Each lane repeatedly pulls the head of the pending
//! queue, runs the probe, publishes the result, and files the task according
//! to the [`RetryPolicy`]. Failed and canceled tasks re-enter the **tail** of
//! the queue, so retries are spread round-robin across the campaign.
//!
//! All task bookkeeping lives in one [`Ledger`] behind one mutex. The lock is
//! never held across an `.await`, and observer callbacks always run after it
//! has been released.
//!
//! **Cancellation** is cooperative: [`CampaignScheduler::cancel`] raises a
//! shared latch, probes notice it within their polling interval, their tasks
//! return to pending without losing an attempt, and lanes stop pulling.
//! [`CampaignScheduler::wait_for_quiescence`] resolves once nothing is running.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{Instrument, debug, debug_span, info, warn};
use tracr_common::config::CampaignConfig;
use tracr_common::network::destination::Destination;
use tracr_common::network::hop::HopList;

use crate::error::{CampaignError, ProbeError};
use crate::probe::ProbeExecutor;
use crate::progress::ProgressSnapshot;
use crate::publisher::ResultPublisher;
use crate::signal::{CancellationSignal, QuiescenceGate};

mod ledger;
mod observer;
mod policy;

pub use ledger::{CampaignCounts, CampaignSummary, ProbeTask, Release, TaskId, TaskState};
pub use observer::{CampaignObserver, NoopObserver};
pub use policy::{Outcome, RetryPolicy};

use ledger::Ledger;

/// Cheap to clone; every clone drives the same campaign.
#[derive(Clone)]
pub struct CampaignScheduler {
    shared: Arc<Shared>,
}

struct Shared {
    config: CampaignConfig,
    policy: RetryPolicy,
    ledger: Mutex<Ledger>,
    signal: CancellationSignal,
    gate: QuiescenceGate,
    executor: Arc<dyn ProbeExecutor>,
    publisher: ResultPublisher,
    observer: Arc<dyn CampaignObserver>,
    /// Epoch of the most recently completed campaign.
    completed_epoch: watch::Sender<u64>,
}

/// A task handed to a lane.
struct Assignment {
    id: TaskId,
    destination: Destination,
    attempt: u32,
}

enum Pull {
    Assigned(Assignment),
    Exhausted(Option<(u64, CampaignSummary)>),
}

/// Observer work collected under the lock and delivered after it.
#[derive(Default)]
struct Notices {
    progress: Option<(usize, usize)>,
    failed: Option<(Destination, String)>,
    completed: Option<(u64, CampaignSummary)>,
}

impl CampaignScheduler {
    pub fn new(
        config: CampaignConfig,
        executor: Arc<dyn ProbeExecutor>,
        publisher: ResultPublisher,
        observer: Arc<dyn CampaignObserver>,
    ) -> Result<Self, CampaignError> {
        config.validate()?;

        let policy: RetryPolicy = RetryPolicy::new(config.max_attempts, config.publish_budget);
        let (completed_epoch, _) = watch::channel(0);

        Ok(Self {
            shared: Arc::new(Shared {
                config,
                policy,
                ledger: Mutex::new(Ledger::new()),
                signal: CancellationSignal::new(),
                gate: QuiescenceGate::new(),
                executor,
                publisher,
                observer,
                completed_epoch,
            }),
        })
    }

    pub fn config(&self) -> &CampaignConfig {
        &self.shared.config
    }

    /// Seeds a new campaign and launches its lanes.
    ///
    /// Must be called from within a Tokio runtime. Fails if the previous
    /// campaign still has work in flight: a canceled campaign may only be
    /// replaced once it is quiescent.
    pub fn start<I, S>(&self, destinations: I) -> Result<(), CampaignError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let runtime: tokio::runtime::Handle =
            tokio::runtime::Handle::try_current().map_err(|_| CampaignError::NoRuntime)?;

        let shared: &Arc<Shared> = &self.shared;
        let (epoch, total) = {
            let mut ledger: MutexGuard<'_, Ledger> = shared.lock();

            let abandoned: bool = ledger.has_pending() && !shared.signal.is_canceled();
            if ledger.has_running() || abandoned {
                return Err(CampaignError::AlreadyRunning);
            }

            let epoch: u64 = ledger.seed(destinations.into_iter().map(Into::into));
            shared.signal.reset();
            shared.gate.close();
            (epoch, ledger.counts().total())
        };

        let lanes: usize = shared.config.concurrency;
        info!("Starting campaign of {total} destinations on {lanes} lanes");

        for lane in 0..lanes {
            let shared: Arc<Shared> = Arc::clone(shared);
            let span = debug_span!("lane", lane, epoch);
            runtime.spawn(async move { shared.run_lane(epoch).await }.instrument(span));
        }
        Ok(())
    }

    /// Requests cancellation of the running campaign. Idempotent.
    pub fn cancel(&self) {
        // Serialized with `pull`, so no lane can claim a task after the
        // latch is set and before the gate closes.
        let _ledger: MutexGuard<'_, Ledger> = self.shared.lock();
        if !self.shared.signal.is_canceled() {
            info!("Cancelling campaign");
        }
        self.shared.signal.cancel();
    }

    pub fn is_canceled(&self) -> bool {
        self.shared.signal.is_canceled()
    }

    /// Resolves once no probe is executing.
    pub async fn wait_for_quiescence(&self) {
        self.shared.gate.wait().await;
    }

    /// Resolves once the current campaign has finished every task.
    ///
    /// A canceled campaign never finishes; pair this with
    /// [`wait_for_quiescence`](Self::wait_for_quiescence) when cancelling.
    pub async fn wait_for_completion(&self) {
        let epoch: u64 = self.shared.lock().epoch();
        let mut completed: watch::Receiver<u64> = self.shared.completed_epoch.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = completed.wait_for(|done| *done >= epoch).await;
    }

    pub fn counts(&self) -> CampaignCounts {
        self.shared.lock().counts()
    }

    /// A copy of every task of the current campaign, in seeding order.
    pub fn tasks(&self) -> Vec<ProbeTask> {
        self.shared.lock().tasks().to_vec()
    }

    pub fn progress(&self) -> ProgressSnapshot {
        let ledger: MutexGuard<'_, Ledger> = self.shared.lock();
        ProgressSnapshot {
            counts: ledger.counts(),
            elapsed: ledger.elapsed(),
        }
    }

    /// Estimated time left, floored to whole seconds.
    pub fn eta(&self) -> Option<Duration> {
        self.progress()
            .remaining()
            .map(|remaining| Duration::from_secs(remaining.as_secs()))
    }

    pub fn eta_text(&self) -> String {
        self.progress().eta_text()
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn run_lane(&self, epoch: u64) {
        loop {
            let mut assignment: Assignment = match self.pull(epoch) {
                Pull::Assigned(assignment) => assignment,
                Pull::Exhausted(completed) => {
                    self.deliver(Notices {
                        completed,
                        ..Notices::default()
                    });
                    debug!("Lane idle, exiting");
                    return;
                }
            };

            let outcome: Outcome = self.attempt(&mut assignment).await;
            let notices: Notices = self.release(assignment, outcome);
            self.deliver(notices);
        }
    }

    fn pull(&self, epoch: u64) -> Pull {
        let mut ledger: MutexGuard<'_, Ledger> = self.lock();

        if ledger.epoch() != epoch {
            return Pull::Exhausted(None);
        }

        if !self.signal.is_canceled() {
            let was_idle: bool = !ledger.has_running();
            if let Some((id, task)) = ledger.take_next() {
                let assignment = Assignment {
                    id,
                    destination: task.destination.clone(),
                    attempt: task.attempts,
                };
                if was_idle {
                    self.gate.close();
                }
                return Pull::Assigned(assignment);
            }
        }

        if !ledger.has_running() {
            self.gate.open();
        }
        Pull::Exhausted(ledger.try_finish().map(|summary| (epoch, summary)))
    }

    async fn attempt(&self, assignment: &mut Assignment) -> Outcome {
        let destination: &mut Destination = &mut assignment.destination;
        debug!(
            "Probing {destination} (attempt {}/{})",
            assignment.attempt, self.config.max_attempts
        );

        let hops: HopList = match self.executor.execute(destination, &self.signal).await {
            Ok(hops) => hops,
            Err(ProbeError::Canceled) => return Outcome::Canceled,
            Err(e) => return Outcome::ProbeFailed(e),
        };

        match self.publisher.publish(destination, &hops).await {
            Ok(()) => Outcome::Published,
            Err(e) => Outcome::PublishFailed(e),
        }
    }

    fn release(&self, assignment: Assignment, outcome: Outcome) -> Notices {
        let Assignment {
            id, destination, ..
        } = assignment;
        let mut ledger: MutexGuard<'_, Ledger> = self.lock();

        let attempts: u32 = ledger.attempts(id);
        let release: Release = self.policy.route(&outcome, attempts);
        let reason: Option<String> = outcome.error_message();

        match (&release, &reason) {
            (Release::Requeue { refund: false }, Some(reason)) => {
                warn!("{destination} failed (attempt {attempts}/{}): {reason}", self.config.max_attempts);
            }
            (Release::Requeue { refund: true }, _) => debug!("{destination} canceled, requeued"),
            (Release::Fail, _) => warn!("{destination} gave up after {attempts} attempts"),
            _ => {}
        }

        ledger.release(id, destination.address(), release, reason.clone());

        let mut notices: Notices = Notices::default();
        let counts: CampaignCounts = ledger.counts();
        match release {
            Release::Complete => {
                notices.progress = Some((counts.finished(), counts.total()));
            }
            Release::Fail => {
                notices.progress = Some((counts.finished(), counts.total()));
                notices.failed = Some((destination, reason.unwrap_or_default()));
            }
            Release::Requeue { .. } => {}
        }

        if !ledger.has_running() {
            self.gate.open();
            let epoch: u64 = ledger.epoch();
            notices.completed = ledger.try_finish().map(|summary| (epoch, summary));
        }
        notices
    }

    fn deliver(&self, notices: Notices) {
        if let Some((done, total)) = notices.progress {
            self.observer.on_progress(done, total);
        }
        if let Some((destination, reason)) = notices.failed {
            self.observer.on_failed(&destination, &reason);
        }
        if let Some((epoch, summary)) = notices.completed {
            info!(
                "Campaign finished: {} completed, {} failed, {} attempts in {:.1?}",
                summary.completed, summary.failed, summary.attempts, summary.elapsed
            );
            self.observer.on_complete(&summary);
            self.completed_epoch.send_modify(|done| *done = (*done).max(epoch));
        }
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
