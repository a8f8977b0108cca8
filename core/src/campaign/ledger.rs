//! The campaign **ledger**: every task of one campaign and the container it
//! currently sits in.
//!
//! The ledger itself is not synchronized. The scheduler keeps it behind a
//! single mutex so that moving a task between containers, and reading the
//! aggregate counts, are always observed atomically.

use std::collections::{HashSet, VecDeque};
use std::net::IpAddr;
use std::time::{Duration, Instant};

use tracr_common::network::destination::Destination;

pub type TaskId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Running,
    Completed,
    Failed,
}

/// One destination and its retry bookkeeping.
#[derive(Debug, Clone)]
pub struct ProbeTask {
    pub destination: Destination,
    pub attempts: u32,
    pub state: TaskState,
    pub last_error: Option<String>,
}

impl ProbeTask {
    fn new(host: String) -> Self {
        Self {
            destination: Destination::new(host),
            attempts: 0,
            state: TaskState::Pending,
            last_error: None,
        }
    }
}

/// Container sizes, read together under one lock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CampaignCounts {
    pub pending: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
}

impl CampaignCounts {
    pub fn total(&self) -> usize {
        self.pending + self.running + self.completed + self.failed
    }

    /// Tasks that will not be probed again.
    pub fn finished(&self) -> usize {
        self.completed + self.failed
    }

    pub fn unfinished(&self) -> usize {
        self.pending + self.running
    }

    pub fn is_terminal(&self) -> bool {
        self.unfinished() == 0
    }
}

/// Final report of a campaign that ran to its end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignSummary {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    /// Probe executions across all tasks, canceled ones excluded.
    pub attempts: u32,
    pub elapsed: Duration,
}

/// Where a running task goes once its lane is done with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// Back to the tail of the pending queue. `refund` returns the attempt.
    Requeue { refund: bool },
    Complete,
    Fail,
}

#[derive(Debug, Default)]
pub struct Ledger {
    epoch: u64,
    tasks: Vec<ProbeTask>,
    pending: VecDeque<TaskId>,
    running: HashSet<TaskId>,
    completed: Vec<TaskId>,
    failed: Vec<TaskId>,
    finished: bool,
    started_at: Option<Instant>,
    finished_at: Option<Instant>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the previous campaign with `hosts`, all pending in order.
    ///
    /// Returns the epoch of the new campaign.
    pub fn seed<I>(&mut self, hosts: I) -> u64
    where
        I: IntoIterator<Item = String>,
    {
        self.epoch += 1;
        self.tasks = hosts.into_iter().map(ProbeTask::new).collect();
        self.pending = (0..self.tasks.len()).collect();
        self.running.clear();
        self.completed.clear();
        self.failed.clear();
        self.finished = false;
        self.started_at = Some(Instant::now());
        self.finished_at = None;
        self.epoch
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Moves the head of the pending queue to running and charges an attempt.
    pub fn take_next(&mut self) -> Option<(TaskId, &ProbeTask)> {
        let id: TaskId = self.pending.pop_front()?;
        self.running.insert(id);

        let task: &mut ProbeTask = &mut self.tasks[id];
        task.state = TaskState::Running;
        task.attempts += 1;
        Some((id, &*task))
    }

    pub fn attempts(&self, id: TaskId) -> u32 {
        self.tasks.get(id).map_or(0, |task| task.attempts)
    }

    pub fn task(&self, id: TaskId) -> Option<&ProbeTask> {
        self.tasks.get(id)
    }

    /// Takes `id` out of running and files it according to `release`.
    ///
    /// A resolved address is kept on the task so later attempts skip the
    /// lookup. Returns `false` if `id` was not running.
    pub fn release(
        &mut self,
        id: TaskId,
        address: Option<IpAddr>,
        release: Release,
        error: Option<String>,
    ) -> bool {
        if !self.running.remove(&id) {
            return false;
        }

        let task: &mut ProbeTask = &mut self.tasks[id];
        if let Some(address) = address {
            task.destination.set_address(address);
        }
        if error.is_some() {
            task.last_error = error;
        }

        match release {
            Release::Requeue { refund } => {
                if refund {
                    task.attempts = task.attempts.saturating_sub(1);
                }
                task.state = TaskState::Pending;
                self.pending.push_back(id);
            }
            Release::Complete => {
                task.state = TaskState::Completed;
                self.completed.push(id);
            }
            Release::Fail => {
                task.state = TaskState::Failed;
                self.failed.push(id);
            }
        }
        true
    }

    /// One-shot completion check. Yields the summary only on the first call
    /// that finds nothing pending and nothing running.
    pub fn try_finish(&mut self) -> Option<CampaignSummary> {
        if self.finished || !self.pending.is_empty() || !self.running.is_empty() {
            return None;
        }
        self.finished = true;
        self.finished_at = Some(Instant::now());
        Some(self.summary())
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn has_running(&self) -> bool {
        !self.running.is_empty()
    }

    pub fn counts(&self) -> CampaignCounts {
        CampaignCounts {
            pending: self.pending.len(),
            running: self.running.len(),
            completed: self.completed.len(),
            failed: self.failed.len(),
        }
    }

    /// Time since `seed`, frozen once the campaign finishes.
    pub fn elapsed(&self) -> Duration {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => end.duration_since(start),
            (Some(start), None) => start.elapsed(),
            _ => Duration::ZERO,
        }
    }

    pub fn summary(&self) -> CampaignSummary {
        CampaignSummary {
            total: self.tasks.len(),
            completed: self.completed.len(),
            failed: self.failed.len(),
            attempts: self.tasks.iter().map(|task| task.attempts).sum(),
            elapsed: self.elapsed(),
        }
    }

    pub fn tasks(&self) -> &[ProbeTask] {
        &self.tasks
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
