//! Routing of a finished attempt back into the ledger.

use tracr_common::config::PublishBudget;

use super::ledger::Release;
use crate::error::{ProbeError, PublishError};

/// What happened to one attempt of one task.
#[derive(Debug)]
pub enum Outcome {
    Published,
    Canceled,
    ProbeFailed(ProbeError),
    PublishFailed(PublishError),
}

impl Outcome {
    pub fn error_message(&self) -> Option<String> {
        match self {
            Self::ProbeFailed(e) => Some(e.to_string()),
            Self::PublishFailed(e) => Some(e.to_string()),
            Self::Published | Self::Canceled => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub publish_budget: PublishBudget,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, publish_budget: PublishBudget) -> Self {
        Self {
            max_attempts,
            publish_budget,
        }
    }

    /// Decides where a task goes after its `attempts`-th execution.
    pub fn route(&self, outcome: &Outcome, attempts: u32) -> Release {
        match outcome {
            Outcome::Published => Release::Complete,
            Outcome::Canceled => Release::Requeue { refund: true },
            Outcome::PublishFailed(_) if self.publish_budget == PublishBudget::Independent => {
                Release::Fail
            }
            Outcome::ProbeFailed(_) | Outcome::PublishFailed(_) => {
                if attempts < self.max_attempts {
                    Release::Requeue { refund: false }
                } else {
                    Release::Fail
                }
            }
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
