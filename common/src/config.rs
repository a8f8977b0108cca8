//! # Campaign Configuration
//!
//! Tuning knobs shared by the scheduler, the probe executor and the publisher.
//! Defaults mirror the behaviour of the measurement wizard this tool serves.

use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_CONCURRENCY: usize = 20;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_HOP_TIMEOUT: Duration = Duration::from_millis(1_000);
pub const DEFAULT_MAX_HOPS: u8 = 30;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_PUBLISH_ATTEMPTS: u32 = 3;

/// How a failed publication is charged against a destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PublishBudget {
    /// Exhausted publications count as a failed probe attempt, so the
    /// destination is measured again while attempts remain.
    #[default]
    Shared,
    /// Publications have their own budget. Exhausting it fails the
    /// destination without touching the probe attempts.
    Independent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignConfig {
    /// Number of lanes running probes concurrently (`K`).
    pub concurrency: usize,
    /// Maximum probe executions per destination (`R`).
    pub max_attempts: u32,
    /// Per-hop reply timeout handed to the probe mechanism.
    pub hop_timeout: Duration,
    /// Highest TTL the probe mechanism will try.
    pub max_hops: u8,
    /// How often an in-flight probe checks for cancellation.
    ///
    /// This bounds how long `cancel()` takes to drain, independently of
    /// `hop_timeout`.
    pub poll_interval: Duration,
    /// Inline submissions of one result before the publication counts as failed.
    pub publish_attempts: u32,
    pub publish_budget: PublishBudget,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            hop_timeout: DEFAULT_HOP_TIMEOUT,
            max_hops: DEFAULT_MAX_HOPS,
            poll_interval: DEFAULT_POLL_INTERVAL,
            publish_attempts: DEFAULT_PUBLISH_ATTEMPTS,
            publish_budget: PublishBudget::Shared,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("concurrency must be at least 1")]
    ZeroConcurrency,
    #[error("max attempts must be at least 1")]
    ZeroAttempts,
    #[error("publish attempts must be at least 1")]
    ZeroPublishAttempts,
    #[error("max hops must be at least 1")]
    ZeroHops,
    #[error("hop timeout must be non-zero")]
    ZeroHopTimeout,
    #[error("poll interval must be non-zero")]
    ZeroPollInterval,
}

impl CampaignConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        if self.publish_attempts == 0 {
            return Err(ConfigError::ZeroPublishAttempts);
        }
        if self.max_hops == 0 {
            return Err(ConfigError::ZeroHops);
        }
        if self.hop_timeout.is_zero() {
            return Err(ConfigError::ZeroHopTimeout);
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }
        Ok(())
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
