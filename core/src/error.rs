//! Error types for campaign operations.

use std::process::ExitStatus;

use thiserror::Error;
use tracr_common::config::ConfigError;

/// Why a single probe did not produce a hop list.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("failed to resolve {host}: {reason}")]
    Resolution { host: String, reason: String },

    #[error("failed to launch `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("probe exited with {status}")]
    ExitStatus { status: ExitStatus },

    #[error("probe i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("probe failed: {0}")]
    Execution(String),

    /// Cooperative abort. Not a failure of the destination.
    #[error("probe canceled")]
    Canceled,
}

impl ProbeError {
    pub fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled)
    }

    pub fn is_resolution(&self) -> bool {
        matches!(self, Self::Resolution { .. })
    }
}

/// Why a result sink did not accept a payload.
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("result sink i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("result sink rejected payload: {0}")]
    Rejected(String),
}

/// Misuse of the scheduler. These are the only fatal campaign errors.
#[derive(Error, Debug)]
pub enum CampaignError {
    #[error("a campaign is still in flight; cancel it and wait for quiescence first")]
    AlreadyRunning,

    #[error("invalid campaign configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("campaign lanes need a Tokio runtime")]
    NoRuntime,
}
