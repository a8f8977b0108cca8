//! # Result Publication
//!
//! A completed probe is turned into a [`TraceroutePayload`] and handed to a
//! [`ResultSink`]. Sinks may fail independently of the measurement, so the
//! [`ResultPublisher`] retries each submission inline a bounded number of
//! times before reporting the failure to the scheduler.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};
use tracr_common::network::{destination::Destination, hop::Hop};
use tracr_protocols::payload::{SourceIdentity, TraceroutePayload};

use crate::error::PublishError;

mod file;
mod memory;

pub use file::JsonFileSink;
pub use memory::MemorySink;

/// Durably records or uploads one payload.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn submit(&self, payload: &TraceroutePayload) -> Result<(), PublishError>;
}

pub struct ResultPublisher {
    sink: Arc<dyn ResultSink>,
    session_id: String,
    source: SourceIdentity,
    attempts: u32,
}

impl ResultPublisher {
    pub fn new(
        sink: Arc<dyn ResultSink>,
        session_id: impl Into<String>,
        source: SourceIdentity,
        attempts: u32,
    ) -> Self {
        Self {
            sink,
            session_id: session_id.into(),
            source,
            attempts: attempts.max(1),
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Publishes one probe result, retrying the sink up to `attempts` times.
    pub async fn publish(&self, destination: &Destination, hops: &[Hop]) -> Result<(), PublishError> {
        let payload: TraceroutePayload =
            TraceroutePayload::new(&self.session_id, &self.source, destination, hops);

        let mut attempt: u32 = 1;
        loop {
            match self.sink.submit(&payload).await {
                Ok(()) => {
                    debug!("Published {} hops for {destination}", hops.len());
                    return Ok(());
                }
                Err(e) if attempt < self.attempts => {
                    warn!("Publishing {destination} failed (attempt {attempt}/{}): {e}", self.attempts);
                    attempt += 1;
                }
                Err(e) => return Err(e),
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
