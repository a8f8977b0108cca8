//! The **probe executor** abstraction.
//!
//! A probe is one traceroute toward one destination. The scheduler only
//! depends on the [`ProbeExecutor`] trait; [`CommandProbe`] is the shipped
//! implementation that drives the operating system's traceroute utility.

use async_trait::async_trait;
use tracr_common::network::{destination::Destination, hop::HopList};

use crate::error::ProbeError;
use crate::signal::CancellationSignal;

mod command;
pub mod resolver;

pub use command::CommandProbe;

/// Runs a single probe to completion or cancellation.
#[async_trait]
pub trait ProbeExecutor: Send + Sync {
    /// Traces the route to `destination`.
    ///
    /// Implementations resolve the destination on first use and cache the
    /// address on it. They must watch `signal` while the probe is in flight
    /// and return [`ProbeError::Canceled`] promptly once it is set, never a
    /// partial hop list.
    async fn execute(
        &self,
        destination: &mut Destination,
        signal: &CancellationSignal,
    ) -> Result<HopList, ProbeError>;
}
