//! # tracr Core
//!
//! The campaign engine: probing a list of destinations concurrently,
//! retrying failures round-robin, and publishing every route that was traced.
//!
//! * **[`campaign`]**: The scheduler, its task ledger and retry policy.
//! * **[`probe`]**: The probe executor abstraction and the traceroute-process
//!   implementation.
//! * **[`publisher`]**: Payload delivery to result sinks.
//! * **[`progress`]**: Time-left estimation.
//! * **[`signal`]**: Cancellation latch and quiescence gate.
//! * **[`error`]**: Error taxonomy.

pub mod campaign;
pub mod error;
pub mod probe;
pub mod progress;
pub mod publisher;
pub mod signal;

pub use campaign::{CampaignCounts, CampaignObserver, CampaignScheduler, CampaignSummary};
pub use error::{CampaignError, ProbeError, PublishError};
