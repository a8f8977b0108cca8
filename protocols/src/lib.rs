//! Wire-level formats spoken at the edges of a campaign.
//!
//! * **[`traceroute`]**: Turning the line-oriented output of a traceroute
//!   utility into a [`HopList`](tracr_common::network::hop::HopList).
//! * **[`payload`]**: The JSON document handed to a result sink.

pub mod payload;
pub mod traceroute;
