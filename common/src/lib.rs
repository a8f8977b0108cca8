//! Shared models and configuration for the `tracr` workspace.
//!
//! * **[`config`]**: Campaign tuning knobs and their validation.
//! * **[`network`]**: Destinations, hops and destination-list parsing.

pub mod config;
pub mod network;
