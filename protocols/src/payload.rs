//! # Publish Payload
//!
//! The document a result sink receives for one completed probe. Field names
//! follow the collection server's camelCase schema; `asn` and `rtt` are
//! extension fields the client always sends empty.

use serde::{Deserialize, Serialize};
use tracr_common::network::{destination::Destination, hop::Hop};

/// Placeholder sent for hops that never replied.
pub const UNREACHABLE: &str = "destination unreachable";
/// Placeholder sent when the public source address is unknown.
pub const UNKNOWN_SOURCE: &str = "none";

/// Who ran the measurement.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceIdentity {
    /// Local hostname.
    pub name: String,
    /// Public address as seen by the collection server, if known.
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceroutePayload {
    pub session_id: String,
    pub src_ip: String,
    pub dst_ip: String,
    pub src_name: String,
    pub dst_name: String,
    pub hops: Vec<HopRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HopRecord {
    pub id: String,
    pub ip: String,
    #[serde(default)]
    pub asn: Vec<String>,
    #[serde(default)]
    pub rtt: Vec<String>,
}

impl From<&Hop> for HopRecord {
    fn from(hop: &Hop) -> Self {
        Self {
            id: hop.ttl.to_string(),
            ip: hop
                .address
                .map(|addr| addr.to_string())
                .unwrap_or_else(|| UNREACHABLE.to_string()),
            asn: Vec::new(),
            rtt: Vec::new(),
        }
    }
}

impl TraceroutePayload {
    pub fn new(
        session_id: &str,
        source: &SourceIdentity,
        destination: &Destination,
        hops: &[Hop],
    ) -> Self {
        let dst_ip: String = destination
            .address()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| destination.host().to_string());

        Self {
            session_id: session_id.to_string(),
            src_ip: source
                .address
                .clone()
                .unwrap_or_else(|| UNKNOWN_SOURCE.to_string()),
            dst_ip,
            src_name: source.name.clone(),
            dst_name: destination.host().to_string(),
            hops: hops.iter().map(HopRecord::from).collect(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
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
