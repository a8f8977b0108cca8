use std::net::{IpAddr, SocketAddr};

use tokio::net::lookup_host;
use tracing::debug;
use tracr_common::network::destination::Destination;

use crate::error::ProbeError;

/// Returns the destination's address, resolving and caching it on first use.
///
/// IPv4 answers are preferred because the hop parser only extracts IPv4
/// literals from probe output.
pub async fn resolve(destination: &mut Destination) -> Result<IpAddr, ProbeError> {
    if let Some(addr) = destination.address() {
        return Ok(addr);
    }

    let host: String = destination.host().to_string();
    let answers: Vec<SocketAddr> = lookup_host((host.as_str(), 0))
        .await
        .map_err(|e| ProbeError::Resolution {
            host: host.clone(),
            reason: e.to_string(),
        })?
        .collect();

    let addr: IpAddr = pick_address(&answers).ok_or_else(|| ProbeError::Resolution {
        host: host.clone(),
        reason: "no addresses returned".to_string(),
    })?;

    debug!("Resolved {host} to {addr}");
    destination.set_address(addr);
    Ok(addr)
}

fn pick_address(answers: &[SocketAddr]) -> Option<IpAddr> {
    answers
        .iter()
        .map(SocketAddr::ip)
        .find(IpAddr::is_ipv4)
        .or_else(|| answers.first().map(SocketAddr::ip))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
