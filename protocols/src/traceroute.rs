//! # Traceroute Output Parser
//!
//! Both `traceroute -n` and `tracert -d` print one line per TTL, starting with
//! the hop index and containing the replying address somewhere after it:
//!
//! ```text
//!  1  192.168.1.1  0.412 ms  0.380 ms  0.367 ms
//!  2  * * *
//!   3    <1 ms    <1 ms    <1 ms  10.20.0.1
//! ```
//!
//! Lines that do not start with a hop index (banners, "Trace complete.")
//! are ignored. A hop line without a usable address becomes a silent hop.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;
use tracr_common::network::hop::{Hop, HopList};

static HOP_INDEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d{1,3})(?:\s|$)").expect("hop index pattern is valid")
});

static DOTTED_QUAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}").expect("dotted quad pattern is valid")
});

/// Parses every hop line of a traceroute run, in output order.
pub fn parse_output<S: AsRef<str>>(lines: &[S]) -> HopList {
    lines
        .iter()
        .filter_map(|line| parse_line(line.as_ref()))
        .collect()
}

/// Parses a single output line, or `None` when it is not a hop line.
pub fn parse_line(line: &str) -> Option<Hop> {
    let captures = HOP_INDEX.captures(line)?;
    let index: &str = captures.get(1)?.as_str();

    let ttl: u8 = match index.parse::<u8>() {
        Ok(ttl) => ttl,
        Err(e) => {
            trace!("Skipping line with hop index {index}: {e}");
            return None;
        }
    };

    Some(Hop {
        ttl,
        address: find_address(line).map(IpAddr::V4),
    })
}

fn find_address(line: &str) -> Option<Ipv4Addr> {
    DOTTED_QUAD
        .find_iter(line)
        .find_map(|candidate| candidate.as_str().parse::<Ipv4Addr>().ok())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
