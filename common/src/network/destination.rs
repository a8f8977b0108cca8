//! # Destination Model
//!
//! A destination is whatever the user (or the destination source) asked us to
//! trace: a hostname or a literal address. The network address is resolved
//! lazily by the probe executor and cached here once known.
//!
//! This module also parses destination lists, which can be:
//! * One entry per line (e.g., a downloaded site list).
//! * A comma-separated list (e.g., `"example.org, 10.0.0.1"`).
//! * Any mix of the two, with `#` comments and blank entries.

use std::collections::HashSet;
use std::fmt;
use std::net::IpAddr;

use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    host: String,
    address: Option<IpAddr>,
}

impl Destination {
    /// Creates an unresolved destination.
    ///
    /// Literal addresses are recognized immediately so they never go through
    /// a resolver.
    pub fn new(host: impl Into<String>) -> Self {
        let host: String = host.into();
        let address: Option<IpAddr> = host.parse::<IpAddr>().ok();
        Self { host, address }
    }

    /// The identifier exactly as it was supplied.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn address(&self) -> Option<IpAddr> {
        self.address
    }

    pub fn is_resolved(&self) -> bool {
        self.address.is_some()
    }

    /// Caches the resolved address. The identifier never changes.
    pub fn set_address(&mut self, address: IpAddr) {
        self.address = Some(address);
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.address {
            Some(addr) if addr.to_string() != self.host => write!(f, "{} ({addr})", self.host),
            _ => f.write_str(&self.host),
        }
    }
}

/// Parses a destination list into identifiers, keeping the first occurrence
/// of every entry and the original order.
pub fn parse_list(s: &str) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut hosts: Vec<String> = Vec::new();

    for line in s.lines() {
        let line: &str = strip_comment(line);
        for part in line.split(',') {
            let part: &str = part.trim();
            if part.is_empty() {
                continue;
            }
            if seen.insert(part.to_string()) {
                hosts.push(part.to_string());
            } else {
                debug!("Skipping duplicate destination {part}");
            }
        }
    }

    hosts
}

fn strip_comment(line: &str) -> &str {
    match line.split_once('#') {
        Some((content, _comment)) => content,
        None => line,
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
