use std::net::IpAddr;

/// One line of a traceroute: the TTL that was probed and who answered.
///
/// Silent hops (no reply before the timeout) are kept with `address = None`
/// so the hop list stays contiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hop {
    pub ttl: u8,
    pub address: Option<IpAddr>,
}

pub type HopList = Vec<Hop>;

impl Hop {
    pub fn reply(ttl: u8, address: IpAddr) -> Self {
        Self { ttl, address: Some(address) }
    }

    pub fn silent(ttl: u8) -> Self {
        Self { ttl, address: None }
    }

    pub fn is_silent(&self) -> bool {
        self.address.is_none()
    }
}
