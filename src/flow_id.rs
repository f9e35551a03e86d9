use std::fmt;
use std::net::Ipv4Addr;

/// Identifies a GoS flow. Derived from the IPv4 origin address, so every packet from
/// one origin shares a flow and a DMGP quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FlowId(pub u32);

impl From<Ipv4Addr> for FlowId {
    fn from(origin: Ipv4Addr) -> Self {
        FlowId(origin.to_bits())
    }
}

impl FlowId {
    /// Reads the origin address straight from a raw IPv4 header.
    ///
    /// Returns `None` for anything that is not a complete IPv4 header.
    pub fn from_ipv4_header(header: &[u8]) -> Option<Self> {
        if header.len() < 20 {
            return None;
        }
        // version lives in the high nibble of the first byte
        if (header[0] >> 4) != 4 {
            return None;
        }
        // IHL counts 32-bit words
        let ihl = (header[0] & 0x0F) as usize * 4;
        if ihl < 20 || header.len() < ihl {
            return None;
        }
        let origin = Ipv4Addr::from_bits(u32::from_be_bytes([
            header[12], header[13], header[14], header[15],
        ]));
        Some(origin.into())
    }

    pub fn origin(&self) -> Ipv4Addr {
        Ipv4Addr::from_bits(self.0)
    }
}

impl fmt::Display for FlowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "flow({})", self.origin())
    }
}
