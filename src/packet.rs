use std::net::Ipv4Addr;

use crate::flow_id::FlowId;
use crate::gos::GosLevel;

/// What the simulation core needs to know about a packet.
///
/// Everything else about the protocol stack is out of scope here.
pub trait GosPacket: Clone + Send + Sync + 'static {
    /// Size on the wire, in bytes.
    fn size(&self) -> usize;

    fn origin(&self) -> Ipv4Addr;

    /// GoS level from the IPv4 options field, if the field is in use.
    fn gos_level(&self) -> Option<GosLevel>;

    /// Identifier of the packet within its flow, used by retransmission requests.
    fn gos_id(&self) -> u32;

    fn flow_id(&self) -> FlowId {
        FlowId::from(self.origin())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MplsPacket {
    pub id: u64,
    pub origin: Ipv4Addr,
    pub destination: Ipv4Addr,
    pub size: usize,
    pub gos_level: Option<GosLevel>,
    pub gos_id: u32,
}

impl MplsPacket {
    pub fn new(id: u64, origin: Ipv4Addr, destination: Ipv4Addr, size: usize) -> Self {
        Self {
            id,
            origin,
            destination,
            size,
            gos_level: None,
            gos_id: 0,
        }
    }

    pub fn with_gos(mut self, level: GosLevel, gos_id: u32) -> Self {
        self.gos_level = Some(level);
        self.gos_id = gos_id;
        self
    }
}

impl GosPacket for MplsPacket {
    fn size(&self) -> usize {
        self.size
    }

    fn origin(&self) -> Ipv4Addr {
        self.origin
    }

    fn gos_level(&self) -> Option<GosLevel> {
        self.gos_level
    }

    fn gos_id(&self) -> u32 {
        self.gos_id
    }
}
