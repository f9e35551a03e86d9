use crate::packet::GosPacket;

/// A packet held in a flow's DMGP buffer.
#[derive(Debug, Clone)]
pub struct PacketEntry<P> {
    sequence: u64,
    size: usize,
    packet: P,
}

impl<P: GosPacket> PacketEntry<P> {
    pub fn new(sequence: u64, packet: P) -> Self {
        Self {
            sequence,
            size: packet.size(),
            packet,
        }
    }

    /// Insertion sequence; lower means older.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn gos_id(&self) -> u32 {
        self.packet.gos_id()
    }

    pub fn packet(&self) -> &P {
        &self.packet
    }
}
