use crate::link::LinkEnd;
use crate::packet::GosPacket;

/// A packet travelling along a link.
#[derive(Debug, Clone)]
pub struct LinkBufferEntry<P> {
    sequence: u64,
    packet: P,
    total_delay: u64,
    remaining_delay: i64,
    end: LinkEnd,
}

impl<P: GosPacket> LinkBufferEntry<P> {
    pub fn new(sequence: u64, packet: P, delay: u64, end: LinkEnd) -> Self {
        Self {
            sequence,
            packet,
            total_delay: delay,
            remaining_delay: i64::try_from(delay).unwrap_or(i64::MAX),
            end,
        }
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn packet(&self) -> &P {
        &self.packet
    }

    pub fn into_packet(self) -> P {
        self.packet
    }

    pub fn end(&self) -> LinkEnd {
        self.end
    }

    /// Counts down `elapsed` and reports whether the entry has arrived.
    pub fn advance(&mut self, elapsed: u64) -> bool {
        let elapsed = i64::try_from(elapsed).unwrap_or(i64::MAX);
        self.remaining_delay = self.remaining_delay.saturating_sub(elapsed);
        self.remaining_delay <= 0
    }

    pub fn transit_percentage(&self) -> u8 {
        transit_percentage(self.total_delay, self.remaining_delay)
    }
}

/// How far along the link a packet is, 0..=100.
pub fn transit_percentage(total_delay: u64, remaining_delay: i64) -> u8 {
    if total_delay == 0 {
        return 100;
    }
    let total = total_delay as i128;
    let remaining = (remaining_delay as i128).clamp(0, total);
    (((total - remaining) * 100) / total) as u8
}
