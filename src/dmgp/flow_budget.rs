use std::collections::BTreeMap;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::dmgp::packet_entry::PacketEntry;
use crate::flow_id::FlowId;
use crate::id_generator::RotaryIdGenerator;
use crate::packet::GosPacket;

/// Result of handing a packet to a [`FlowBudget`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    /// Stored after evicting `evicted` older packets.
    Stored { evicted: usize },
    /// The packet alone is bigger than the whole budget; nothing was touched.
    TooLarge,
}

struct FlowBuffer<P> {
    used_bytes: usize,
    // keyed by insertion sequence, so iteration is oldest first
    entries: BTreeMap<u64, PacketEntry<P>>,
    sequence: RotaryIdGenerator,
}

/// One flow's fixed share of the DMGP.
///
/// The quota is fixed at creation. The buffer behind it has its own lock so
/// unrelated flows never contend once the manager has resolved them.
pub struct FlowBudget<P> {
    flow_id: FlowId,
    arrival_order: u64,
    assigned_percentage: usize,
    assigned_bytes: usize,
    buffer: Mutex<FlowBuffer<P>>,
}

/// Point-in-time view of a flow, for inspection and reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowSnapshot {
    pub flow_id: FlowId,
    pub arrival_order: u64,
    pub assigned_percentage: usize,
    pub assigned_bytes: usize,
    pub used_bytes: usize,
    /// GoS ids of the buffered packets, oldest first.
    pub gos_ids: Vec<u32>,
}

impl<P: GosPacket> FlowBudget<P> {
    pub fn new(
        flow_id: FlowId,
        arrival_order: u64,
        assigned_percentage: usize,
        assigned_bytes: usize,
    ) -> Self {
        Self {
            flow_id,
            arrival_order,
            assigned_percentage,
            assigned_bytes,
            buffer: Mutex::new(FlowBuffer {
                used_bytes: 0,
                entries: BTreeMap::new(),
                sequence: RotaryIdGenerator::new(),
            }),
        }
    }

    pub fn flow_id(&self) -> FlowId {
        self.flow_id
    }

    pub fn arrival_order(&self) -> u64 {
        self.arrival_order
    }

    pub fn assigned_percentage(&self) -> usize {
        self.assigned_percentage
    }

    pub fn assigned_bytes(&self) -> usize {
        self.assigned_bytes
    }

    pub fn used_bytes(&self) -> usize {
        self.buffer.lock().used_bytes
    }

    pub fn len(&self) -> usize {
        self.buffer.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stores `packet`, evicting the oldest packets of this flow if needed.
    pub fn store(&self, packet: P) -> StoreOutcome {
        let size = packet.size();
        if size > self.assigned_bytes {
            debug!(
                flow = %self.flow_id,
                size,
                assigned = self.assigned_bytes,
                "packet larger than flow budget, dropped"
            );
            return StoreOutcome::TooLarge;
        }

        let mut buffer = self.buffer.lock();
        let free = self.assigned_bytes - buffer.used_bytes;
        let evicted = if free >= size {
            0
        } else {
            buffer.release(size - free)
        };
        if evicted > 0 {
            trace!(flow = %self.flow_id, evicted, "evicted oldest packets");
        }

        let sequence = buffer.sequence.next_id();
        buffer.used_bytes += size;
        buffer.entries.insert(sequence, PacketEntry::new(sequence, packet));
        debug_assert!(buffer.used_bytes <= self.assigned_bytes);
        StoreOutcome::Stored { evicted }
    }

    /// Finds a buffered packet by its GoS id. No side effects.
    pub fn find(&self, gos_id: u32) -> Option<P> {
        let buffer = self.buffer.lock();
        buffer
            .entries
            .values()
            .find(|entry| entry.gos_id() == gos_id)
            .map(|entry| entry.packet().clone())
    }

    pub fn snapshot(&self) -> FlowSnapshot {
        let buffer = self.buffer.lock();
        FlowSnapshot {
            flow_id: self.flow_id,
            arrival_order: self.arrival_order,
            assigned_percentage: self.assigned_percentage,
            assigned_bytes: self.assigned_bytes,
            used_bytes: buffer.used_bytes,
            gos_ids: buffer.entries.values().map(PacketEntry::gos_id).collect(),
        }
    }
}

impl<P: GosPacket> FlowBuffer<P> {
    /// Evicts oldest-first until at least `needed` bytes are freed or the buffer is
    /// empty. Returns the number of evicted packets.
    fn release(&mut self, needed: usize) -> usize {
        let mut released = 0;
        let mut evicted = 0;
        while released < needed {
            let Some((_, entry)) = self.entries.pop_first() else {
                break;
            };
            trace!(
                sequence = entry.sequence(),
                gos_id = entry.gos_id(),
                size = entry.size(),
                "evicted"
            );
            released += entry.size();
            evicted += 1;
        }
        self.used_bytes = self.used_bytes.saturating_sub(released);
        evicted
    }
}
