//! DMGP: the per-node memory that keeps GoS packets around for retransmission.
//!
//! The memory is split among flows by GoS priority. Each flow gets a fixed share the
//! first time one of its packets shows up, as long as unassigned capacity remains;
//! afterwards the flow recycles its own share oldest-packet-first. Nothing here ever
//! fails loudly: a packet that does not fit is just not kept, and the caller finds
//! out through a [`FlowMemoryManager::lookup`] that comes back empty.
//!
//! Locking is two-level. The manager lock covers the flow index and the global
//! counters and is only held while a flow is resolved or created. Buffer mutation
//! happens afterwards under the flow's own lock. The two are never held together.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::config::DmgpConfig;
use crate::flow_id::FlowId;
use crate::gos;
use crate::id_generator::RotaryIdGenerator;
use crate::packet::GosPacket;

mod flow_budget;
mod packet_entry;

pub use flow_budget::{FlowBudget, FlowSnapshot, StoreOutcome};
pub use packet_entry::PacketEntry;

const BYTES_PER_KILOBYTE: usize = 1024;
const FULL_PERCENTAGE: usize = 100;

struct ManagerState<P> {
    size_kb: usize,
    available_percentage: usize,
    assigned_bytes: usize,
    flows: HashMap<FlowId, Arc<FlowBudget<P>>>,
    arrivals: RotaryIdGenerator,
}

impl<P: GosPacket> ManagerState<P> {
    fn new(size_kb: usize) -> Self {
        Self {
            size_kb,
            available_percentage: FULL_PERCENTAGE,
            assigned_bytes: 0,
            flows: HashMap::new(),
            arrivals: RotaryIdGenerator::new(),
        }
    }

    fn capacity_bytes(&self) -> usize {
        self.size_kb.saturating_mul(BYTES_PER_KILOBYTE)
    }

    fn reset(&mut self) {
        *self = Self::new(self.size_kb);
    }

    /// Carves a share out of the unassigned capacity for a new flow.
    ///
    /// The share is the smaller of the requested and the still available percentage,
    /// converted to bytes rounding down and capped by the unassigned bytes. A zero
    /// byte share means no flow.
    fn create_flow(&mut self, flow_id: FlowId, packet: &P) -> Option<Arc<FlowBudget<P>>> {
        let capacity = self.capacity_bytes();
        if self.assigned_bytes >= capacity {
            return None;
        }
        let requested = gos::requested_percentage(packet.gos_level());
        let percentage = requested.min(self.available_percentage);
        let free = capacity - self.assigned_bytes;
        let bytes = share_of(capacity, percentage).min(free);
        if bytes == 0 {
            return None;
        }

        self.assigned_bytes += bytes;
        self.available_percentage -= percentage;
        let flow = Arc::new(FlowBudget::new(
            flow_id,
            self.arrivals.next_id(),
            percentage,
            bytes,
        ));
        self.flows.insert(flow_id, flow.clone());
        debug!(
            flow = %flow_id,
            requested,
            percentage,
            bytes,
            available = self.available_percentage,
            "flow created"
        );
        Some(flow)
    }
}

/// `capacity * percentage / 100` rounded down, without overflowing for any
/// `percentage <= 100`.
fn share_of(capacity: usize, percentage: usize) -> usize {
    let whole = capacity / FULL_PERCENTAGE * percentage;
    let rest = capacity % FULL_PERCENTAGE * percentage / FULL_PERCENTAGE;
    whole + rest
}

pub struct FlowMemoryManager<P> {
    state: Mutex<ManagerState<P>>,
}

impl<P: GosPacket> Default for FlowMemoryManager<P> {
    fn default() -> Self {
        Self::new(DmgpConfig::default())
    }
}

impl<P: GosPacket> FlowMemoryManager<P> {
    pub fn new(config: DmgpConfig) -> Self {
        Self {
            state: Mutex::new(ManagerState::new(config.size_kb)),
        }
    }

    /// Sets the capacity and drops every flow.
    pub fn configure(&self, size_kb: usize) {
        let mut state = self.state.lock();
        state.size_kb = size_kb;
        state.reset();
    }

    /// Drops every flow and buffered packet. Capacity is kept.
    pub fn reset(&self) {
        self.state.lock().reset();
    }

    pub fn size_kb(&self) -> usize {
        self.state.lock().size_kb
    }

    pub fn capacity_bytes(&self) -> usize {
        self.state.lock().capacity_bytes()
    }

    pub fn available_percentage(&self) -> usize {
        self.state.lock().available_percentage
    }

    pub fn assigned_bytes(&self) -> usize {
        self.state.lock().assigned_bytes
    }

    pub fn flow_count(&self) -> usize {
        self.state.lock().flows.len()
    }

    /// Returns the buffered packet with `gos_id` in flow `flow_id`, if it is still kept.
    pub fn lookup(&self, flow_id: FlowId, gos_id: u32) -> Option<P> {
        let flow = self.state.lock().flows.get(&flow_id).cloned()?;
        flow.find(gos_id)
    }

    /// Keeps a copy of `packet` if its flow has, or can still get, a share of the DMGP.
    pub fn admit(&self, packet: P) {
        let flow_id = packet.flow_id();
        let flow = {
            let mut state = self.state.lock();
            state
                .flows
                .get(&flow_id)
                .cloned()
                .or_else(|| state.create_flow(flow_id, &packet))
        };

        match flow {
            Some(flow) => {
                flow.store(packet);
            }
            None => {
                debug!(
                    flow = %flow_id,
                    gos_id = packet.gos_id(),
                    "no DMGP share for flow, packet dropped"
                );
            }
        }
    }

    /// Snapshots of every flow, in arrival order.
    pub fn flows(&self) -> Vec<FlowSnapshot> {
        let flows: Vec<_> = self.state.lock().flows.values().cloned().collect();
        let mut snapshots: Vec<_> = flows.iter().map(|flow| flow.snapshot()).collect();
        snapshots.sort_by_key(|s| s.arrival_order);
        snapshots
    }

    pub fn flow(&self, flow_id: FlowId) -> Option<FlowSnapshot> {
        let flow = self.state.lock().flows.get(&flow_id).cloned()?;
        Some(flow.snapshot())
    }
}
