use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::id_generator::RotaryIdGenerator;
use crate::link::LinkEnd;
use crate::link::buffer_entry::LinkBufferEntry;
use crate::packet::GosPacket;

/// An entry that left the link on the last tick.
#[derive(Debug, Clone)]
pub struct Expired<P> {
    pub entry: LinkBufferEntry<P>,
    /// `false` when the link was broken and the packet is lost.
    pub delivered: bool,
}

/// Presentation view of a packet in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InFlight {
    pub sequence: u64,
    pub end: LinkEnd,
    pub size: usize,
    pub percentage: u8,
}

struct TransitBuffer<P> {
    entries: BTreeMap<u64, LinkBufferEntry<P>>,
    sequence: RotaryIdGenerator,
}

/// Propagation delay model shared by every link variant.
///
/// Packets wait in an ordered buffer until their remaining delay runs out. The
/// buffer lock is only held while entries are added, counted down or removed.
pub struct LinkTransitEngine<P> {
    delay: AtomicU64,
    broken: AtomicBool,
    buffer: Mutex<TransitBuffer<P>>,
}

/// Delays of zero or less mean a single step.
pub fn normalize_delay(delay: i64) -> u64 {
    if delay <= 0 { 1 } else { delay as u64 }
}

impl<P: GosPacket> LinkTransitEngine<P> {
    pub fn new(delay: i64) -> Self {
        Self {
            delay: AtomicU64::new(normalize_delay(delay)),
            broken: AtomicBool::new(false),
            buffer: Mutex::new(TransitBuffer {
                entries: BTreeMap::new(),
                sequence: RotaryIdGenerator::new(),
            }),
        }
    }

    pub fn delay(&self) -> u64 {
        self.delay.load(Ordering::Relaxed)
    }

    /// Only affects packets sent afterwards.
    pub fn set_delay(&self, delay: i64) {
        self.delay.store(normalize_delay(delay), Ordering::Relaxed);
    }

    pub fn is_broken(&self) -> bool {
        self.broken.load(Ordering::Acquire)
    }

    /// Returns the previous state.
    pub fn set_broken(&self, broken: bool) -> bool {
        self.broken.swap(broken, Ordering::AcqRel)
    }

    pub fn len(&self) -> usize {
        self.buffer.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Puts `packet` on the link towards `end`. Returns its sequence number.
    pub fn send(&self, packet: P, end: LinkEnd) -> u64 {
        let delay = self.delay();
        let mut buffer = self.buffer.lock();
        let sequence = buffer.sequence.next_id();
        buffer
            .entries
            .insert(sequence, LinkBufferEntry::new(sequence, packet, delay, end));
        sequence
    }

    /// Counts every entry down by `elapsed` and removes the ones that arrived.
    ///
    /// Entries that arrive on the same tick come back in send order. Whether they are
    /// delivered or lost depends on the link state at the moment of expiry.
    pub fn tick(&self, elapsed: u64) -> Vec<Expired<P>> {
        let delivered = !self.is_broken();
        let mut buffer = self.buffer.lock();
        // keys are send sequences, so `arrived` is already in send order
        let arrived: Vec<u64> = buffer
            .entries
            .values_mut()
            .filter_map(|entry| entry.advance(elapsed).then_some(entry.sequence()))
            .collect();
        arrived
            .into_iter()
            .filter_map(|sequence| buffer.entries.remove(&sequence))
            .map(|entry| Expired { entry, delivered })
            .collect()
    }

    /// Empties the link and marks it as connected again. Returns what was in flight,
    /// in send order.
    pub fn reset(&self) -> Vec<LinkBufferEntry<P>> {
        let mut buffer = self.buffer.lock();
        let drained = std::mem::take(&mut buffer.entries).into_values().collect();
        buffer.sequence.reset();
        self.broken.store(false, Ordering::Release);
        drained
    }

    pub fn in_flight(&self) -> Vec<InFlight> {
        let buffer = self.buffer.lock();
        buffer
            .entries
            .values()
            .map(|entry| InFlight {
                sequence: entry.sequence(),
                end: entry.end(),
                size: entry.packet().size(),
                percentage: entry.transit_percentage(),
            })
            .collect()
    }
}
