use std::collections::VecDeque;

use lazy_static::lazy_static;
use parking_lot::Mutex;

use crate::error::Error;
use crate::id_generator::LongIdGenerator;
use crate::link::LinkEnd;
use crate::timer::Timestamp;

lazy_static! {
    static ref EVENT_IDS: LongIdGenerator = LongIdGenerator::new();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    PacketSent { end: LinkEnd, size: usize },
    PacketOnFly { end: LinkEnd, size: usize, percentage: u8 },
    PacketDelivered { end: LinkEnd, size: usize },
    PacketDiscarded { end: LinkEnd, size: usize },
    LinkBroken,
    LinkRecovered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationEvent {
    pub id: u64,
    pub at: Timestamp,
    /// Link that raised the event.
    pub source: u64,
    pub kind: EventKind,
}

impl SimulationEvent {
    pub fn new(source: u64, at: Timestamp, kind: EventKind) -> Result<Self, Error> {
        Ok(Self {
            id: EVENT_IDS.next_id()?,
            at,
            source,
            kind,
        })
    }
}

pub trait EventSink: Send + Sync {
    fn record(&self, event: SimulationEvent);
}

/// Keeps the events it receives until reset.
///
/// A link with a sink attached raises one `PacketOnFly` per packet in flight on
/// every tick, so an unbounded log grows with both run length and traffic. Use
/// [`EventLog::bounded`] for long runs; it keeps only the most recent events.
#[derive(Default)]
pub struct EventLog {
    events: Mutex<VecDeque<SimulationEvent>>,
    limit: Option<usize>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps at most `limit` events, dropping the oldest first.
    pub fn bounded(limit: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(limit)),
            limit: Some(limit),
        }
    }

    pub fn events(&self) -> Vec<SimulationEvent> {
        self.events.lock().iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn reset(&self) {
        self.events.lock().clear();
    }
}

impl EventSink for EventLog {
    fn record(&self, event: SimulationEvent) {
        let mut events = self.events.lock();
        if let Some(limit) = self.limit {
            if limit == 0 {
                return;
            }
            while events.len() >= limit {
                events.pop_front();
            }
        }
        events.push_back(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_ids_increase() {
        let a = SimulationEvent::new(1, Timestamp::ZERO, EventKind::LinkBroken).unwrap();
        let b = SimulationEvent::new(1, Timestamp::ZERO, EventKind::LinkRecovered).unwrap();
        assert!(b.id > a.id);
    }

    #[test]
    fn test_log_keeps_events_until_reset() {
        let log = EventLog::new();
        for kind in [EventKind::LinkBroken, EventKind::LinkRecovered] {
            log.record(SimulationEvent::new(7, Timestamp::new(3, 0), kind).unwrap());
        }
        let kinds: Vec<_> = log.events().into_iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EventKind::LinkBroken, EventKind::LinkRecovered]);

        log.reset();
        assert!(log.is_empty());
    }

    #[test]
    fn test_bounded_log_keeps_latest() {
        let log = EventLog::bounded(2);
        for kind in [EventKind::LinkBroken, EventKind::LinkRecovered, EventKind::LinkBroken] {
            log.record(SimulationEvent::new(7, Timestamp::ZERO, kind).unwrap());
        }
        let kinds: Vec<_> = log.events().into_iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EventKind::LinkRecovered, EventKind::LinkBroken]);

        let none = EventLog::bounded(0);
        none.record(SimulationEvent::new(7, Timestamp::ZERO, EventKind::LinkBroken).unwrap());
        assert!(none.is_empty());
    }
}
