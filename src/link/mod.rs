//! Links between nodes.
//!
//! A [`Link`] couples the variant-specific behavior ([`LinkVariant`]) with the
//! shared [`LinkTransitEngine`] and hands expired packets to a [`DeliveryTarget`].
//! Links listen to the simulation clock and advance their in-flight packets by the
//! length of every step.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::LinkConfig;
use crate::error::{Error, LinkConfigError};
use crate::events::{EventKind, EventSink, SimulationEvent};
use crate::packet::GosPacket;
use crate::timer::{TimerEvent, TimerEventListener, Timestamp};

mod buffer_entry;
mod transit;

pub use buffer_entry::{LinkBufferEntry, transit_percentage};
pub use transit::{Expired, InFlight, LinkTransitEngine, normalize_delay};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PortId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkEnd {
    Head,
    Tail,
}

impl LinkEnd {
    pub fn opposite(self) -> Self {
        match self {
            LinkEnd::Head => LinkEnd::Tail,
            LinkEnd::Tail => LinkEnd::Head,
        }
    }
}

impl fmt::Display for LinkEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkEnd::Head => f.write_str("head"),
            LinkEnd::Tail => f.write_str("tail"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    /// Between two nodes of the MPLS domain.
    Internal,
    /// Between the domain and the outside world.
    External,
}

/// What differs between kinds of link. Routing weights are computed elsewhere; a
/// variant only reports the resulting number.
pub trait LinkVariant: Send + Sync {
    fn kind(&self) -> LinkKind;

    fn weight(&self, delay: u64) -> u64 {
        delay
    }

    fn raban_weight(&self, delay: u64) -> u64 {
        self.weight(delay)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InternalLink {
    raban_weight: Option<u64>,
}

impl InternalLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_raban_weight(raban_weight: u64) -> Self {
        Self {
            raban_weight: Some(raban_weight),
        }
    }
}

impl LinkVariant for InternalLink {
    fn kind(&self) -> LinkKind {
        LinkKind::Internal
    }

    fn raban_weight(&self, delay: u64) -> u64 {
        self.raban_weight.unwrap_or(delay)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExternalLink;

impl LinkVariant for ExternalLink {
    fn kind(&self) -> LinkKind {
        LinkKind::External
    }
}

/// Receives packets that reached the end of a link.
pub trait DeliveryTarget<P>: Send + Sync {
    fn deliver(&self, packet: P, end: LinkEnd);
}

pub struct Link<P, V> {
    id: u64,
    variant: V,
    config: Mutex<LinkConfig>,
    engine: LinkTransitEngine<P>,
    target: Arc<dyn DeliveryTarget<P>>,
    events: Option<Arc<dyn EventSink>>,
    now: Mutex<Timestamp>,
}

impl<P: GosPacket, V: LinkVariant> Link<P, V> {
    pub fn new(
        id: u64,
        config: LinkConfig,
        variant: V,
        target: Arc<dyn DeliveryTarget<P>>,
    ) -> Result<Self, Error> {
        config.validate(std::iter::empty())?;
        Ok(Self {
            id,
            variant,
            engine: LinkTransitEngine::new(config.delay),
            config: Mutex::new(config),
            target,
            events: None,
            now: Mutex::new(Timestamp::ZERO),
        })
    }

    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.events = Some(sink);
        self
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> String {
        self.config.lock().name.clone()
    }

    pub fn kind(&self) -> LinkKind {
        self.variant.kind()
    }

    pub fn delay(&self) -> u64 {
        self.engine.delay()
    }

    pub fn weight(&self) -> u64 {
        self.variant.weight(self.delay())
    }

    pub fn raban_weight(&self) -> u64 {
        self.variant.raban_weight(self.delay())
    }

    /// Current configuration, with the delay as actually applied.
    pub fn config(&self) -> LinkConfig {
        let mut config = self.config.lock().clone();
        config.delay = self.delay() as i64;
        config
    }

    /// Applies `config`. A reconfiguration only changes the name and the delay; the
    /// endpoints stay as they are.
    pub fn configure(&self, config: LinkConfig, is_reconfiguration: bool) -> Result<(), Error> {
        let mut current = self.config.lock();
        let next = if is_reconfiguration {
            LinkConfig {
                name: config.name,
                delay: config.delay,
                ..current.clone()
            }
        } else {
            config
        };
        next.validate(std::iter::empty())?;
        self.engine.set_delay(next.delay);
        *current = next;
        Ok(())
    }

    pub fn is_connected_to(&self, node: NodeId) -> bool {
        let config = self.config.lock();
        config.head_end_node == Some(node) || config.tail_end_node == Some(node)
    }

    /// Which end `node` sits at. Anything that is not the head is the tail.
    pub fn which_end_is(&self, node: NodeId) -> LinkEnd {
        if self.config.lock().head_end_node == Some(node) {
            LinkEnd::Head
        } else {
            LinkEnd::Tail
        }
    }

    pub fn destination_of_traffic_sent_by(&self, node: NodeId) -> LinkEnd {
        self.which_end_is(node).opposite()
    }

    pub fn port_at(&self, end: LinkEnd) -> Result<PortId, Error> {
        let config = self.config.lock();
        let port = match end {
            LinkEnd::Head => config
                .head_end_port
                .ok_or(LinkConfigError::HeadEndNodePortMissing)?,
            LinkEnd::Tail => config
                .tail_end_port
                .ok_or(LinkConfigError::TailEndNodePortMissing)?,
        };
        Ok(port)
    }

    pub fn is_broken(&self) -> bool {
        self.engine.is_broken()
    }

    /// Fault injection and repair. In-flight packets expiring while broken are lost.
    pub fn set_broken(&self, broken: bool) {
        let was_broken = self.engine.set_broken(broken);
        if was_broken == broken {
            return;
        }
        if broken {
            info!(link = self.id, in_flight = self.engine.len(), "link broken");
            self.emit(EventKind::LinkBroken);
        } else {
            info!(link = self.id, "link recovered");
            self.emit(EventKind::LinkRecovered);
        }
    }

    /// Puts `packet` on the link towards `end`.
    pub fn send(&self, packet: P, end: LinkEnd) {
        let size = packet.size();
        self.engine.send(packet, end);
        self.emit(EventKind::PacketSent { end, size });
    }

    /// Sends `packet` from `node` to whichever node sits at the other end.
    pub fn send_from(&self, packet: P, node: NodeId) {
        self.send(packet, self.destination_of_traffic_sent_by(node));
    }

    /// Advances in-flight packets by `elapsed` and hands over the ones that arrived.
    pub fn tick(&self, elapsed: u64) {
        for expired in self.engine.tick(elapsed) {
            let end = expired.entry.end();
            let size = expired.entry.packet().size();
            if expired.delivered {
                self.emit(EventKind::PacketDelivered { end, size });
                self.target.deliver(expired.entry.into_packet(), end);
            } else {
                debug!(link = self.id, %end, size, "link broken, packet discarded");
                self.emit(EventKind::PacketDiscarded { end, size });
            }
        }
        if self.events.is_some() {
            for packet in self.engine.in_flight() {
                self.emit(EventKind::PacketOnFly {
                    end: packet.end,
                    size: packet.size,
                    percentage: packet.percentage,
                });
            }
        }
    }

    pub fn in_flight(&self) -> Vec<InFlight> {
        self.engine.in_flight()
    }

    /// Empties the link and reconnects it. Configuration is kept.
    ///
    /// Packets still in flight are reported as discarded.
    pub fn reset(&self) {
        let drained = self.engine.reset();
        if !drained.is_empty() {
            debug!(link = self.id, discarded = drained.len(), "link reset");
        }
        for entry in drained {
            self.emit(EventKind::PacketDiscarded {
                end: entry.end(),
                size: entry.packet().size(),
            });
        }
        *self.now.lock() = Timestamp::ZERO;
    }

    fn emit(&self, kind: EventKind) {
        let Some(sink) = &self.events else {
            return;
        };
        let at = *self.now.lock();
        match SimulationEvent::new(self.id, at, kind) {
            Ok(event) => sink.record(event),
            Err(e) => warn!(link = self.id, error = %e, "simulation event dropped"),
        }
    }
}

impl<P: GosPacket, V: LinkVariant> TimerEventListener for Link<P, V> {
    fn on_timer_event(&self, event: &TimerEvent) {
        *self.now.lock() = event.upper_limit;
        self.tick(event.step);
    }
}
