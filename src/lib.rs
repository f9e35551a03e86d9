//! Discrete-event core of an MPLS network simulator with Guarantee-of-Service
//! support: the DMGP flow memory kept at nodes and the delay model of links.

pub mod config;
pub mod dmgp;
pub mod error;
pub mod events;
pub mod flow_id;
pub mod gos;
pub mod id_generator;
pub mod link;
pub mod monitor;
pub mod packet;
pub mod timer;

pub use config::{ClockConfig, DmgpConfig, LinkConfig};
pub use dmgp::{FlowMemoryManager, FlowSnapshot};
pub use error::{Error, LinkConfigError};
pub use flow_id::FlowId;
pub use gos::GosLevel;
pub use link::{DeliveryTarget, Link, LinkEnd, LinkTransitEngine, NodeId, PortId};
pub use packet::{GosPacket, MplsPacket};
pub use timer::{SimulationClock, TimerEvent, TimerEventListener, Timestamp};
