use std::net::Ipv4Addr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use gos_sim::link::{ExternalLink, InternalLink};
use gos_sim::monitor::TrafficMonitor;
use gos_sim::timer::ProgressListener;
use gos_sim::{
    ClockConfig, DeliveryTarget, DmgpConfig, Error, FlowId, FlowMemoryManager, GosLevel, Link,
    LinkConfig, LinkEnd, MplsPacket, NodeId, PortId, SimulationClock,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DMGP_SIZE_KB: usize = 2;
const PRIMARY_DELAY: i64 = 5;
const BACKUP_DELAY: i64 = 9;
const PACKET_SIZE: usize = 96;

const STEP: u64 = 1;
const DURATION: u64 = 120;
const BREAK_AT: u64 = 40;
const REPAIR_AT: u64 = 70;

const SENDER: NodeId = NodeId(1);
const RECEIVER: NodeId = NodeId(2);

/// Receiving end of both links. Keeps GoS packets in its DMGP.
struct Node {
    name: &'static str,
    dmgp: FlowMemoryManager<MplsPacket>,
    received: AtomicU64,
}

impl DeliveryTarget<MplsPacket> for Node {
    fn deliver(&self, packet: MplsPacket, _end: LinkEnd) {
        self.received.fetch_add(1, Ordering::Relaxed);
        if packet.gos_level.is_some() {
            self.dmgp.admit(packet);
        }
    }
}

struct ProgressLog;

impl ProgressListener for ProgressLog {
    fn on_progress(&mut self, percentage: u8) {
        if percentage % 25 == 0 {
            info!(percentage, "simulation progress");
        }
    }
}

fn link_config(name: &str, delay: i64, port: u32) -> LinkConfig {
    LinkConfig {
        name: name.to_string(),
        delay,
        head_end_node: Some(SENDER),
        tail_end_node: Some(RECEIVER),
        head_end_port: Some(PortId(port)),
        tail_end_port: Some(PortId(port)),
    }
}

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let receiver = Arc::new(Node {
        name: "LSR-B",
        dmgp: FlowMemoryManager::new(DmgpConfig {
            size_kb: DMGP_SIZE_KB,
        }),
        received: AtomicU64::new(0),
    });
    let monitor = Arc::new(TrafficMonitor::new("core"));

    let primary = Arc::new(
        Link::<MplsPacket, _>::new(
            1,
            link_config("primary", PRIMARY_DELAY, 0),
            InternalLink::new(),
            receiver.clone(),
        )?
        .with_event_sink(monitor.clone()),
    );
    let backup = Arc::new(
        Link::<MplsPacket, _>::new(
            2,
            link_config("backup", BACKUP_DELAY, 1),
            ExternalLink,
            receiver.clone(),
        )?
        .with_event_sink(monitor.clone()),
    );

    let mut clock = SimulationClock::new(ClockConfig {
        step: STEP,
        duration: DURATION,
        parallel_dispatch: true,
    });
    clock.add_listener(primary.clone());
    clock.add_listener(backup.clone());
    clock.set_progress_listener(Box::new(ProgressLog))?;

    // one flow per origin, covering every GoS tier plus plain traffic
    let flows = [
        (Ipv4Addr::new(10, 0, 0, 1), Some(GosLevel::Level3WithBackupLsp)),
        (Ipv4Addr::new(10, 0, 0, 2), Some(GosLevel::Level2WithoutBackupLsp)),
        (Ipv4Addr::new(10, 0, 0, 3), Some(GosLevel::Level1WithBackupLsp)),
        (Ipv4Addr::new(10, 0, 0, 4), None),
    ];
    let destination = Ipv4Addr::new(10, 0, 1, 1);

    let mut next_id = 0u64;
    while !clock.is_finished() {
        let now = clock.now().total_nanoseconds();
        if now == BREAK_AT {
            primary.set_broken(true);
        } else if now == REPAIR_AT {
            primary.set_broken(false);
        }

        for (origin, level) in flows {
            next_id += 1;
            let mut packet = MplsPacket::new(next_id, origin, destination, PACKET_SIZE);
            if let Some(level) = level {
                packet = packet.with_gos(level, next_id as u32);
            }
            // GoS traffic takes the primary link, the rest the backup
            if level.is_some() {
                primary.send_from(packet, SENDER);
            } else {
                backup.send_from(packet, SENDER);
            }
        }
        clock.tick();
    }

    monitor.report();
    info!(
        node = receiver.name,
        received = receiver.received.load(Ordering::Relaxed),
        "delivery finished"
    );
    for flow in receiver.dmgp.flows() {
        info!(
            flow = %flow.flow_id,
            percentage = flow.assigned_percentage,
            assigned = flow.assigned_bytes,
            used = flow.used_bytes,
            kept = flow.gos_ids.len(),
            "DMGP flow"
        );
    }

    // a retransmission request for the very first GoS packet: long evicted by now
    let first = receiver.dmgp.lookup(FlowId::from(flows[0].0), 1);
    info!(found = first.is_some(), "retransmission lookup of packet 1");
    Ok(())
}
