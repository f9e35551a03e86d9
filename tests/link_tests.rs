// Integration tests for links driven by the simulation clock

use std::net::Ipv4Addr;
use std::sync::Arc;

use gos_sim::events::{EventKind, EventLog};
use gos_sim::link::{ExternalLink, InternalLink};
use gos_sim::monitor::TrafficMonitor;
use gos_sim::{
    ClockConfig, DeliveryTarget, DmgpConfig, FlowId, FlowMemoryManager, GosLevel, Link,
    LinkConfig, LinkEnd, MplsPacket, NodeId, PortId, SimulationClock,
};
use parking_lot::Mutex;

#[derive(Default)]
struct Inbox(Mutex<Vec<(u64, LinkEnd)>>);

impl DeliveryTarget<MplsPacket> for Inbox {
    fn deliver(&self, packet: MplsPacket, end: LinkEnd) {
        self.0.lock().push((packet.id, end));
    }
}

struct DmgpNode(FlowMemoryManager<MplsPacket>);

impl DeliveryTarget<MplsPacket> for DmgpNode {
    fn deliver(&self, packet: MplsPacket, _end: LinkEnd) {
        self.0.admit(packet);
    }
}

fn config(name: &str, delay: i64) -> LinkConfig {
    LinkConfig {
        name: name.to_string(),
        delay,
        head_end_node: Some(NodeId(1)),
        tail_end_node: Some(NodeId(2)),
        head_end_port: Some(PortId(0)),
        tail_end_port: Some(PortId(0)),
    }
}

fn packet(id: u64) -> MplsPacket {
    MplsPacket::new(id, Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 2), 80)
        .with_gos(GosLevel::Level3WithBackupLsp, id as u32)
}

fn clock(duration: u64, parallel_dispatch: bool) -> SimulationClock {
    SimulationClock::new(ClockConfig {
        step: 1,
        duration,
        parallel_dispatch,
    })
}

#[test]
fn test_clock_delivers_on_exact_tick() {
    let inbox = Arc::new(Inbox::default());
    let link = Arc::new(
        Link::<MplsPacket, _>::new(1, config("a-b", 5), InternalLink::new(), inbox.clone())
            .unwrap(),
    );
    let mut clock = clock(100, false);
    clock.add_listener(link.clone());

    link.send_from(packet(1), NodeId(2));
    for _ in 0..4 {
        assert!(clock.tick());
    }
    assert!(inbox.0.lock().is_empty());
    clock.tick();
    assert_eq!(*inbox.0.lock(), vec![(1, LinkEnd::Head)]);
}

#[test]
fn test_failure_loses_in_flight_packets() {
    let inbox = Arc::new(Inbox::default());
    let log = Arc::new(EventLog::new());
    let link = Arc::new(
        Link::<MplsPacket, _>::new(1, config("a-b", 5), InternalLink::new(), inbox.clone())
            .unwrap()
            .with_event_sink(log.clone()),
    );
    let mut clock = clock(100, false);
    clock.add_listener(link.clone());

    link.send(packet(1), LinkEnd::Tail);
    link.send(packet(2), LinkEnd::Tail);
    clock.tick();
    clock.tick();
    link.set_broken(true);
    // a packet sent while broken is lost too
    link.send(packet(3), LinkEnd::Tail);
    for _ in 0..10 {
        clock.tick();
    }
    assert!(inbox.0.lock().is_empty());

    link.set_broken(false);
    link.send(packet(4), LinkEnd::Tail);
    for _ in 0..5 {
        clock.tick();
    }
    assert_eq!(*inbox.0.lock(), vec![(4, LinkEnd::Tail)]);

    let discarded = log
        .events()
        .into_iter()
        .filter(|e| matches!(e.kind, EventKind::PacketDiscarded { .. }))
        .count();
    assert_eq!(discarded, 3);
}

#[test]
fn test_parallel_dispatch_reaches_all_links() {
    let inbox = Arc::new(Inbox::default());
    let monitor = Arc::new(TrafficMonitor::new("test"));
    let mut clock = clock(50, true);

    let mut links = Vec::new();
    for id in 0..4u64 {
        let link = Arc::new(
            Link::<MplsPacket, _>::new(
                id,
                config(&format!("link-{id}"), id as i64 + 1),
                ExternalLink,
                inbox.clone(),
            )
            .unwrap()
            .with_event_sink(monitor.clone()),
        );
        clock.add_listener(link.clone());
        links.push(link);
    }
    for (i, link) in links.iter().enumerate() {
        for n in 0..10 {
            link.send(packet((i * 100 + n) as u64), LinkEnd::Tail);
        }
    }
    clock.run();

    assert_eq!(inbox.0.lock().len(), 40);
    let rows = monitor.report();
    assert_eq!(rows.len(), 4);
    for row in rows {
        assert_eq!(row.sent, 10);
        assert_eq!(row.delivered, 10);
        assert_eq!(row.backlog_pkts, 0);
    }
}

#[test]
fn test_delivered_gos_packets_reach_the_dmgp() {
    let node = Arc::new(DmgpNode(FlowMemoryManager::new(DmgpConfig { size_kb: 1 })));
    let link = Arc::new(
        Link::<MplsPacket, _>::new(1, config("a-b", 3), InternalLink::new(), node.clone())
            .unwrap(),
    );
    let mut clock = clock(10, false);
    clock.add_listener(link.clone());

    link.send_from(packet(1), NodeId(1));
    link.send_from(packet(2), NodeId(1));
    clock.run();

    // 122 bytes of share hold a single 80 byte packet
    let flow = FlowId::from(Ipv4Addr::new(10, 0, 0, 1));
    assert!(node.0.lookup(flow, 1).is_none());
    assert!(node.0.lookup(flow, 2).is_some());

    link.reset();
    node.0.reset();
    assert!(link.in_flight().is_empty());
    assert!(node.0.lookup(flow, 2).is_none());
}

#[test]
fn test_reset_clears_monitor_backlog() {
    let inbox = Arc::new(Inbox::default());
    let monitor = Arc::new(TrafficMonitor::new("test"));
    let link = Link::<MplsPacket, _>::new(3, config("c-d", 5), InternalLink::new(), inbox.clone())
        .unwrap()
        .with_event_sink(monitor.clone());

    link.send(packet(1), LinkEnd::Tail);
    link.send(packet(2), LinkEnd::Head);
    link.tick(1);
    link.reset();

    assert!(link.in_flight().is_empty());
    let rows = monitor.report();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].sent, 2);
    assert_eq!(rows[0].delivered, 0);
    assert_eq!(rows[0].discarded, 2);
    assert_eq!(rows[0].backlog_pkts, 0);
    assert_eq!(rows[0].backlog_bytes, 0);

    // nothing left over once the delay would have run out
    for _ in 0..5 {
        link.tick(1);
    }
    assert!(inbox.0.lock().is_empty());
    assert_eq!(monitor.report()[0].backlog_pkts, 0);
}
