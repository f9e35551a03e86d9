use std::collections::HashMap;

use chrono::Local;
use parking_lot::Mutex;
use tracing::info;

use crate::events::{EventKind, EventSink, SimulationEvent};

// Rate counters reset on every report; the backlog is the real amount in flight
// and is never reset.
#[derive(Debug, Default, Clone, Copy)]
struct LinkStats {
    sent: u64,
    delivered: u64,
    discarded: u64,

    backlog_pkts: i64,
    backlog_bytes: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkReport {
    pub link: u64,
    pub sent: u64,
    pub delivered: u64,
    pub discarded: u64,
    pub backlog_pkts: i64,
    pub backlog_bytes: i64,
}

/// Event sink that keeps per-link traffic counters.
pub struct TrafficMonitor {
    name: String,
    stats: Mutex<HashMap<u64, LinkStats>>,
}

impl TrafficMonitor {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            stats: Mutex::new(HashMap::new()),
        }
    }

    /// Logs one line per link plus a total, then clears the rate counters.
    pub fn report(&self) -> Vec<LinkReport> {
        let now_str = Local::now().format("%H:%M:%S").to_string();
        let mut stats = self.stats.lock();

        let mut links: Vec<_> = stats.keys().copied().collect();
        links.sort_unstable();

        let mut rows = Vec::with_capacity(links.len());
        for link in links {
            let Some(stat) = stats.get_mut(&link) else {
                continue;
            };
            let row = LinkReport {
                link,
                sent: stat.sent,
                delivered: stat.delivered,
                discarded: stat.discarded,
                backlog_pkts: stat.backlog_pkts,
                backlog_bytes: stat.backlog_bytes,
            };
            info!(
                monitor = %self.name,
                time = %now_str,
                link,
                sent = row.sent,
                delivered = row.delivered,
                discarded = row.discarded,
                backlog_pkts = row.backlog_pkts,
                backlog_kb = %format!("{:.1}", row.backlog_bytes as f64 / 1024.0),
                "link traffic"
            );
            stat.sent = 0;
            stat.delivered = 0;
            stat.discarded = 0;
            rows.push(row);
        }

        let total_backlog: i64 = rows.iter().map(|r| r.backlog_bytes).sum();
        info!(
            monitor = %self.name,
            time = %now_str,
            sent = rows.iter().map(|r| r.sent).sum::<u64>(),
            delivered = rows.iter().map(|r| r.delivered).sum::<u64>(),
            discarded = rows.iter().map(|r| r.discarded).sum::<u64>(),
            backlog_kb = %format!("{:.1}", total_backlog as f64 / 1024.0),
            "total traffic"
        );
        rows
    }
}

impl EventSink for TrafficMonitor {
    fn record(&self, event: SimulationEvent) {
        let mut stats = self.stats.lock();
        let stat = stats.entry(event.source).or_default();
        match event.kind {
            EventKind::PacketSent { size, .. } => {
                stat.sent += 1;
                stat.backlog_pkts += 1;
                stat.backlog_bytes += size as i64;
            }
            EventKind::PacketDelivered { size, .. } => {
                stat.delivered += 1;
                stat.backlog_pkts -= 1;
                stat.backlog_bytes -= size as i64;
            }
            EventKind::PacketDiscarded { size, .. } => {
                stat.discarded += 1;
                stat.backlog_pkts -= 1;
                stat.backlog_bytes -= size as i64;
            }
            EventKind::PacketOnFly { .. } | EventKind::LinkBroken | EventKind::LinkRecovered => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::LinkEnd;
    use crate::timer::Timestamp;

    fn event(source: u64, kind: EventKind) -> SimulationEvent {
        SimulationEvent::new(source, Timestamp::ZERO, kind).unwrap()
    }

    #[test]
    fn test_backlog_balances() {
        let monitor = TrafficMonitor::new("test");
        let end = LinkEnd::Tail;
        monitor.record(event(1, EventKind::PacketSent { end, size: 100 }));
        monitor.record(event(1, EventKind::PacketSent { end, size: 50 }));
        monitor.record(event(2, EventKind::PacketSent { end, size: 10 }));
        monitor.record(event(1, EventKind::PacketDelivered { end, size: 100 }));
        monitor.record(event(2, EventKind::PacketDiscarded { end, size: 10 }));

        let rows = monitor.report();
        assert_eq!(
            rows,
            vec![
                LinkReport {
                    link: 1,
                    sent: 2,
                    delivered: 1,
                    discarded: 0,
                    backlog_pkts: 1,
                    backlog_bytes: 50,
                },
                LinkReport {
                    link: 2,
                    sent: 1,
                    delivered: 0,
                    discarded: 1,
                    backlog_pkts: 0,
                    backlog_bytes: 0,
                },
            ]
        );

        // rates reset, backlog stays
        let rows = monitor.report();
        assert_eq!(rows[0].sent, 0);
        assert_eq!(rows[0].backlog_bytes, 50);
    }
}
