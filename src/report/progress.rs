use std::{
    sync::mpsc::{self, RecvTimeoutError, Sender},
    thread::Scope,
    time::{Duration, Instant},
};

use tracing::info;

use crate::search::SearchStats;

/// Logs the number of generated nodes every `interval` until the returned
/// sender is dropped.
pub fn spawn<'scope>(
    scope: &'scope Scope<'scope, '_>,
    stats: &'scope SearchStats,
    interval: Duration,
    start: Instant,
) -> Sender<()> {
    let (stop_tx, stop_rx) = mpsc::channel::<()>();
    let interval = interval.max(Duration::from_millis(1));
    scope.spawn(move || {
        let mut last_nodes = 0u64;
        let mut last_tick = start;
        loop {
            match stop_rx.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
            }
            let nodes = stats.nodes();
            let now = Instant::now();
            let window = now.duration_since(last_tick).as_secs_f64();
            let rate = if window > 0.0 {
                nodes.saturating_sub(last_nodes) as f64 / window
            } else {
                0.0
            };
            info!(
                nodes,
                max_depth = stats.snapshot().max_depth,
                elapsed_secs = now.duration_since(start).as_secs_f64(),
                nodes_per_sec = rate.round(),
                "progress"
            );
            last_nodes = nodes;
            last_tick = now;
        }
    });
    stop_tx
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn stops_when_sender_dropped() {
        let stats = SearchStats::new();
        stats.record_node(1, 0);
        thread::scope(|scope| {
            let stop = spawn(scope, &stats, Duration::from_millis(1), Instant::now());
            thread::sleep(Duration::from_millis(5));
            drop(stop);
        });
        assert_eq!(stats.nodes(), 1);
    }
}
