use super::{CommuterSink, EventBus, EventTopic, SimulationEvent};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex, PoisonError,
};
use tokio::{
    sync::{broadcast, broadcast::error::RecvError, watch},
    task::JoinHandle,
};

/// counters of a running publisher
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PublisherStats {
    pub forwarded: u64,
    /// events skipped because the publisher lagged behind the channel
    pub lost: u64,
    pub sink_failures: u64,
}

#[derive(Debug, Default)]
struct SharedStats {
    forwarded: AtomicU64,
    lost: AtomicU64,
    sink_failures: AtomicU64,
}

impl SharedStats {
    fn snapshot(&self) -> PublisherStats {
        PublisherStats {
            forwarded: self.forwarded.load(Ordering::Relaxed),
            lost: self.lost.load(Ordering::Relaxed),
            sink_failures: self.sink_failures.load(Ordering::Relaxed),
        }
    }
}

type SharedSink = Arc<Mutex<Box<dyn CommuterSink>>>;

/// forwards events from every bus topic to a sink, one task per topic
pub struct EventPublisher {
    handles: Vec<JoinHandle<()>>,
    stats: Arc<SharedStats>,
    sink: SharedSink,
}

impl EventPublisher {
    /// subscribes to every topic and spawns the forwarding tasks. health
    /// events retained by the bus since startup are forwarded first. the
    /// tasks drain what is already queued and exit once `shutdown` flips to true.
    pub fn start(
        bus: &EventBus,
        sink: Box<dyn CommuterSink>,
        shutdown: watch::Receiver<bool>,
    ) -> EventPublisher {
        let stats = Arc::new(SharedStats::default());
        let sink: SharedSink = Arc::new(Mutex::new(sink));
        let handles = EventTopic::ALL
            .iter()
            .map(|topic| {
                let rx = bus.subscribe_from_start(*topic);
                tokio::spawn(forward(
                    *topic,
                    rx,
                    sink.clone(),
                    stats.clone(),
                    shutdown.clone(),
                ))
            })
            .collect();
        EventPublisher {
            handles,
            stats,
            sink,
        }
    }

    pub fn stats(&self) -> PublisherStats {
        self.stats.snapshot()
    }

    /// waits for every forwarding task, then flushes the sink
    pub async fn join(self) -> PublisherStats {
        for handle in self.handles.into_iter() {
            if let Err(e) = handle.await {
                log::error!("event publisher task failed: {e}");
            }
        }
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = sink.flush() {
            log::warn!("failure flushing event sink: {e}");
            self.stats.sink_failures.fetch_add(1, Ordering::Relaxed);
        }
        self.stats.snapshot()
    }
}

async fn forward(
    topic: EventTopic,
    mut rx: broadcast::Receiver<SimulationEvent>,
    sink: SharedSink,
    stats: Arc<SharedStats>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        if *shutdown.borrow() {
            break;
        }
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            received = rx.recv() => {
                match received {
                    Ok(event) => write_event(&sink, &stats, &event),
                    Err(RecvError::Lagged(missed)) => {
                        log::warn!("{topic} event publisher lagged, {missed} events lost");
                        stats.lost.fetch_add(missed, Ordering::Relaxed);
                    }
                    Err(RecvError::Closed) => return,
                }
            }
        }
    }
    // drain whatever was published before shutdown
    loop {
        match rx.try_recv() {
            Ok(event) => write_event(&sink, &stats, &event),
            Err(broadcast::error::TryRecvError::Lagged(missed)) => {
                stats.lost.fetch_add(missed, Ordering::Relaxed);
            }
            Err(_) => break,
        }
    }
}

fn write_event(sink: &SharedSink, stats: &SharedStats, event: &SimulationEvent) {
    let mut guard = sink.lock().unwrap_or_else(PoisonError::into_inner);
    match guard.write(event) {
        Ok(_) => {
            stats.forwarded.fetch_add(1, Ordering::Relaxed);
        }
        Err(e) => {
            log::warn!("failure persisting {} event: {e}", event.topic());
            stats.sink_failures.fetch_add(1, Ordering::Relaxed);
        }
    }
}
