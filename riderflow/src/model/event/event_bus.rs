use super::{EventTopic, SimulationEvent};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};
use tokio::sync::broadcast;

type EventReceiver = broadcast::Receiver<SimulationEvent>;

/// one bounded broadcast channel per topic. publishing never blocks; a
/// subscriber that falls more than the channel capacity behind loses the
/// oldest events and is told how many it missed.
///
/// system health events published before anyone subscribes (route and
/// reservoir failures at startup) are retained, up to the channel capacity,
/// for the first caller of [`EventBus::subscribe_from_start`].
#[derive(Debug, Clone)]
pub struct EventBus {
    channels: Arc<HashMap<EventTopic, broadcast::Sender<SimulationEvent>>>,
    health_backlog: Arc<Mutex<Option<EventReceiver>>>,
    capacity: usize,
}

impl EventBus {
    pub fn new(capacity: usize) -> EventBus {
        let capacity = capacity.max(1);
        let channels = EventTopic::ALL
            .iter()
            .map(|topic| {
                let (tx, _) = broadcast::channel(capacity);
                (*topic, tx)
            })
            .collect::<HashMap<_, _>>();
        let health_backlog = channels
            .get(&EventTopic::SystemHealth)
            .map(|tx| tx.subscribe());
        EventBus {
            channels: Arc::new(channels),
            health_backlog: Arc::new(Mutex::new(health_backlog)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// sends an event to its topic, returning the number of receivers that
    /// will see it. until claimed, the health backlog counts as a receiver of
    /// system health events. events on a topic without receivers are discarded.
    pub fn publish<E: Into<SimulationEvent>>(&self, event: E) -> usize {
        let event: SimulationEvent = event.into();
        let topic = event.topic();
        match self.channels.get(&topic) {
            Some(tx) => tx.send(event).unwrap_or(0),
            None => 0,
        }
    }

    pub fn publish_all<E: Into<SimulationEvent>>(&self, events: Vec<E>) {
        for event in events.into_iter() {
            self.publish(event);
        }
    }

    /// a receiver of events published from now on
    pub fn subscribe(&self, topic: EventTopic) -> EventReceiver {
        match self.channels.get(&topic) {
            Some(tx) => tx.subscribe(),
            // every topic is created in the constructor
            None => broadcast::channel(1).1,
        }
    }

    /// like [`EventBus::subscribe`], except that the first system health
    /// subscriber also receives the health events retained since the bus
    /// was created
    pub fn subscribe_from_start(&self, topic: EventTopic) -> EventReceiver {
        if topic == EventTopic::SystemHealth {
            let retained = self
                .health_backlog
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            if let Some(rx) = retained {
                return rx;
            }
        }
        self.subscribe(topic)
    }
}
