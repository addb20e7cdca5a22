mod commuter_sink;
mod event_bus;
mod event_publisher;
mod event_topic;
mod health_event;
mod json_lines_sink;
mod lifecycle_event;
mod persistence_config;
mod simulation_event;
mod sink_error;

pub use commuter_sink::{CommuterSink, NoopSink};
pub use event_bus::EventBus;
pub use event_publisher::{EventPublisher, PublisherStats};
pub use event_topic::EventTopic;
pub use health_event::{HealthEvent, HealthStatus};
pub use json_lines_sink::JsonLinesSink;
pub use lifecycle_event::{LifecycleEvent, LifecycleEventType};
pub use persistence_config::PersistenceConfig;
pub use simulation_event::SimulationEvent;
pub use sink_error::SinkError;
