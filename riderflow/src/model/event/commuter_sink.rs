use super::{SimulationEvent, SinkError};

/// durable mirror of simulation events for analytics. writes are best
/// effort and a failing sink never affects the reservoirs.
pub trait CommuterSink: Send {
    fn write(&mut self, event: &SimulationEvent) -> Result<(), SinkError>;

    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// discards every event
#[derive(Debug, Default)]
pub struct NoopSink;

impl CommuterSink for NoopSink {
    fn write(&mut self, _event: &SimulationEvent) -> Result<(), SinkError> {
        Ok(())
    }
}
