use super::{CommuterSink, SimulationEvent, SinkError};
use std::{
    fs::{File, OpenOptions},
    io::{BufWriter, Write},
    path::Path,
};

/// appends each event as one JSON object per line
pub struct JsonLinesSink<W: Write + Send> {
    writer: W,
}

impl JsonLinesSink<BufWriter<File>> {
    pub fn open(path: &Path) -> Result<Self, SinkError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| SinkError::OpenError(path.display().to_string(), e.to_string()))?;
        Ok(JsonLinesSink::new(BufWriter::new(file)))
    }
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> CommuterSink for JsonLinesSink<W> {
    fn write(&mut self, event: &SimulationEvent) -> Result<(), SinkError> {
        serde_json::to_writer(&mut self.writer, event)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::event::{HealthEvent, HealthStatus};
    use chrono::DateTime;

    #[test]
    fn test_one_line_per_event() {
        let mut sink = JsonLinesSink::new(Vec::new());
        let timestamp = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        for status in [HealthStatus::Degraded, HealthStatus::Recovered] {
            let event = HealthEvent::new("density/default", status, String::from("m"), timestamp);
            sink.write(&SimulationEvent::from(event)).unwrap();
        }
        sink.flush().unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["type"], "health");
        assert_eq!(first["status"], "degraded");
    }
}
