use chrono::{DateTime, TimeDelta, Utc};
use std::sync::{Mutex, PoisonError};

/// source of simulation time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// wall-clock time, optionally accelerated. simulation time starts at the
/// wall-clock time of construction and advances `time_scale` seconds per
/// real second.
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: DateTime<Utc>,
    time_scale: f64,
}

impl SystemClock {
    pub fn new(time_scale: f64) -> SystemClock {
        SystemClock {
            origin: Utc::now(),
            time_scale,
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        SystemClock::new(1.0)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        let wall = Utc::now();
        if self.time_scale == 1.0 {
            return wall;
        }
        let elapsed = (wall - self.origin).num_milliseconds() as f64;
        let scaled = TimeDelta::milliseconds((elapsed * self.time_scale) as i64);
        self.origin + scaled
    }
}

/// a clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> ManualClock {
        ManualClock {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, time: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = time;
    }

    pub fn advance(&self, delta: TimeDelta) -> DateTime<Utc> {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += delta;
        *now
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
