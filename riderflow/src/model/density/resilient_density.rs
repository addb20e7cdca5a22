use super::{DensityError, DensitySource, ResilienceConfig, SourceHealth};
use crate::model::event::{EventBus, HealthEvent, HealthStatus};
use chrono::{DateTime, TimeDelta, Utc};
use geo::Coord;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

/// a spatial weight and whether it came from a fallback
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DensityReading {
    pub weight: f64,
    pub degraded: bool,
}

#[derive(Debug)]
struct ResilientState {
    /// last good weight per reservoir key
    cache: HashMap<String, f64>,
    consecutive_failures: u32,
    health: SourceHealth,
}

/// wraps a density source with a per-reservoir cache of the last good
/// weight. failed queries fall back to the cached weight, or to the
/// configured constant, and mark the reading degraded. after
/// `failure_threshold` consecutive failures the source is skipped until
/// `retry_after_seconds` pass, when a single trial call is allowed.
pub struct ResilientDensity {
    source: Arc<dyn DensitySource>,
    config: ResilienceConfig,
    bus: EventBus,
    state: Mutex<ResilientState>,
}

impl ResilientDensity {
    pub fn new(source: Arc<dyn DensitySource>, config: ResilienceConfig, bus: EventBus) -> Self {
        Self {
            source,
            config,
            bus,
            state: Mutex::new(ResilientState {
                cache: HashMap::new(),
                consecutive_failures: 0,
                health: SourceHealth::Healthy,
            }),
        }
    }

    pub fn name(&self) -> &str {
        self.source.name()
    }

    pub fn health(&self) -> SourceHealth {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .health
    }

    /// the summed count around every sample point. the source is queried
    /// without holding the internal lock.
    pub fn weight(
        &self,
        key: &str,
        samples: &[Coord<f64>],
        radius_m: f64,
        now: DateTime<Utc>,
    ) -> DensityReading {
        if !self.admit(now) {
            return self.fallback(key);
        }
        match self.query(samples, radius_m) {
            Ok(weight) => {
                self.record_success(key, weight, now);
                DensityReading {
                    weight,
                    degraded: false,
                }
            }
            Err(e) => {
                self.record_failure(key, &e, now);
                self.fallback(key)
            }
        }
    }

    fn query(&self, samples: &[Coord<f64>], radius_m: f64) -> Result<f64, DensityError> {
        let mut total: u64 = 0;
        for sample in samples.iter() {
            let count = self.source.count_within(sample.y, sample.x, radius_m)?;
            total = total.saturating_add(count);
        }
        Ok(total as f64)
    }

    /// false while the source is disabled. once the retry time has passed
    /// the next caller is admitted as the trial and the window is pushed
    /// forward for everyone else.
    fn admit(&self, now: DateTime<Utc>) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match state.health {
            SourceHealth::Disabled { retry_at } if now < retry_at => false,
            SourceHealth::Disabled { .. } => {
                state.health = SourceHealth::Disabled {
                    retry_at: self.retry_at(now),
                };
                true
            }
            _ => true,
        }
    }

    /// end of the retry window opened at `now`, saturating at the latest
    /// representable time
    fn retry_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        TimeDelta::try_seconds(self.config.retry_after_seconds.max(0))
            .and_then(|delta| now.checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    fn fallback(&self, key: &str) -> DensityReading {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let weight = state
            .cache
            .get(key)
            .copied()
            .unwrap_or(self.config.fallback_count as f64);
        DensityReading {
            weight,
            degraded: true,
        }
    }

    fn record_success(&self, key: &str, weight: f64, now: DateTime<Utc>) {
        let recovered = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.cache.insert(key.to_string(), weight);
            state.consecutive_failures = 0;
            let was_unhealthy = state.health != SourceHealth::Healthy;
            state.health = SourceHealth::Healthy;
            was_unhealthy
        };
        if recovered {
            log::info!("density source '{}' recovered", self.name());
            self.publish(HealthStatus::Recovered, String::from("source recovered"), now);
        }
    }

    fn record_failure(&self, key: &str, error: &DensityError, now: DateTime<Utc>) {
        let transition = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.consecutive_failures = state.consecutive_failures.saturating_add(1);
            let previous = state.health;
            if state.consecutive_failures >= self.config.failure_threshold.max(1) {
                state.health = SourceHealth::Disabled {
                    retry_at: self.retry_at(now),
                };
            } else {
                state.health = SourceHealth::Degraded {
                    consecutive_failures: state.consecutive_failures,
                };
            }
            match (previous, state.health) {
                (SourceHealth::Healthy, SourceHealth::Degraded { .. }) => {
                    Some(HealthStatus::Degraded)
                }
                (SourceHealth::Disabled { .. }, SourceHealth::Disabled { .. }) => None,
                (_, SourceHealth::Disabled { .. }) => Some(HealthStatus::Disabled),
                _ => None,
            }
        };
        log::warn!(
            "density source '{}' failed for '{key}', using fallback weight: {error}",
            self.name()
        );
        if let Some(status) = transition {
            self.publish(status, error.to_string(), now);
        }
    }

    fn publish(&self, status: HealthStatus, message: String, now: DateTime<Utc>) {
        let component = format!("density/{}", self.name());
        self.bus
            .publish(HealthEvent::new(&component, status, message, now));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::event::{EventTopic, SimulationEvent};
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    /// returns 10 per query, or fails while `failing` is set
    struct FlakySource {
        failing: AtomicBool,
        calls: AtomicU32,
    }

    impl DensitySource for FlakySource {
        fn name(&self) -> &str {
            "flaky"
        }

        fn count_within(&self, _lat: f64, _lon: f64, _radius_m: f64) -> Result<u64, DensityError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                Err(DensityError::Unavailable(
                    String::from("flaky"),
                    String::from("timeout"),
                ))
            } else {
                Ok(10)
            }
        }
    }

    fn t(seconds: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_700_000_000 + seconds, 0).unwrap()
    }

    fn samples() -> Vec<Coord<f64>> {
        vec![Coord { x: 0.0, y: 0.0 }, Coord { x: 0.0, y: 0.01 }]
    }

    #[test]
    fn test_sums_samples_and_caches() {
        let source = Arc::new(FlakySource {
            failing: AtomicBool::new(false),
            calls: AtomicU32::new(0),
        });
        let resilient = ResilientDensity::new(source.clone(), ResilienceConfig::default(), EventBus::new(8));
        let reading = resilient.weight("r1", &samples(), 500.0, t(0));
        assert_eq!(reading, DensityReading { weight: 20.0, degraded: false });

        source.failing.store(true, Ordering::SeqCst);
        let cached = resilient.weight("r1", &samples(), 500.0, t(1));
        assert_eq!(cached, DensityReading { weight: 20.0, degraded: true });
        let uncached = resilient.weight("r2", &samples(), 500.0, t(2));
        assert_eq!(uncached, DensityReading { weight: 0.0, degraded: true });
    }

    #[test]
    fn test_disable_then_trial_and_recover() {
        let source = Arc::new(FlakySource {
            failing: AtomicBool::new(true),
            calls: AtomicU32::new(0),
        });
        let config = ResilienceConfig {
            fallback_count: 7,
            failure_threshold: 2,
            retry_after_seconds: 60,
        };
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe(EventTopic::SystemHealth);
        let resilient = ResilientDensity::new(source.clone(), config, bus);
        let one = vec![Coord { x: 0.0, y: 0.0 }];

        assert_eq!(resilient.weight("d1", &one, 100.0, t(0)).weight, 7.0);
        assert!(matches!(resilient.health(), SourceHealth::Degraded { .. }));
        resilient.weight("d1", &one, 100.0, t(1));
        assert_eq!(resilient.health(), SourceHealth::Disabled { retry_at: t(61) });
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);

        // skipped while disabled
        resilient.weight("d1", &one, 100.0, t(30));
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);

        // trial after the window succeeds
        source.failing.store(false, Ordering::SeqCst);
        let reading = resilient.weight("d1", &one, 100.0, t(61));
        assert_eq!(reading, DensityReading { weight: 10.0, degraded: false });
        assert_eq!(resilient.health(), SourceHealth::Healthy);

        let statuses: Vec<HealthStatus> = std::iter::from_fn(|| rx.try_recv().ok())
            .filter_map(|e| match e {
                SimulationEvent::Health(h) => Some(h.status),
                SimulationEvent::Lifecycle(_) => None,
            })
            .collect();
        assert_eq!(
            statuses,
            vec![
                HealthStatus::Degraded,
                HealthStatus::Disabled,
                HealthStatus::Recovered
            ]
        );
    }

    #[test]
    fn test_failed_trial_stays_disabled() {
        let source = Arc::new(FlakySource {
            failing: AtomicBool::new(true),
            calls: AtomicU32::new(0),
        });
        let config = ResilienceConfig {
            fallback_count: 0,
            failure_threshold: 1,
            retry_after_seconds: 10,
        };
        let resilient = ResilientDensity::new(source.clone(), config, EventBus::new(4));
        let one = vec![Coord { x: 0.0, y: 0.0 }];
        resilient.weight("d1", &one, 100.0, t(0));
        resilient.weight("d1", &one, 100.0, t(10));
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(resilient.health(), SourceHealth::Disabled { retry_at: t(20) });
    }

    #[test]
    fn test_unbounded_retry_window_saturates() {
        let source = Arc::new(FlakySource {
            failing: AtomicBool::new(true),
            calls: AtomicU32::new(0),
        });
        let config = ResilienceConfig {
            fallback_count: 3,
            failure_threshold: 1,
            retry_after_seconds: i64::MAX,
        };
        let resilient = ResilientDensity::new(source.clone(), config, EventBus::new(4));
        let one = vec![Coord { x: 0.0, y: 0.0 }];
        let reading = resilient.weight("d1", &one, 100.0, t(0));
        assert_eq!(reading, DensityReading { weight: 3.0, degraded: true });
        assert_eq!(
            resilient.health(),
            SourceHealth::Disabled {
                retry_at: DateTime::<Utc>::MAX_UTC
            }
        );
        // still answers from the fallback afterwards
        assert_eq!(resilient.weight("d1", &one, 100.0, t(60)).weight, 3.0);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }
}
