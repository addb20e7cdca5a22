use super::{RegisteredRoute, SimulationContext, SimulationError, SpawnCycleReport};
use crate::{
    config::SpawnConfig,
    model::{
        commuter::Direction,
        density::corridor,
        event::{EventPublisher, HealthEvent, HealthStatus, PublisherStats},
        reservoir::{
            DepotReservoir, Reservoir, ReservoirError, ReservoirId, ReservoirStatistics,
            RouteReservoir, SpawnRequest,
        },
        spawn::{sample_spawn_count, spawn_rate},
    },
};
use chrono::{DateTime, Utc};
use geo::Coord;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};

/// where the commuters of a reservoir appear
#[derive(Debug, Clone, Copy)]
enum SpawnSite {
    Depot(Coord<f64>),
    /// anywhere along the route corridor
    Corridor,
}

struct ReservoirEntry {
    reservoir: Arc<dyn Reservoir>,
    site: SpawnSite,
    route: Arc<RegisteredRoute>,
    rng: Mutex<StdRng>,
}

impl ReservoirEntry {
    /// a random trip of at least `min_trip_m` along the route, or none when
    /// the route is too short to hold one. the request carries the sampled
    /// along-route distances so validation does not depend on how densely
    /// the route is digitized.
    fn trip_request<R: Rng>(
        &self,
        config: &SpawnConfig,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Option<SpawnRequest> {
        let index = &self.route.index;
        let total = index.total_length_m();
        let min_trip = config.min_trip_m;
        match self.site {
            SpawnSite::Depot(location) => {
                let origin = index.distance_along_coord(&location);
                let lowest = origin + min_trip;
                if lowest >= total {
                    return None;
                }
                let destination = rng.random_range(lowest..=total);
                let request = SpawnRequest::new(
                    location,
                    index.point_at_distance(destination),
                    Direction::Outbound,
                    now,
                );
                Some(request.with_along_route(origin, destination))
            }
            SpawnSite::Corridor => {
                if min_trip >= total {
                    return None;
                }
                let direction = if rng.random_bool(0.5) {
                    Direction::Outbound
                } else {
                    Direction::Inbound
                };
                let (origin, destination) = match direction {
                    Direction::Outbound => {
                        let origin = rng.random_range(0.0..=total - min_trip);
                        (origin, rng.random_range(origin + min_trip..=total))
                    }
                    Direction::Inbound => {
                        let origin = rng.random_range(min_trip..=total);
                        (origin, rng.random_range(0.0..=origin - min_trip))
                    }
                };
                let request = SpawnRequest::new(
                    index.point_at_distance(origin),
                    index.point_at_distance(destination),
                    direction,
                    now,
                );
                Some(request.with_along_route(origin, destination))
            }
        }
    }
}

struct OrchestratorInner {
    context: SimulationContext,
    entries: Vec<ReservoirEntry>,
    lookup: HashMap<ReservoirId, usize>,
}

impl OrchestratorInner {
    /// expire, weigh, draw and spawn for one reservoir. the density source is
    /// queried before any reservoir lock is taken.
    fn run_cycle(
        &self,
        entry: &ReservoirEntry,
        now: DateTime<Utc>,
    ) -> Result<SpawnCycleReport, SimulationError> {
        let id = entry.reservoir.id();
        let mut report = SpawnCycleReport::new(id.clone(), now);
        report.expired = entry.reservoir.expire_stale(now)?.len() as u64;

        let config = self.context.spawn_configs.get(id.key());
        let density = self.context.density.get(&config.density_source)?;
        let samples = match entry.site {
            SpawnSite::Depot(location) => vec![location],
            SpawnSite::Corridor => {
                corridor::corridor_samples(&entry.route.index, config.sample_spacing_m)
            }
        };
        let reading = density.weight(id.key(), &samples, config.radius_m, now);
        report.weight = reading.weight;
        report.degraded = reading.degraded;
        report.lambda = spawn_rate::calculate_for(&config, reading.weight, &now)?;

        let requests = {
            let mut rng = entry.rng.lock().map_err(|_| {
                SimulationError::RuntimeError(format!("random number generator poisoned for {id}"))
            })?;
            report.drawn = sample_spawn_count(report.lambda, &mut *rng)?;
            (0..report.drawn)
                .map(|_| entry.trip_request(&config, now, &mut *rng))
                .collect::<Vec<_>>()
        };

        for request in requests.into_iter() {
            let Some(request) = request else {
                report.rejected += 1;
                continue;
            };
            match entry.reservoir.spawn(request) {
                Ok(_) => report.spawned += 1,
                Err(ReservoirError::CapacityExceeded(..)) => report.dropped += 1,
                Err(ReservoirError::InvalidDestination(..))
                | Err(ReservoirError::InvalidPosition(..)) => report.rejected += 1,
                Err(e) => return Err(e.into()),
            }
        }

        if report.dropped > 0 {
            log::warn!(
                "{id} at capacity of {}, dropped {} of {} spawns",
                config.max_waiting,
                report.dropped,
                report.drawn
            );
        }
        log::debug!(
            "{id} cycle: weight {:.1}, lambda {:.3}, spawned {}, rejected {}, expired {}",
            report.weight,
            report.lambda,
            report.spawned,
            report.rejected,
            report.expired
        );
        Ok(report)
    }

    fn tick(&self, idx: usize) {
        let entry = &self.entries[idx];
        let now = self.context.clock.now();
        if let Err(e) = self.run_cycle(entry, now) {
            let id = entry.reservoir.id();
            log::warn!("spawn cycle failed for {id}: {e}");
            self.context.bus.publish(HealthEvent::new(
                &id.to_string(),
                HealthStatus::Failed,
                e.to_string(),
                now,
            ));
        }
    }

    /// wall-clock time between cycles of a reservoir under the current
    /// configuration and time scale
    fn cycle_period(&self, idx: usize) -> Duration {
        let id = self.entries[idx].reservoir.id();
        let config = self.context.spawn_configs.get(id.key());
        cycle_period(config.cycle_minutes, self.context.config.time_scale)
    }
}

/// drives periodic spawn cycles, one task per reservoir, and forwards
/// lifecycle events to the configured persistence sink.
pub struct Orchestrator {
    inner: Arc<OrchestratorInner>,
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
    publisher: Option<EventPublisher>,
}

impl Orchestrator {
    /// creates a route reservoir for every registered route and a depot
    /// reservoir for every configured depot. a reservoir that cannot be
    /// created is reported and left out.
    pub fn new(context: SimulationContext) -> Result<Orchestrator, SimulationError> {
        let seed = context.config.seed;
        let mut entries: Vec<ReservoirEntry> = vec![];
        let mut add = |reservoir: Arc<dyn Reservoir>, site, route| {
            let rng = match seed {
                Some(s) => StdRng::seed_from_u64(s.wrapping_add(entries.len() as u64)),
                None => StdRng::from_os_rng(),
            };
            entries.push(ReservoirEntry {
                reservoir,
                site,
                route,
                rng: Mutex::new(rng),
            });
        };

        for route_id in context.routes.ids().iter() {
            let Some(route) = context.routes.get(route_id) else {
                continue;
            };
            match RouteReservoir::new(
                route_id,
                route.index.clone(),
                route.segment_resolution,
                context.spawn_configs.clone(),
                context.bus.clone(),
            ) {
                Ok(reservoir) => add(Arc::new(reservoir), SpawnSite::Corridor, route),
                Err(e) => report_failure(&context, &format!("route/{route_id}"), &e.to_string()),
            }
        }

        for depot in context.config.depots.iter() {
            let component = format!("depot/{}", depot.id);
            let Some(route) = context.routes.get(&depot.route_id) else {
                let msg = format!("route '{}' is not registered", depot.route_id);
                report_failure(&context, &component, &msg);
                continue;
            };
            let location = Coord {
                x: depot.lon,
                y: depot.lat,
            };
            match DepotReservoir::new(
                &depot.id,
                location,
                Some(route.index.clone()),
                context.spawn_configs.clone(),
                context.bus.clone(),
            ) {
                Ok(reservoir) => add(Arc::new(reservoir), SpawnSite::Depot(location), route),
                Err(e) => report_failure(&context, &component, &e.to_string()),
            }
        }

        let lookup = entries
            .iter()
            .enumerate()
            .map(|(idx, e)| (e.reservoir.id().clone(), idx))
            .collect();
        log::info!("created {} reservoirs", entries.len());
        let (shutdown, _) = watch::channel(false);
        Ok(Orchestrator {
            inner: Arc::new(OrchestratorInner {
                context,
                entries,
                lookup,
            }),
            shutdown,
            tasks: vec![],
            publisher: None,
        })
    }

    pub fn context(&self) -> &SimulationContext {
        &self.inner.context
    }

    pub fn reservoir_ids(&self) -> Vec<ReservoirId> {
        self.inner
            .entries
            .iter()
            .map(|e| e.reservoir.id().clone())
            .collect()
    }

    /// the reservoir with an id, for vehicle controllers that board and
    /// alight commuters
    pub fn reservoir(&self, id: &ReservoirId) -> Option<Arc<dyn Reservoir>> {
        let idx = self.inner.lookup.get(id)?;
        Some(self.inner.entries[*idx].reservoir.clone())
    }

    pub fn statistics(&self) -> Result<Vec<(ReservoirId, ReservoirStatistics)>, SimulationError> {
        self.inner
            .entries
            .iter()
            .map(|e| Ok((e.reservoir.id().clone(), e.reservoir.statistics()?)))
            .collect()
    }

    /// performs one spawn cycle of a reservoir at simulation time `now`
    pub fn run_cycle(
        &self,
        reservoir: &ReservoirId,
        now: DateTime<Utc>,
    ) -> Result<SpawnCycleReport, SimulationError> {
        let idx = self
            .inner
            .lookup
            .get(reservoir)
            .ok_or_else(|| SimulationError::UnknownReservoir(reservoir.to_string()))?;
        self.inner.run_cycle(&self.inner.entries[*idx], now)
    }

    /// swaps in new spawn configurations. running loops pick them up on
    /// their next cycle.
    pub fn reload_spawn_config(
        &self,
        default: SpawnConfig,
        overrides: HashMap<String, SpawnConfig>,
    ) -> Result<(), SimulationError> {
        self.inner.context.spawn_configs.reload(default, overrides)?;
        Ok(())
    }

    /// starts the event publisher and one spawn loop per reservoir. must be
    /// called from within a tokio runtime.
    pub fn start(&mut self) -> Result<(), SimulationError> {
        if !self.tasks.is_empty() {
            return Err(SimulationError::RuntimeError(String::from(
                "orchestrator already started",
            )));
        }
        self.shutdown.send_replace(false);
        let sink = self.inner.context.config.persistence.build()?;
        self.publisher = Some(EventPublisher::start(
            &self.inner.context.bus,
            sink,
            self.shutdown.subscribe(),
        ));
        for idx in 0..self.inner.entries.len() {
            let task = spawn_loop(self.inner.clone(), idx, self.shutdown.subscribe());
            self.tasks.push(tokio::spawn(task));
        }
        log::info!("started {} spawn loops", self.tasks.len());
        Ok(())
    }

    /// cancels every spawn loop and waits for them and the event publisher
    /// to finish. a loop cancelled mid-cycle leaves its reservoir consistent.
    pub async fn stop(&mut self) -> Option<PublisherStats> {
        self.shutdown.send_replace(true);
        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                log::error!("spawn loop failed: {e}");
            }
        }
        let publisher = self.publisher.take()?;
        let stats = publisher.join().await;
        log::info!(
            "stopped, {} events persisted, {} lost, {} sink failures",
            stats.forwarded,
            stats.lost,
            stats.sink_failures
        );
        Some(stats)
    }
}

/// bounds of the wall-clock time between two spawn cycles
const MIN_CYCLE_PERIOD: Duration = Duration::from_millis(1);
const MAX_CYCLE_PERIOD: Duration = Duration::from_secs(366 * 24 * 3600);

/// wall-clock period of `cycle_minutes` simulated minutes, clamped to the
/// supported range
fn cycle_period(cycle_minutes: f64, time_scale: f64) -> Duration {
    let seconds = cycle_minutes * 60.0 / time_scale;
    match Duration::try_from_secs_f64(seconds) {
        Ok(period) => period.clamp(MIN_CYCLE_PERIOD, MAX_CYCLE_PERIOD),
        Err(_) if seconds > 0.0 => MAX_CYCLE_PERIOD,
        Err(_) => MIN_CYCLE_PERIOD,
    }
}

fn report_failure(context: &SimulationContext, component: &str, message: &str) {
    log::error!("{component} not created: {message}");
    context.bus.publish(HealthEvent::new(
        component,
        HealthStatus::Failed,
        message.to_string(),
        context.clock.now(),
    ));
}

async fn spawn_loop(inner: Arc<OrchestratorInner>, idx: usize, mut shutdown: watch::Receiver<bool>) {
    let mut period = inner.cycle_period(idx);
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
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
            _ = ticker.tick() => {
                inner.tick(idx);
                let next = inner.cycle_period(idx);
                if next != period {
                    period = next;
                    ticker = tokio::time::interval_at(Instant::now() + period, period);
                    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        app::{ManualClock, RouteRegistry},
        config::{DepotConfig, RouteConfig, SimulationConfig, SpawnConfigStore},
        model::{
            density::{DensityRegistry, DensitySourceConfig},
            event::{EventBus, PersistenceConfig},
        },
    };
    use riderflow_route::{
        algorithm::RouteTopologyBuilder,
        model::{RouteGeometry, RouteShape},
    };

    fn t0() -> DateTime<Utc> {
        // a Tuesday, 08:00
        DateTime::<Utc>::from_timestamp(1_704_182_400, 0).unwrap()
    }

    fn route_id() -> ReservoirId {
        ReservoirId::Route(String::from("r1"))
    }

    fn depot_id() -> ReservoirId {
        ReservoirId::Depot(String::from("d1"))
    }

    /// a 2.2 km northbound route with a depot at its southern end
    fn context(spawn: SpawnConfig, overrides: HashMap<String, SpawnConfig>) -> SimulationContext {
        // two shapes with a vertex every ~111 m, supplied out of order
        let shape = |from: usize| {
            let points: Vec<(f64, f64)> = (from..=from + 10)
                .map(|i| (-105.0, 39.7 + i as f64 * 0.001))
                .collect();
            RouteShape::from_lon_lat(&points)
        };
        let geometry = RouteGeometry::single("r1", vec![shape(10), shape(0)]);
        context_for(geometry, spawn, overrides)
    }

    fn context_for(
        geometry: RouteGeometry,
        spawn: SpawnConfig,
        overrides: HashMap<String, SpawnConfig>,
    ) -> SimulationContext {
        let mut config = SimulationConfig {
            seed: Some(7),
            time_scale: 3000.0,
            ..Default::default()
        };
        config.depots.push(DepotConfig {
            id: String::from("d1"),
            route_id: String::from("r1"),
            lon: -105.0,
            lat: 39.7,
        });
        config.density_sources.insert(
            String::from("default"),
            DensitySourceConfig::Constant { count: 100 },
        );
        let bus = EventBus::new(4096);
        let mut routes = RouteRegistry::default();
        routes.insert(
            RegisteredRoute::build(&geometry, &RouteTopologyBuilder::default(), 9).unwrap(),
        );
        let density =
            DensityRegistry::from_manifest(&config.density_sources, &config.density_resilience, &bus)
                .unwrap();
        SimulationContext {
            config: Arc::new(config),
            routes: Arc::new(routes),
            spawn_configs: Arc::new(SpawnConfigStore::new(spawn, overrides).unwrap()),
            density: Arc::new(density),
            bus,
            clock: Arc::new(ManualClock::new(t0())),
        }
    }

    fn stats_of(orchestrator: &Orchestrator, id: &ReservoirId) -> ReservoirStatistics {
        orchestrator.reservoir(id).unwrap().statistics().unwrap()
    }

    #[test]
    fn test_cycle_counts_add_up() {
        let orchestrator = Orchestrator::new(context(SpawnConfig::default(), HashMap::new())).unwrap();
        assert_eq!(orchestrator.reservoir_ids(), vec![route_id(), depot_id()]);

        let report = orchestrator.run_cycle(&route_id(), t0()).unwrap();
        // five corridor samples of 100 each, 0.3 per unit-hour over 5 minutes
        assert_eq!(report.weight, 500.0);
        assert!((report.lambda - 12.5).abs() < 1e-9);
        assert!(!report.degraded);
        assert_eq!(
            report.drawn,
            report.spawned + report.dropped + report.rejected
        );
        let stats = stats_of(&orchestrator, &route_id());
        assert_eq!(stats.spawned, report.spawned);
        assert!(stats.is_consistent());

        let depot = orchestrator.run_cycle(&depot_id(), t0()).unwrap();
        assert_eq!(depot.weight, 100.0);
        assert!((depot.lambda - 2.5).abs() < 1e-9);
        assert_eq!(stats_of(&orchestrator, &depot_id()).spawned, depot.spawned);
    }

    #[test]
    fn test_sparse_route_spawns_every_draw() {
        let endpoints = RouteShape::from_lon_lat(&[(-105.0, 39.7), (-105.0, 39.72)]);
        let geometry = RouteGeometry::single("r1", vec![endpoints]);
        let spawn = SpawnConfig {
            passengers_per_unit_per_hour: 3.0,
            ..Default::default()
        };
        let orchestrator = Orchestrator::new(context_for(geometry, spawn, HashMap::new())).unwrap();
        for id in [route_id(), depot_id()] {
            let report = orchestrator.run_cycle(&id, t0()).unwrap();
            assert!(report.drawn > 0, "{id}: {report:?}");
            assert_eq!(report.rejected, 0, "{id}: {report:?}");
            assert_eq!(report.spawned, report.drawn, "{id}: {report:?}");
        }
    }

    #[test]
    fn test_cycle_period_is_bounded() {
        assert_eq!(cycle_period(5.0, 1.0), Duration::from_secs(300));
        assert_eq!(cycle_period(5.0, 60.0), Duration::from_secs(5));
        assert_eq!(cycle_period(1e300, 1e-300), MAX_CYCLE_PERIOD);
        assert_eq!(cycle_period(1.0, 1e300), MIN_CYCLE_PERIOD);
    }

    #[test]
    fn test_seeded_runs_repeat() {
        let a = Orchestrator::new(context(SpawnConfig::default(), HashMap::new())).unwrap();
        let b = Orchestrator::new(context(SpawnConfig::default(), HashMap::new())).unwrap();
        let ra = a.run_cycle(&route_id(), t0()).unwrap();
        let rb = b.run_cycle(&route_id(), t0()).unwrap();
        assert_eq!(ra.drawn, rb.drawn);
        assert_eq!(ra.spawned, rb.spawned);
    }

    #[test]
    fn test_capacity_limits_waiting() {
        let spawn = SpawnConfig {
            passengers_per_unit_per_hour: 3.0,
            max_waiting: 3,
            ..Default::default()
        };
        let orchestrator = Orchestrator::new(context(spawn, HashMap::new())).unwrap();
        let report = orchestrator.run_cycle(&route_id(), t0()).unwrap();
        assert!(report.dropped > 0);
        let stats = stats_of(&orchestrator, &route_id());
        assert_eq!(stats.waiting, 3);
        assert_eq!(stats.dropped, report.dropped);
        assert!(stats.is_consistent());
    }

    #[test]
    fn test_expiry_runs_each_cycle() {
        let spawn = SpawnConfig {
            expiry_timeout_seconds: 60,
            ..Default::default()
        };
        let orchestrator = Orchestrator::new(context(spawn, HashMap::new())).unwrap();
        let first = orchestrator.run_cycle(&route_id(), t0()).unwrap();
        assert!(first.spawned > 0);
        let later = t0() + chrono::TimeDelta::seconds(61);
        let second = orchestrator.run_cycle(&route_id(), later).unwrap();
        assert_eq!(second.expired, first.spawned);
        assert!(stats_of(&orchestrator, &route_id()).is_consistent());
    }

    #[test]
    fn test_hot_reload_applies_next_cycle() {
        let orchestrator = Orchestrator::new(context(SpawnConfig::default(), HashMap::new())).unwrap();
        let quiet = SpawnConfig {
            default_multiplier: 0.0,
            ..Default::default()
        };
        orchestrator.reload_spawn_config(quiet, HashMap::new()).unwrap();
        let report = orchestrator.run_cycle(&route_id(), t0()).unwrap();
        assert_eq!(report.lambda, 0.0);
        assert_eq!(report.drawn, 0);
    }

    #[test]
    fn test_configuration_error_is_isolated() {
        let broken = SpawnConfig {
            density_source: String::from("missing"),
            ..Default::default()
        };
        let overrides = HashMap::from([(String::from("d1"), broken)]);
        let orchestrator = Orchestrator::new(context(SpawnConfig::default(), overrides)).unwrap();
        assert!(matches!(
            orchestrator.run_cycle(&depot_id(), t0()),
            Err(SimulationError::ConfigurationError { .. })
        ));
        assert!(orchestrator.run_cycle(&route_id(), t0()).is_ok());
        assert!(matches!(
            orchestrator.run_cycle(&ReservoirId::Route(String::from("r9")), t0()),
            Err(SimulationError::UnknownReservoir(_))
        ));
    }

    #[tokio::test]
    async fn test_startup_failures_reach_the_sink() {
        let path = std::env::temp_dir().join(format!(
            "riderflow-startup-health-{}.jsonl",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        let mut config = SimulationConfig {
            persistence: PersistenceConfig::JsonLines {
                file: path.display().to_string(),
            },
            ..Default::default()
        };
        config.density_sources.insert(
            String::from("default"),
            DensitySourceConfig::Constant { count: 1 },
        );
        config.routes.push(RouteConfig {
            id: String::from("missing"),
            geometry_file: String::from("/nonexistent/riderflow/missing.geojson"),
            segment_resolution: 9,
        });
        let context = SimulationContext::from_config(config).unwrap();
        let mut orchestrator = Orchestrator::new(context).unwrap();
        assert!(orchestrator.reservoir_ids().is_empty());
        orchestrator.start().unwrap();
        let publisher = orchestrator.stop().await.unwrap();
        assert!(publisher.forwarded >= 1);
        let persisted = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert!(persisted.contains("route/missing"), "{persisted}");
        assert!(persisted.contains("failed"), "{persisted}");
    }

    #[tokio::test]
    async fn test_start_and_stop() {
        let mut orchestrator =
            Orchestrator::new(context(SpawnConfig::default(), HashMap::new())).unwrap();
        orchestrator.start().unwrap();
        assert!(orchestrator.start().is_err());
        tokio::time::sleep(Duration::from_millis(250)).await;
        let publisher = orchestrator.stop().await.unwrap();
        let spawned: u64 = orchestrator
            .statistics()
            .unwrap()
            .iter()
            .map(|(_, s)| s.spawned)
            .sum();
        assert!(spawned > 0);
        assert!(publisher.forwarded >= spawned);
        assert_eq!(publisher.lost, 0);
    }
}
