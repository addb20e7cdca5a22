use super::{
    commuter_ledger::CommuterLedger, reservoir_ops, Reservoir, ReservoirError, ReservoirId,
    ReservoirStatistics, RouteSegment, SpawnRequest,
};
use crate::{
    config::SpawnConfigStore,
    model::{
        commuter::{Commuter, CommuterId, CommuterState, Direction},
        event::{EventBus, LifecycleEvent, LifecycleEventType},
    },
};
use chrono::{DateTime, Utc};
use geo::Coord;
use h3o::{CellIndex, LatLng, Resolution};
use riderflow_route::index::DistanceIndex;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

#[derive(Debug, Default)]
struct RouteState {
    segments: HashMap<CellIndex, RouteSegment>,
    /// segment cell of every waiting commuter
    locator: HashMap<CommuterId, CellIndex>,
    ledger: CommuterLedger,
}

impl RouteState {
    fn remove_waiting(&mut self, commuter_id: &CommuterId) -> Option<Commuter> {
        let cell = self.locator.remove(commuter_id)?;
        let segment = self.segments.get_mut(&cell)?;
        let found = segment
            .inbound
            .iter()
            .chain(segment.outbound.iter())
            .find(|c| c.id == *commuter_id)
            .cloned()?;
        let removed = reservoir_ops::remove_by_id(segment.lane_mut(found.direction), &found);
        if segment.is_empty() {
            self.segments.remove(&cell);
        }
        removed
    }
}

/// waiting commuters along one route, bucketed into h3 cell segments with
/// separate inbound and outbound lists. the route distance index is shared
/// read-only with every other user of the route.
pub struct RouteReservoir {
    id: ReservoirId,
    index: Arc<DistanceIndex>,
    resolution: Resolution,
    configs: Arc<SpawnConfigStore>,
    bus: EventBus,
    state: Mutex<RouteState>,
}

impl RouteReservoir {
    pub fn new(
        id: &str,
        index: Arc<DistanceIndex>,
        segment_resolution: u8,
        configs: Arc<SpawnConfigStore>,
        bus: EventBus,
    ) -> Result<RouteReservoir, ReservoirError> {
        let resolution = Resolution::try_from(segment_resolution)
            .map_err(|e| ReservoirError::InvalidResolution(segment_resolution, e.to_string()))?;
        Ok(RouteReservoir {
            id: ReservoirId::Route(id.to_string()),
            index,
            resolution,
            configs,
            bus,
            state: Mutex::new(RouteState::default()),
        })
    }

    pub fn distance_index(&self) -> &Arc<DistanceIndex> {
        &self.index
    }

    pub fn segment_count(&self) -> Result<usize, ReservoirError> {
        let state = reservoir_ops::lock(&self.state, &self.id)?;
        Ok(state.segments.len())
    }

    fn cell_of(&self, coord: &Coord<f64>) -> Result<CellIndex, ReservoirError> {
        let latlng = LatLng::new(coord.y, coord.x)
            .map_err(|e| ReservoirError::InvalidPosition(self.id.to_string(), e.to_string()))?;
        Ok(latlng.to_cell(self.resolution))
    }

    /// grid distance that covers every cell holding a point within
    /// `radius_m`, assuming cell centers at least 3/4 of the average edge
    /// length apart
    fn ring_count(&self, radius_m: f64) -> u32 {
        let spacing = self.resolution.edge_length_m() * 0.75;
        let rings = (radius_m / spacing).ceil();
        if rings >= u32::MAX as f64 {
            u32::MAX
        } else {
            rings as u32 + 1
        }
    }

    /// candidate segment cells for a proximity search. when the disk of
    /// cells is larger than the number of occupied segments, every occupied
    /// segment is scanned instead.
    fn candidate_cells(&self, state: &RouteState, query: CellIndex, radius_m: f64) -> Vec<CellIndex> {
        let k = self.ring_count(radius_m) as u64;
        let disk_size = 3 * k * (k + 1) + 1;
        if disk_size > state.segments.len() as u64 {
            state.segments.keys().copied().collect()
        } else {
            // k fits in u32 since the disk is no larger than the segment count
            query.grid_disk::<Vec<_>>(k as u32)
        }
    }

    /// validates the travel direction along the route and returns the
    /// along-route trip length
    fn trip_length(&self, request: &SpawnRequest) -> Result<f64, ReservoirError> {
        let (origin, destination) =
            reservoir_ops::along_route(&self.id, &self.index, &request.position, request)?;
        let valid = match request.direction {
            Direction::Outbound => destination > origin,
            Direction::Inbound => destination < origin,
        };
        if !valid {
            return Err(ReservoirError::InvalidDestination(
                self.id.to_string(),
                format!(
                    "{} trip from {origin:.1}m to {destination:.1}m along the route",
                    request.direction
                ),
            ));
        }
        Ok((destination - origin).abs())
    }
}

impl Reservoir for RouteReservoir {
    fn id(&self) -> &ReservoirId {
        &self.id
    }

    fn spawn(&self, request: SpawnRequest) -> Result<Commuter, ReservoirError> {
        reservoir_ops::validate_position(&self.id, &request.position, "position")?;
        reservoir_ops::validate_position(&self.id, &request.destination, "destination")?;
        let trip_length_m = self.trip_length(&request)?;
        let cell = self.cell_of(&request.position)?;
        let config = self.configs.get(self.id.key());
        let expires_at = reservoir_ops::expires_at(&self.id, &config, &request.now)?;

        let admitted = {
            let mut state = reservoir_ops::lock(&self.state, &self.id)?;
            if state.locator.len() >= config.max_waiting {
                state.ledger.record_drop();
                None
            } else {
                let commuter = Commuter {
                    id: CommuterId::next(),
                    position: request.position,
                    destination: request.destination,
                    owner: self.id.clone(),
                    direction: request.direction,
                    priority: request.priority,
                    spawned_at: request.now,
                    expires_at,
                    state: CommuterState::WaitingToBoard,
                    vehicle_id: None,
                    trip_length_m: Some(trip_length_m),
                };
                state
                    .segments
                    .entry(cell)
                    .or_insert_with(|| RouteSegment::new(cell))
                    .lane_mut(commuter.direction)
                    .push(commuter.clone());
                state.locator.insert(commuter.id, cell);
                state.ledger.record_spawn();
                Some(commuter)
            }
        };

        match admitted {
            Some(commuter) => {
                self.bus.publish(LifecycleEvent::for_commuter(
                    LifecycleEventType::Spawned,
                    &commuter,
                    request.now,
                ));
                Ok(commuter)
            }
            None => {
                self.bus
                    .publish(LifecycleEvent::dropped(&self.id, request.position, request.now));
                Err(ReservoirError::CapacityExceeded(
                    self.id.to_string(),
                    config.max_waiting,
                ))
            }
        }
    }

    fn find_commuters_near(
        &self,
        position: &Coord<f64>,
        radius_m: f64,
        direction: Option<Direction>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Commuter>, ReservoirError> {
        reservoir_ops::validate_position(&self.id, position, "query position")?;
        reservoir_ops::validate_radius(&self.id, radius_m)?;
        let query = self.cell_of(position)?;
        let mut candidates = vec![];
        {
            let state = reservoir_ops::lock(&self.state, &self.id)?;
            for cell in self.candidate_cells(&state, query, radius_m).iter() {
                let Some(segment) = state.segments.get(cell) else {
                    continue;
                };
                let lanes = match direction {
                    Some(d) => vec![segment.lane(d)],
                    None => vec![&segment.inbound, &segment.outbound],
                };
                for lane in lanes.into_iter() {
                    reservoir_ops::collect_near(
                        lane,
                        position,
                        radius_m,
                        None,
                        &now,
                        &mut candidates,
                    );
                }
            }
        }
        Ok(reservoir_ops::sort_by_proximity(candidates))
    }

    fn board(
        &self,
        commuter_id: CommuterId,
        vehicle_id: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, ReservoirError> {
        let event = {
            let mut state = reservoir_ops::lock(&self.state, &self.id)?;
            let commuter = match state.remove_waiting(&commuter_id) {
                Some(commuter) => commuter,
                None => return Ok(false),
            };
            if commuter.is_overdue(&now) {
                let mut expired = vec![commuter];
                state.ledger.record_expired(&mut expired);
                LifecycleEvent::for_commuter(LifecycleEventType::Expired, &expired[0], now)
            } else {
                let boarded = state.ledger.board(commuter, vehicle_id);
                LifecycleEvent::for_commuter(LifecycleEventType::Boarded, &boarded, now)
            }
        };
        let boarded = event.event_type == LifecycleEventType::Boarded;
        self.bus.publish(event);
        Ok(boarded)
    }

    fn expire_stale(&self, now: DateTime<Utc>) -> Result<Vec<Commuter>, ReservoirError> {
        let expired = {
            let mut state = reservoir_ops::lock(&self.state, &self.id)?;
            let mut expired = vec![];
            for segment in state.segments.values_mut() {
                expired.extend(segment.take_overdue(&now));
            }
            state.segments.retain(|_, segment| !segment.is_empty());
            for commuter in expired.iter() {
                state.locator.remove(&commuter.id);
            }
            state.ledger.record_expired(&mut expired);
            expired.sort_by_key(|c| c.id);
            expired
        };
        self.bus.publish_all(
            expired
                .iter()
                .map(|c| LifecycleEvent::for_commuter(LifecycleEventType::Expired, c, now))
                .collect(),
        );
        Ok(expired)
    }

    fn update_vehicle_position(
        &self,
        vehicle_id: &str,
        position: &Coord<f64>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Commuter>, ReservoirError> {
        reservoir_ops::validate_position(&self.id, position, "vehicle position")?;
        let threshold_m = self.configs.get(self.id.key()).alight_threshold_m;
        let alighted = {
            let mut state = reservoir_ops::lock(&self.state, &self.id)?;
            state.ledger.alight_near(vehicle_id, position, threshold_m)
        };
        for commuter in alighted.iter() {
            self.bus.publish(LifecycleEvent::for_commuter(
                LifecycleEventType::Alighted,
                commuter,
                now,
            ));
        }
        Ok(alighted)
    }

    fn statistics(&self) -> Result<ReservoirStatistics, ReservoirError> {
        let state = reservoir_ops::lock(&self.state, &self.id)?;
        Ok(state.ledger.statistics(state.locator.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpawnConfig;
    use chrono::TimeDelta;
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use riderflow_route::model::OrderedRoute;

    fn t0() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap()
    }

    /// a straight northbound route of about 11 km with a vertex every ~111 m
    fn route_index() -> Arc<DistanceIndex> {
        let points = (0..=100)
            .map(|i| Coord {
                x: -105.0,
                y: 39.7 + i as f64 * 0.001,
            })
            .collect();
        Arc::new(DistanceIndex::new(OrderedRoute::new(points).unwrap()))
    }

    fn reservoir(config: SpawnConfig) -> RouteReservoir {
        let store = SpawnConfigStore::new(config, HashMap::new()).unwrap();
        RouteReservoir::new("r1", route_index(), 9, Arc::new(store), EventBus::new(256)).unwrap()
    }

    fn at(i: usize) -> Coord<f64> {
        Coord {
            x: -105.0,
            y: 39.7 + i as f64 * 0.001,
        }
    }

    fn outbound(from: usize, to: usize, offset_s: i64) -> SpawnRequest {
        SpawnRequest::new(at(from), at(to), Direction::Outbound, t0() + TimeDelta::seconds(offset_s))
    }

    #[test]
    fn test_direction_validated_along_route() {
        let reservoir = reservoir(SpawnConfig::default());
        assert!(reservoir.spawn(outbound(10, 40, 0)).is_ok());
        assert!(matches!(
            reservoir.spawn(outbound(40, 10, 0)),
            Err(ReservoirError::InvalidDestination(_, _))
        ));
        let inbound = SpawnRequest::new(at(40), at(10), Direction::Inbound, t0());
        let commuter = reservoir.spawn(inbound).unwrap();
        let trip = commuter.trip_length_m.unwrap();
        assert!((trip - 30.0 * 111.195).abs() < 5.0, "trip {trip}");
        let stats = reservoir.statistics().unwrap();
        assert_eq!(stats.spawned, 2);
        assert_eq!(stats.dropped, 0);
    }

    #[test]
    fn test_find_sorted_and_filtered() {
        let reservoir = reservoir(SpawnConfig::default());
        let far = reservoir.spawn(outbound(12, 50, 0)).unwrap();
        let near_late = reservoir.spawn(outbound(10, 50, 20)).unwrap();
        let near_early = reservoir.spawn(outbound(10, 50, 10)).unwrap();
        let inbound = reservoir
            .spawn(SpawnRequest::new(at(11), at(0), Direction::Inbound, t0()))
            .unwrap();
        reservoir.spawn(outbound(80, 90, 0)).unwrap();

        let found = reservoir.find_commuters_near(&at(10), 500.0, None, t0()).unwrap();
        let ids: Vec<CommuterId> = found.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![near_early.id, near_late.id, inbound.id, far.id]);

        let outbound_only = reservoir
            .find_commuters_near(&at(10), 500.0, Some(Direction::Outbound), t0())
            .unwrap();
        assert_eq!(outbound_only.len(), 3);
        assert!(outbound_only.iter().all(|c| c.direction == Direction::Outbound));
    }

    #[test]
    fn test_find_is_idempotent() {
        let reservoir = reservoir(SpawnConfig::default());
        let mut rng = StdRng::seed_from_u64(3);
        for n in 0..40 {
            let from = rng.random_range(0..90);
            let to = rng.random_range(from + 1..=100);
            reservoir.spawn(outbound(from, to, n)).unwrap();
        }
        let first = reservoir.find_commuters_near(&at(45), 2_000.0, None, t0()).unwrap();
        let second = reservoir.find_commuters_near(&at(45), 2_000.0, None, t0()).unwrap();
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn test_grid_prefilter_matches_full_scan() {
        let reservoir = reservoir(SpawnConfig::default());
        for i in 0..100 {
            reservoir.spawn(outbound(i, 100, 0)).unwrap();
        }
        // at most four vertices fit in one cell, so the two-ring disk of a
        // small radius is smaller than the set of occupied segments
        assert!(reservoir.segment_count().unwrap() > 19);
        let small = reservoir.find_commuters_near(&at(50), 120.0, None, t0()).unwrap();
        let all = reservoir.find_commuters_near(&at(50), 50_000.0, None, t0()).unwrap();
        let expected: Vec<CommuterId> = all
            .iter()
            .filter(|c| c.distance_to_m(&at(50)) <= 120.0)
            .map(|c| c.id)
            .collect();
        let actual: Vec<CommuterId> = small.iter().map(|c| c.id).collect();
        assert_eq!(actual, expected);
        assert_eq!(actual.len(), 3);
    }

    #[test]
    fn test_expired_commuter_leaves_results() {
        let reservoir = reservoir(SpawnConfig::default());
        let commuter = reservoir.spawn(outbound(10, 20, 0)).unwrap();
        let found = reservoir.find_commuters_near(&at(10), 100.0, None, t0()).unwrap();
        assert_eq!(found.len(), 1);
        let at_timeout = t0() + TimeDelta::seconds(1800);
        assert_eq!(
            reservoir
                .find_commuters_near(&at(10), 100.0, None, at_timeout)
                .unwrap()
                .len(),
            1
        );

        // overdue commuters are hidden before any expiry pass has run
        let overdue = t0() + TimeDelta::seconds(1801);
        assert!(reservoir
            .find_commuters_near(&at(10), 100.0, None, overdue)
            .unwrap()
            .is_empty());
        assert_eq!(reservoir.statistics().unwrap().waiting, 1);

        let expired = reservoir
            .expire_stale(t0() + TimeDelta::seconds(1801))
            .unwrap();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].id, commuter.id);
        assert_eq!(expired[0].state, CommuterState::Expired);
        assert!(reservoir
            .find_commuters_near(&at(10), 100.0, None, t0())
            .unwrap()
            .is_empty());
        let stats = reservoir.statistics().unwrap();
        assert_eq!((stats.spawned, stats.expired, stats.waiting), (1, 1, 0));
        assert_eq!(reservoir.segment_count().unwrap(), 0);
    }

    #[test]
    fn test_sampled_trips_on_sparse_route() {
        let sparse = OrderedRoute::new(vec![at(0), at(20)]).unwrap();
        let index = Arc::new(DistanceIndex::new(sparse));
        let store = SpawnConfigStore::new(SpawnConfig::default(), HashMap::new()).unwrap();
        let reservoir =
            RouteReservoir::new("r2", index.clone(), 9, Arc::new(store), EventBus::new(64)).unwrap();
        let total = index.total_length_m();

        // both points snap to the first vertex without the sampled distances
        let (from, to) = (total * 0.1, total * 0.4);
        let snapped = SpawnRequest::new(
            index.point_at_distance(from),
            index.point_at_distance(to),
            Direction::Outbound,
            t0(),
        );
        assert!(matches!(
            reservoir.spawn(snapped.clone()),
            Err(ReservoirError::InvalidDestination(_, _))
        ));

        let commuter = reservoir.spawn(snapped.with_along_route(from, to)).unwrap();
        assert!((commuter.trip_length_m.unwrap() - (to - from)).abs() < 1e-9);
        let inbound = SpawnRequest::new(
            index.point_at_distance(to),
            index.point_at_distance(from),
            Direction::Inbound,
            t0(),
        )
        .with_along_route(to, from);
        assert!(reservoir.spawn(inbound).is_ok());

        let outside = SpawnRequest::new(at(0), at(20), Direction::Outbound, t0())
            .with_along_route(0.0, total + 100.0);
        assert!(matches!(
            reservoir.spawn(outside),
            Err(ReservoirError::InvalidDestination(_, _))
        ));
        assert_eq!(reservoir.statistics().unwrap().spawned, 2);
    }

    #[test]
    fn test_unrepresentable_expiry_leaves_reservoir_usable() {
        let reservoir = reservoir(SpawnConfig::default());
        let mut request = outbound(10, 20, 0);
        request.now = DateTime::<Utc>::MAX_UTC;
        assert!(matches!(
            reservoir.spawn(request),
            Err(ReservoirError::InvalidTime(_, _))
        ));
        let stats = reservoir.statistics().unwrap();
        assert_eq!((stats.spawned, stats.dropped, stats.waiting), (0, 0, 0));
        assert!(reservoir.spawn(outbound(10, 20, 0)).is_ok());
    }

    #[test]
    fn test_counters_stay_consistent() {
        let config = SpawnConfig {
            max_waiting: 25,
            expiry_timeout_seconds: 120,
            ..Default::default()
        };
        let reservoir = reservoir(config);
        let mut rng = StdRng::seed_from_u64(11);
        let mut now = t0();
        let mut known = vec![];
        for _ in 0..500 {
            now += TimeDelta::seconds(rng.random_range(0..20));
            match rng.random_range(0..4) {
                0 | 1 => {
                    let from = rng.random_range(0..99);
                    let request = outbound(from, 100, 0);
                    let request = SpawnRequest { now, ..request };
                    if let Ok(c) = reservoir.spawn(request) {
                        known.push(c.id);
                    }
                }
                2 => {
                    if !known.is_empty() {
                        let id = known[rng.random_range(0..known.len())];
                        reservoir.board(id, "bus-7", now).unwrap();
                    }
                }
                _ => {
                    reservoir.expire_stale(now).unwrap();
                }
            }
            let stats = reservoir.statistics().unwrap();
            assert!(stats.is_consistent(), "{stats:?}");
            assert!(stats.waiting <= 25);
        }
    }
}
