use super::{
    commuter_ledger::CommuterLedger, reservoir_ops, Reservoir, ReservoirError, ReservoirId,
    ReservoirStatistics, SpawnRequest,
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
use riderflow_route::index::DistanceIndex;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct DepotState {
    waiting: Vec<Commuter>,
    ledger: CommuterLedger,
}

/// a fixed terminal with a single outbound waiting list. commuters wait at
/// the depot location regardless of the position of the spawn request.
pub struct DepotReservoir {
    id: ReservoirId,
    location: Coord<f64>,
    index: Option<Arc<DistanceIndex>>,
    configs: Arc<SpawnConfigStore>,
    bus: EventBus,
    state: Mutex<DepotState>,
}

impl DepotReservoir {
    /// a depot at `location`. when the distance index of the served route is
    /// given, destinations must lie ahead of the depot along that route.
    pub fn new(
        id: &str,
        location: Coord<f64>,
        index: Option<Arc<DistanceIndex>>,
        configs: Arc<SpawnConfigStore>,
        bus: EventBus,
    ) -> Result<DepotReservoir, ReservoirError> {
        let id = ReservoirId::Depot(id.to_string());
        reservoir_ops::validate_position(&id, &location, "depot location")?;
        Ok(DepotReservoir {
            id,
            location,
            index,
            configs,
            bus,
            state: Mutex::new(DepotState::default()),
        })
    }

    pub fn location(&self) -> &Coord<f64> {
        &self.location
    }

    /// along-route trip length from the depot, checking that the
    /// destination lies ahead of it
    fn trip_length(&self, request: &SpawnRequest) -> Result<Option<f64>, ReservoirError> {
        let index = match &self.index {
            Some(index) => index,
            None => return Ok(None),
        };
        let (origin, destination) =
            reservoir_ops::along_route(&self.id, index, &self.location, request)?;
        if destination <= origin {
            return Err(ReservoirError::InvalidDestination(
                self.id.to_string(),
                format!(
                    "destination ({}, {}) is not ahead of the depot along the route",
                    request.destination.x, request.destination.y
                ),
            ));
        }
        Ok(Some(destination - origin))
    }
}

impl Reservoir for DepotReservoir {
    fn id(&self) -> &ReservoirId {
        &self.id
    }

    fn spawn(&self, request: SpawnRequest) -> Result<Commuter, ReservoirError> {
        reservoir_ops::validate_position(&self.id, &request.destination, "destination")?;
        if request.direction != Direction::Outbound {
            return Err(ReservoirError::InvalidDestination(
                self.id.to_string(),
                String::from("depot commuters only travel outbound"),
            ));
        }
        let trip_length_m = self.trip_length(&request)?;
        let config = self.configs.get(self.id.key());
        let expires_at = reservoir_ops::expires_at(&self.id, &config, &request.now)?;

        let admitted = {
            let mut state = reservoir_ops::lock(&self.state, &self.id)?;
            if state.waiting.len() >= config.max_waiting {
                state.ledger.record_drop();
                None
            } else {
                let commuter = Commuter {
                    id: CommuterId::next(),
                    position: self.location,
                    destination: request.destination,
                    owner: self.id.clone(),
                    direction: Direction::Outbound,
                    priority: request.priority,
                    spawned_at: request.now,
                    expires_at,
                    state: CommuterState::WaitingToBoard,
                    vehicle_id: None,
                    trip_length_m,
                };
                state.waiting.push(commuter.clone());
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
                    .publish(LifecycleEvent::dropped(&self.id, self.location, request.now));
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
        let mut candidates = vec![];
        {
            let state = reservoir_ops::lock(&self.state, &self.id)?;
            reservoir_ops::collect_near(
                &state.waiting,
                position,
                radius_m,
                direction,
                &now,
                &mut candidates,
            );
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
            let index = match state.waiting.iter().position(|c| c.id == commuter_id) {
                Some(index) => index,
                None => return Ok(false),
            };
            let commuter = state.waiting.remove(index);
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
            let mut expired = reservoir_ops::take_overdue(&mut state.waiting, &now);
            state.ledger.record_expired(&mut expired);
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
        Ok(state.ledger.statistics(state.waiting.len()))
    }
}
