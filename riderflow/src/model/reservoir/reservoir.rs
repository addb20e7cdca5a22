use super::{ReservoirError, ReservoirId, ReservoirStatistics, SpawnRequest};
use crate::model::commuter::{Commuter, CommuterId, Direction};
use chrono::{DateTime, Utc};
use geo::Coord;

/// a pool of waiting and riding commuters for one depot or one route.
///
/// every mutating operation holds the reservoir lock only for its critical
/// section and publishes lifecycle events after releasing it. expiry is
/// evaluated lazily by [`Reservoir::expire_stale`] and by [`Reservoir::board`]
/// and filtered out of queries by [`Reservoir::find_commuters_near`], rather
/// than with per-commuter timers.
pub trait Reservoir: Send + Sync {
    fn id(&self) -> &ReservoirId;

    /// creates and inserts a waiting commuter. a reservoir at its configured
    /// maximum waiting count rejects the spawn and counts it as dropped.
    fn spawn(&self, request: SpawnRequest) -> Result<Commuter, ReservoirError>;

    /// waiting commuters within `radius_m` of `position`, sorted by distance,
    /// then by spawn time, then by id. commuters already overdue at `now` are
    /// left out. does not modify the reservoir.
    fn find_commuters_near(
        &self,
        position: &Coord<f64>,
        radius_m: f64,
        direction: Option<Direction>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Commuter>, ReservoirError>;

    /// boards a waiting commuter onto a vehicle. returns false when the
    /// commuter is no longer waiting here, including when it turned out to
    /// be overdue, in which case it is expired instead.
    fn board(
        &self,
        commuter_id: CommuterId,
        vehicle_id: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, ReservoirError>;

    /// expires every waiting commuter older than its expiry timeout,
    /// returning the expired commuters
    fn expire_stale(&self, now: DateTime<Utc>) -> Result<Vec<Commuter>, ReservoirError>;

    /// moves the onboard commuters of a vehicle and alights those within the
    /// alight threshold of their destination, returning the alighted commuters
    fn update_vehicle_position(
        &self,
        vehicle_id: &str,
        position: &Coord<f64>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Commuter>, ReservoirError>;

    fn statistics(&self) -> Result<ReservoirStatistics, ReservoirError>;
}
