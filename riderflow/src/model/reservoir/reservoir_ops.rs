use super::{ReservoirError, ReservoirId, SpawnRequest};
use crate::{
    config::SpawnConfig,
    model::commuter::{Commuter, Direction},
};
use chrono::{DateTime, Utc};
use geo::Coord;
use riderflow_route::{index::DistanceIndex, util::geo_ops};
use std::sync::{Mutex, MutexGuard};

/// acquires a reservoir lock, reporting poisoning as an error
pub fn lock<'a, T>(
    mutex: &'a Mutex<T>,
    id: &ReservoirId,
) -> Result<MutexGuard<'a, T>, ReservoirError> {
    mutex
        .lock()
        .map_err(|_| ReservoirError::LockPoisoned(id.to_string()))
}

pub fn validate_position(
    id: &ReservoirId,
    coord: &Coord<f64>,
    name: &str,
) -> Result<(), ReservoirError> {
    if geo_ops::is_valid_wgs84(coord) {
        Ok(())
    } else {
        Err(ReservoirError::InvalidPosition(
            id.to_string(),
            format!("{name} ({}, {}) is not a valid WGS84 coordinate", coord.x, coord.y),
        ))
    }
}

pub fn validate_radius(id: &ReservoirId, radius_m: f64) -> Result<(), ReservoirError> {
    if radius_m.is_finite() && radius_m >= 0.0 {
        Ok(())
    } else {
        Err(ReservoirError::InvalidPosition(
            id.to_string(),
            format!("search radius {radius_m} must be finite and non-negative"),
        ))
    }
}

/// along-route positions of a trip starting at `origin`. sampled distances
/// carried by the request are used as given after a range check, otherwise
/// both points are placed at their nearest route vertex.
pub fn along_route(
    id: &ReservoirId,
    index: &DistanceIndex,
    origin: &Coord<f64>,
    request: &SpawnRequest,
) -> Result<(f64, f64), ReservoirError> {
    match request.along_route_m {
        Some((from, to)) => {
            let total = index.total_length_m();
            let in_range = |d: f64| d.is_finite() && (0.0..=total).contains(&d);
            if in_range(from) && in_range(to) {
                Ok((from, to))
            } else {
                Err(ReservoirError::InvalidDestination(
                    id.to_string(),
                    format!("along-route trip {from}m to {to}m is outside the route of {total:.1}m"),
                ))
            }
        }
        None => Ok((
            index.distance_along_coord(origin),
            index.distance_along_coord(&request.destination),
        )),
    }
}

/// expiry time of a commuter spawned at `now` under a spawn configuration
pub fn expires_at(
    id: &ReservoirId,
    config: &SpawnConfig,
    now: &DateTime<Utc>,
) -> Result<DateTime<Utc>, ReservoirError> {
    config.expires_at(now).ok_or_else(|| {
        ReservoirError::InvalidTime(
            id.to_string(),
            format!(
                "expiry timeout of {}s from {now} is out of range",
                config.expiry_timeout_seconds
            ),
        )
    })
}

/// removes and returns the overdue commuters of a waiting list
pub fn take_overdue(waiting: &mut Vec<Commuter>, now: &DateTime<Utc>) -> Vec<Commuter> {
    if !waiting.iter().any(|c| c.is_overdue(now)) {
        return vec![];
    }
    let (overdue, remaining): (Vec<Commuter>, Vec<Commuter>) =
        std::mem::take(waiting).into_iter().partition(|c| c.is_overdue(now));
    *waiting = remaining;
    overdue
}

pub fn remove_by_id(waiting: &mut Vec<Commuter>, commuter: &Commuter) -> Option<Commuter> {
    let position = waiting.iter().position(|c| c.id == commuter.id)?;
    Some(waiting.remove(position))
}

/// appends copies of the commuters within `radius_m` of `position` that are
/// not overdue at `now`, paired with their distance
pub fn collect_near(
    waiting: &[Commuter],
    position: &Coord<f64>,
    radius_m: f64,
    direction: Option<Direction>,
    now: &DateTime<Utc>,
    out: &mut Vec<(f64, Commuter)>,
) {
    for commuter in waiting.iter() {
        if direction.is_some_and(|d| d != commuter.direction) || commuter.is_overdue(now) {
            continue;
        }
        let distance = commuter.distance_to_m(position);
        if distance <= radius_m {
            out.push((distance, commuter.clone()));
        }
    }
}

/// orders candidates by distance, then spawn time, then id
pub fn sort_by_proximity(mut candidates: Vec<(f64, Commuter)>) -> Vec<Commuter> {
    candidates.sort_by(|(da, a), (db, b)| {
        da.total_cmp(db)
            .then_with(|| a.spawned_at.cmp(&b.spawned_at))
            .then_with(|| a.id.cmp(&b.id))
    });
    candidates.into_iter().map(|(_, c)| c).collect()
}
