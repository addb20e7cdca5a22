use super::reservoir_ops;
use crate::model::commuter::{Commuter, Direction};
use chrono::{DateTime, Utc};
use h3o::CellIndex;

/// waiting commuters of one h3 cell along a route, split by direction
#[derive(Debug, Clone)]
pub struct RouteSegment {
    pub cell: CellIndex,
    pub inbound: Vec<Commuter>,
    pub outbound: Vec<Commuter>,
}

impl RouteSegment {
    pub fn new(cell: CellIndex) -> RouteSegment {
        RouteSegment {
            cell,
            inbound: vec![],
            outbound: vec![],
        }
    }

    pub fn lane(&self, direction: Direction) -> &Vec<Commuter> {
        match direction {
            Direction::Inbound => &self.inbound,
            Direction::Outbound => &self.outbound,
        }
    }

    pub fn lane_mut(&mut self, direction: Direction) -> &mut Vec<Commuter> {
        match direction {
            Direction::Inbound => &mut self.inbound,
            Direction::Outbound => &mut self.outbound,
        }
    }

    pub fn len(&self) -> usize {
        self.inbound.len() + self.outbound.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inbound.is_empty() && self.outbound.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Commuter> {
        self.inbound.iter().chain(self.outbound.iter())
    }

    pub fn take_overdue(&mut self, now: &DateTime<Utc>) -> Vec<Commuter> {
        let mut overdue = reservoir_ops::take_overdue(&mut self.inbound, now);
        overdue.extend(reservoir_ops::take_overdue(&mut self.outbound, now));
        overdue
    }
}
