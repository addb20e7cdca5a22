use crate::model::{RouteError, RouteNodeKey, RouteShape};
use crate::util::geo_ops;
use geo::Coord;
use itertools::Itertools;
use kdam::tqdm;

/// the gap left where two consecutive shapes were joined by the stitcher
#[derive(Debug, Clone, PartialEq)]
pub struct StitchJoin {
    /// index in the stitched point sequence of the first point after the gap
    pub point_index: usize,
    pub from: Coord<f64>,
    pub to: Coord<f64>,
    pub gap_m: f64,
}

/// backbone found by the greedy nearest-neighbor stitching strategy
#[derive(Debug, Clone)]
pub struct StitchedRoute {
    pub points: Vec<Coord<f64>>,
    pub joins: Vec<StitchJoin>,
    pub length_m: f64,
    /// index into the candidate ordering of the shape the stitch started from
    pub start_shape: usize,
}

/// assembles pre-grouped, order-annotated shapes into a single polyline.
///
/// each usable shape is tried as the starting shape. from there, the unused
/// shape whose start or end point is nearest to the current path end is
/// appended, reversed if its end is nearer. the starting choice with the
/// minimum total assembled length (including the gaps it jumps) is kept.
/// candidates are considered in (order, name) annotation order, which also
/// breaks ties.
pub fn greedy_stitch(shapes: &[RouteShape]) -> Result<StitchedRoute, RouteError> {
    let segments = shapes
        .iter()
        .enumerate()
        .sorted_by(|(ia, a), (ib, b)| {
            a.order
                .cmp(&b.order)
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| ia.cmp(ib))
        })
        .map(|(_, s)| s.rounded_coords())
        .filter(|c| c.len() >= 2)
        .collect_vec();
    if segments.is_empty() {
        return Err(RouteError::EmptyGeometry);
    }

    let mut best: Option<StitchedRoute> = None;
    let iter = tqdm!(
        0..segments.len(),
        total = segments.len(),
        desc = "greedy stitching - start candidates"
    );
    for start in iter {
        let candidate = stitch_from(start, &segments);
        let replace = match &best {
            None => true,
            Some(b) => candidate.length_m < b.length_m,
        };
        if replace {
            best = Some(candidate);
        }
    }
    let stitched = best.ok_or(RouteError::EmptyGeometry)?;
    log::debug!(
        "greedy stitching kept start shape {} with length {:.1} meters and {} joins",
        stitched.start_shape,
        stitched.length_m,
        stitched.joins.len()
    );
    Ok(stitched)
}

fn stitch_from(start: usize, segments: &[Vec<Coord<f64>>]) -> StitchedRoute {
    let mut used = vec![false; segments.len()];
    used[start] = true;
    let mut points = segments[start].clone();
    let mut joins = vec![];

    while let Some(end) = points.last().copied() {
        let next = match nearest_unused(&end, segments, &used) {
            Some(n) => n,
            None => break,
        };
        let (index, reverse, gap_m) = next;
        used[index] = true;
        let mut coords = segments[index].clone();
        if reverse {
            coords.reverse();
        }
        if RouteNodeKey::from_coord(&coords[0]) == RouteNodeKey::from_coord(&end) {
            coords.remove(0);
        } else {
            joins.push(StitchJoin {
                point_index: points.len(),
                from: end,
                to: coords[0],
                gap_m,
            });
        }
        points.extend(coords);
    }

    let length_m = geo_ops::polyline_length_m(&points);
    StitchedRoute {
        points,
        joins,
        length_m,
        start_shape: start,
    }
}

/// finds the unused segment nearest to a path end.
///
/// # Returns
///
/// (segment index, whether it must be reversed, gap in meters) or None if all are used
fn nearest_unused(
    end: &Coord<f64>,
    segments: &[Vec<Coord<f64>>],
    used: &[bool],
) -> Option<(usize, bool, f64)> {
    let mut best: Option<(usize, bool, f64)> = None;
    for (idx, seg) in segments.iter().enumerate() {
        if used[idx] {
            continue;
        }
        let (first, last) = match (seg.first(), seg.last()) {
            (Some(f), Some(l)) => (f, l),
            _ => continue,
        };
        let d_start = geo_ops::haversine_m(end, first);
        let d_end = geo_ops::haversine_m(end, last);
        let (reverse, gap) = if d_end < d_start {
            (true, d_end)
        } else {
            (false, d_start)
        };
        let replace = match best {
            None => true,
            Some((_, _, best_gap)) => gap < best_gap,
        };
        if replace {
            best = Some((idx, reverse, gap));
        }
    }
    best
}
