use std::collections::BTreeSet;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use geom::{Distance, PolyLine, Pose, Pt2D, Speed};
use lanelet_map::LaneletID;

/// One point of the planned path, tagged with the lanelets it belongs to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathPointWithLaneId {
    pub pose: Pose,
    /// The commanded longitudinal velocity at this point.
    pub velocity: Speed,
    pub lane_ids: Vec<LaneletID>,
}

impl PathPointWithLaneId {
    pub fn new(pose: Pose, velocity: Speed, lane_ids: Vec<LaneletID>) -> PathPointWithLaneId {
        PathPointWithLaneId {
            pose,
            velocity,
            lane_ids,
        }
    }

    pub fn pos(&self) -> Pt2D {
        self.pose.pos
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct PathWithLaneId {
    pub points: Vec<PathPointWithLaneId>,
}

impl PathWithLaneId {
    pub fn new(points: Vec<PathPointWithLaneId>) -> PathWithLaneId {
        PathWithLaneId { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The distance along the path of every point, starting from 0.
    pub fn arc_lengths(&self) -> Vec<Distance> {
        let mut result = Vec::with_capacity(self.points.len());
        let mut so_far = Distance::ZERO;
        for (idx, pt) in self.points.iter().enumerate() {
            if idx > 0 {
                so_far += self.points[idx - 1].pos().dist_to(pt.pos());
            }
            result.push(so_far);
        }
        result
    }

    /// Distance along the path between two points, negative if `to` is behind `from`.
    pub fn signed_arc_length(&self, from: usize, to: usize) -> Distance {
        let (lo, hi) = (from.min(to), from.max(to));
        let dist: Distance = self.points[lo..=hi]
            .windows(2)
            .map(|pair| pair[0].pos().dist_to(pair[1].pos()))
            .sum();
        if from <= to {
            dist
        } else {
            -dist
        }
    }

    /// The index of the point closest to `pt`.
    pub fn find_nearest_index(&self, pt: Pt2D) -> Option<usize> {
        self.points
            .iter()
            .enumerate()
            .min_by_key(|(_, p)| p.pos().dist_to(pt))
            .map(|(idx, _)| idx)
    }

    /// The lanelets the path passes through, in order of first appearance.
    pub fn lane_id_sequence(&self) -> Vec<LaneletID> {
        let mut result: Vec<LaneletID> = Vec::new();
        for id in self.points.iter().flat_map(|pt| pt.lane_ids.iter()) {
            if !result.contains(id) {
                result.push(*id);
            }
        }
        result
    }

    pub fn to_polyline(&self) -> Result<PolyLine> {
        PolyLine::deduping_new(self.points.iter().map(|p| p.pos()).collect())
    }
}

pub fn has_lane_ids(pt: &PathPointWithLaneId, ids: &BTreeSet<LaneletID>) -> bool {
    pt.lane_ids.iter().any(|id| ids.contains(id))
}

/// Finds the first contiguous run of points tagged with any of `ids`. The result is widened to
/// include the point just before the run (if any) and the first point after it (or the last
/// point of the path). A later re-entry is ignored. Returns `None` if no point matches, or if
/// the run collapses to a single index.
pub fn find_lane_ids_interval(
    path: &PathWithLaneId,
    ids: &BTreeSet<LaneletID>,
) -> Option<(usize, usize)> {
    let mut start = None;
    let mut end = path.len().checked_sub(1)?;
    for (idx, pt) in path.points.iter().enumerate() {
        if has_lane_ids(pt, ids) {
            if start.is_none() {
                start = Some(idx);
            }
        } else if start.is_some() {
            end = idx;
            break;
        }
    }
    let start = start?.saturating_sub(1);
    if start < end {
        Some((start, end))
    } else {
        None
    }
}
