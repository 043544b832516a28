use std::collections::BTreeSet;

use geom::{Distance, PolyLine, Polygon};
use lanelet_map::{Lanelet, LaneletID, LaneletMap};

use crate::path::find_lane_ids_interval;
use crate::stop_lines::{get_first_point_inside_polygon, get_first_point_inside_polygons};
use crate::{InterpolatedPathInfo, PathWithLaneId};

/// Lanelets synthesized from the path sample it this often.
const PATH_LANELET_INTERVAL: Distance = Distance::const_meters(1.5);

/// The lanelets the ego vehicle drives through around the intersection. Everything except
/// `prev` is synthesized from the path itself.
#[derive(Clone, Debug)]
pub struct PathLanelets {
    /// Map lanelets on the path before the intersection.
    pub prev: Vec<Lanelet>,
    /// From the start of the intersection lane to the ego vehicle, if it's already inside.
    pub entry2ego: Option<Lanelet>,
    /// From the ego vehicle, or the start of the intersection lane if it's not there yet, to
    /// the end of the intersection lane.
    pub ego_or_entry2exit: Lanelet,
    /// The lane after the intersection. `None` when the path ends inside the intersection.
    pub next: Option<Lanelet>,
    /// Everything above, in order.
    pub all: Vec<Lanelet>,
    /// Where the path overlaps attention or conflicting areas, then whatever remains of the
    /// intersection lane.
    pub conflicting_interval_and_remaining: Vec<Lanelet>,
}

/// Builds the lanelets along the path. Returns `None` if the path never enters a conflicting
/// area.
#[allow(clippy::too_many_arguments)]
pub fn generate_path_lanelets(
    map: &LaneletMap,
    lanelets_on_path: &[LaneletID],
    path_info: &InterpolatedPathInfo,
    first_conflicting_area: &Polygon,
    conflicting_areas: &[Polygon],
    first_attention_area: Option<&Polygon>,
    attention_areas: &[Polygon],
    closest_idx: usize,
    width: Distance,
) -> Option<PathLanelets> {
    let path = &path_info.path;
    let (lane_start, lane_end) = path_info.lane_id_interval;

    let prev = prev_lanelets(map, lanelets_on_path, &path_info.associative_lane_ids);
    let mut all = prev.clone();

    let entry2ego = if closest_idx > lane_start {
        generate_path_lanelet(path_info, lane_start, closest_idx, width)
    } else {
        None
    };
    all.extend(entry2ego.clone());

    let ego_or_entry2exit =
        generate_path_lanelet(path_info, closest_idx.max(lane_start), lane_end, width)?;
    all.push(ego_or_entry2exit.clone());

    let mut next = None;
    if lane_end < path.len() - 1 {
        if let Some(next_id) = path.points[lane_end].lane_ids.first() {
            let ids: BTreeSet<LaneletID> = vec![*next_id].into_iter().collect();
            if let Some((start, end)) = find_lane_ids_interval(path, &ids) {
                next = generate_path_lanelet(path_info, start, end, width);
            }
        }
    }
    all.extend(next.clone());

    let interval = path_info.lane_id_interval;
    let (first_inside, last_inside) = match first_attention_area {
        Some(area) => (
            get_first_point_inside_polygon(path, interval, area, true)?,
            get_first_point_inside_polygons(path, interval, attention_areas, false)?.0,
        ),
        None => (
            get_first_point_inside_polygon(path, interval, first_conflicting_area, true)?,
            get_first_point_inside_polygons(path, interval, conflicting_areas, false)?.0,
        ),
    };
    // A single point inside still needs a segment to build a lanelet from
    let last_inside = if first_inside == last_inside && last_inside < lane_end {
        last_inside + 1
    } else {
        last_inside
    };
    let mut conflicting_interval_and_remaining =
        vec![generate_path_lanelet(path_info, first_inside, last_inside, width)?];
    if last_inside < lane_end {
        conflicting_interval_and_remaining.extend(generate_path_lanelet(
            path_info,
            last_inside,
            lane_end,
            width,
        ));
    }

    Some(PathLanelets {
        prev,
        entry2ego,
        ego_or_entry2exit,
        next,
        all,
        conflicting_interval_and_remaining,
    })
}

// Map lanelets on the path, up to the first associative one
fn prev_lanelets(
    map: &LaneletMap,
    lanelets_on_path: &[LaneletID],
    associative_ids: &BTreeSet<LaneletID>,
) -> Vec<Lanelet> {
    lanelets_on_path
        .iter()
        .take_while(|id| !associative_ids.contains(id))
        .filter_map(|id| map.maybe_get_l(*id).cloned())
        .collect()
}

/// A lanelet `width` wide following the path from `start` to `end`, sampled every 1.5m. The
/// result has the intersection lanelet's id. `None` if the range is too short.
pub fn generate_path_lanelet(
    path_info: &InterpolatedPathInfo,
    start: usize,
    end: usize,
    width: Distance,
) -> Option<Lanelet> {
    let path: &PathWithLaneId = &path_info.path;
    if start >= end || end >= path.len() {
        return None;
    }
    let mut center = Vec::new();
    let mut since_last = Distance::ZERO;
    for idx in start..=end {
        if idx > start {
            since_last += path.points[idx - 1].pos().dist_to(path.points[idx].pos());
        }
        if idx == start || idx == end || since_last >= PATH_LANELET_INTERVAL {
            center.push(path.points[idx].pos());
            since_last = Distance::ZERO;
        }
    }
    let center = PolyLine::deduping_new(center).ok()?;
    let left = center.shift_left(width / 2.0).ok()?;
    let right = center.shift_right(width / 2.0).ok()?;
    Lanelet::new(path_info.lane_id, left, right).ok()
}
