use serde::{Deserialize, Serialize};

use geom::{Distance, Line, PolyLine, Polygon, Pose};

use crate::{IntersectionConfig, InterpolatedPathInfo, PathWithLaneId};

/// Candidate places to stop, as indices into the interpolated path. When present, they're
/// ordered `stuck <= default <= first_attention <= occlusion_peeking`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntersectionStopLines {
    /// Closest to the ego vehicle right now.
    pub closest_idx: usize,
    /// Where to wait if a vehicle is stuck past the intersection. Absent if the path never
    /// enters the first conflicting area.
    pub stuck_stop_line: Option<usize>,
    /// Where to stop for conflicting traffic, from the map's stop line or else the first
    /// conflicting area. Absent if it'd be behind the start of the path.
    pub default_stop_line: Option<usize>,
    /// Just before the first attention area. Absent if it'd be behind the start of the path.
    pub first_attention_stop_line: Option<usize>,
    /// A little bit into the first attention area, to see past occlusions. Absent if the path
    /// already starts inside the attention area.
    pub occlusion_peeking_stop_line: Option<usize>,
    /// The decision to stop must be committed before reaching this index.
    pub pass_judge_line: usize,
}

/// The first index within `interval` (inclusive) whose point is inside `polygon`, searching
/// from either end.
pub fn get_first_point_inside_polygon(
    path: &PathWithLaneId,
    interval: (usize, usize),
    polygon: &Polygon,
    search_forward: bool,
) -> Option<usize> {
    interval_indices(path, interval, search_forward)
        .find(|idx| polygon.contains_pt(path.points[*idx].pos()))
}

/// Like `get_first_point_inside_polygon`, but checks many polygons at each index. Returns the
/// path index and which polygon contains it.
pub fn get_first_point_inside_polygons(
    path: &PathWithLaneId,
    interval: (usize, usize),
    polygons: &[Polygon],
    search_forward: bool,
) -> Option<(usize, usize)> {
    for idx in interval_indices(path, interval, search_forward) {
        let pt = path.points[idx].pos();
        if let Some(poly_idx) = polygons.iter().position(|p| p.contains_pt(pt)) {
            return Some((idx, poly_idx));
        }
    }
    None
}

fn interval_indices(
    path: &PathWithLaneId,
    interval: (usize, usize),
    search_forward: bool,
) -> Box<dyn Iterator<Item = usize>> {
    let last = interval.1.min(path.len().saturating_sub(1));
    let range = interval.0..last + 1;
    if path.is_empty() {
        Box::new(std::iter::empty())
    } else if search_forward {
        Box::new(range)
    } else {
        Box::new(range.rev())
    }
}

/// Where to wait when a vehicle is stuck inside or just past the intersection. With
/// `use_stuck_stopline`, that's the start of the intersection lane. Otherwise it's before the
/// first conflicting area, leaving `margin` plus room for the front of the vehicle. Returns
/// `None` if the path never enters the area.
pub fn generate_stuck_stop_line(
    first_conflicting_area: &Polygon,
    path_info: &InterpolatedPathInfo,
    margin: Distance,
    base_link_to_front: Distance,
    use_stuck_stopline: bool,
) -> Option<usize> {
    let entry = get_first_point_inside_polygon(
        &path_info.path,
        path_info.lane_id_interval,
        first_conflicting_area,
        true,
    )?;
    if use_stuck_stopline {
        return Some(path_info.lane_id_interval.0);
    }
    Some(entry.saturating_sub(
        path_info.ceil_steps(margin) + path_info.ceil_steps(base_link_to_front),
    ))
}

/// Computes every candidate stop line. Offsets that move a line earlier round up, and offsets
/// moving it later round down, so rounding never makes a stop less conservative.
pub fn generate_intersection_stop_lines(
    first_conflicting_area: Option<&Polygon>,
    first_attention_area: Option<&Polygon>,
    map_stop_line: Option<usize>,
    path_info: &InterpolatedPathInfo,
    closest_idx: usize,
    cfg: &IntersectionConfig,
) -> IntersectionStopLines {
    let path = &path_info.path;
    let interval = path_info.lane_id_interval;
    let margin = cfg.common.stop_line_margin;
    let base_link_to_front = cfg.vehicle.base_link_to_front;
    let margin_steps = path_info.ceil_steps(margin);
    let front_steps = path_info.ceil_steps(base_link_to_front);

    let conflicting_entry =
        first_conflicting_area.and_then(|a| get_first_point_inside_polygon(path, interval, a, true));
    let attention_entry =
        first_attention_area.and_then(|a| get_first_point_inside_polygon(path, interval, a, true));

    let first_attention = attention_entry.and_then(|idx| idx.checked_sub(margin_steps));

    let stuck = first_conflicting_area
        .and_then(|a| {
            generate_stuck_stop_line(
                a,
                path_info,
                margin,
                base_link_to_front,
                cfg.common.use_stuck_stopline,
            )
        })
        .map(|idx| match first_attention.or(attention_entry) {
            Some(limit) => idx.min(limit),
            None => idx,
        });

    let default = map_stop_line
        .and_then(|idx| idx.checked_sub(front_steps))
        .filter(|idx| stuck.map(|s| *idx >= s).unwrap_or(true))
        .or_else(|| conflicting_entry.and_then(|idx| idx.checked_sub(margin_steps + front_steps)))
        .map(|idx| {
            let idx = stuck.map(|s| idx.max(s)).unwrap_or(idx);
            first_attention.map(|f| idx.min(f)).unwrap_or(idx)
        });

    let occlusion_peeking = match (first_attention_area, attention_entry) {
        (Some(area), Some(entry)) if !area.contains_pt(path.points[interval.0].pos()) => {
            // The far boundary exists, since the entry is inside
            let far = get_first_point_inside_polygon(path, interval, area, false).unwrap_or(entry);
            Some((entry + path_info.floor_steps(cfg.occlusion.peeking_offset)).min(far))
        }
        _ => None,
    };

    let pass_judge_line = match (stuck, first_attention) {
        (Some(s), Some(f)) => s.min(f),
        (Some(s), None) => s,
        (None, Some(f)) => f,
        (None, None) => 0,
    };

    let result = IntersectionStopLines {
        closest_idx,
        stuck_stop_line: stuck,
        default_stop_line: default,
        first_attention_stop_line: first_attention,
        occlusion_peeking_stop_line: occlusion_peeking,
        pass_judge_line,
    };
    debug!("Stop lines for {}: {:?}", path_info.lane_id, result);
    result
}

/// The first segment in the lane interval crossing the map's stop line, as the index of the
/// segment's start.
pub fn stop_line_index_from_map(
    path_info: &InterpolatedPathInfo,
    stop_line: &PolyLine,
) -> Option<usize> {
    let (first, last) = path_info.lane_id_interval;
    let pts = &path_info.path.points;
    (first..last.min(pts.len().saturating_sub(1))).find(|idx| {
        Line::new(pts[*idx].pos(), pts[idx + 1].pos())
            .map(|segment| stop_line.lines().any(|l| l.intersects(&segment)))
            .unwrap_or(false)
    })
}

/// Has the ego vehicle passed `target_idx`? When it's closest to the target itself, compare
/// the poses.
pub fn is_over_target_index(
    path: &PathWithLaneId,
    closest_idx: usize,
    current_pose: &Pose,
    target_idx: usize,
) -> bool {
    if closest_idx == target_idx {
        return path.points[target_idx].pose.is_behind(current_pose);
    }
    closest_idx > target_idx
}

/// Is the ego vehicle still before `target_idx`? When it's closest to the target itself,
/// compare the poses.
pub fn is_before_target_index(
    path: &PathWithLaneId,
    closest_idx: usize,
    current_pose: &Pose,
    target_idx: usize,
) -> bool {
    if closest_idx == target_idx {
        return current_pose.is_behind(&path.points[target_idx].pose);
    }
    closest_idx < target_idx
}
