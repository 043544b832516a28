use std::collections::BTreeSet;

use anyhow::Result;

use geom::{Distance, Pose, EPSILON_DIST};
use lanelet_map::LaneletID;

use crate::path::{find_lane_ids_interval, PathPointWithLaneId, PathWithLaneId};

/// The path resampled at a fixed step, along with where it passes through the intersection
/// lane. Every index computed by the planner refers to this path, not the raw input.
#[derive(Clone, Debug)]
pub struct InterpolatedPathInfo {
    pub path: PathWithLaneId,
    pub ds: Distance,
    /// The intersection lanelet assigned to this module.
    pub lane_id: LaneletID,
    /// Lanelets treated the same as `lane_id`, covering lane changes through the same
    /// intersection.
    pub associative_lane_ids: BTreeSet<LaneletID>,
    /// `[first, last]` indices covering the contiguous run of associative lanelets, including
    /// the point before and the point after the run. `first < last` always holds.
    pub lane_id_interval: (usize, usize),
}

impl InterpolatedPathInfo {
    /// How many points cover `dist`, rounding up. Used for offsets that move a stop line
    /// earlier.
    pub fn ceil_steps(&self, dist: Distance) -> usize {
        (dist / self.ds).ceil().max(0.0) as usize
    }

    /// How many points cover `dist`, rounding down. Used for offsets that move a stop line
    /// later.
    pub fn floor_steps(&self, dist: Distance) -> usize {
        (dist / self.ds).floor().max(0.0) as usize
    }
}

/// Resamples `path` every `ds` of arc length and finds the interval where it passes through the
/// associative lanelets. Each new point carries the velocity and lane tags of the raw point
/// starting the segment it lands on. Only the final point, copied from the raw path, may be
/// closer than `ds` to its predecessor. Returns `None` if the path never touches the associative
/// lanelets.
pub fn generate_interpolated_path(
    lane_id: LaneletID,
    associative_lane_ids: &BTreeSet<LaneletID>,
    path: &PathWithLaneId,
    ds: Distance,
) -> Result<Option<InterpolatedPathInfo>> {
    if ds <= Distance::ZERO {
        bail!("Can't interpolate a path with step {}", ds);
    }

    // Each raw segment with its starting arc length, skipping repeated points
    let mut segments: Vec<(&PathPointWithLaneId, &PathPointWithLaneId, Distance, Distance)> =
        Vec::new();
    let mut total = Distance::ZERO;
    for pair in path.points.windows(2) {
        let length = pair[0].pos().dist_to(pair[1].pos());
        if length == Distance::ZERO {
            continue;
        }
        segments.push((&pair[0], &pair[1], total, length));
        total += length;
    }

    // Sample the whole path at multiples of ds, so the spacing doesn't restart per segment
    let mut points: Vec<PathPointWithLaneId> = Vec::new();
    let mut seg_idx = 0;
    let mut step = 0;
    loop {
        let dist = ds * (step as f64);
        if dist >= total {
            break;
        }
        while seg_idx + 1 < segments.len() && segments[seg_idx + 1].2 <= dist {
            seg_idx += 1;
        }
        let (from, to, start, length) = segments[seg_idx];
        let pos = from.pos().lerp(to.pos(), (dist - start) / length);
        points.push(PathPointWithLaneId::new(
            Pose::new(pos, from.pos().angle_to(to.pos())),
            from.velocity,
            from.lane_ids.clone(),
        ));
        step += 1;
    }
    if let Some(last) = path.points.last() {
        let mut last = last.clone();
        // The final pose keeps the heading of the segment leading into it
        if let Some(prev) = points.last() {
            last.pose.yaw = prev.pose.yaw;
            if prev.pos().approx_eq(last.pos(), EPSILON_DIST) {
                points.pop();
            }
        }
        points.push(last);
    }

    let path = PathWithLaneId::new(points);
    let lane_id_interval = match find_lane_ids_interval(&path, associative_lane_ids) {
        Some(interval) => interval,
        None => {
            return Ok(None);
        }
    };
    debug!(
        "{} spans path indices {:?} after resampling every {}",
        lane_id, lane_id_interval, ds
    );
    Ok(Some(InterpolatedPathInfo {
        path,
        ds,
        lane_id,
        associative_lane_ids: associative_lane_ids.clone(),
        lane_id_interval,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::tests::straight_path;
    use geom::Pt2D;

    #[test]
    fn resample_keeps_tags() {
        // Raw points every 10m, tagged 1, 2, 2, 3
        let raw = straight_path(10.0, &[1, 2, 2, 3]);
        let ids: BTreeSet<LaneletID> = vec![LaneletID(2)].into_iter().collect();
        let info = generate_interpolated_path(LaneletID(2), &ids, &raw, Distance::meters(1.0))
            .unwrap()
            .unwrap();
        assert_eq!(info.path.len(), 31);
        assert_eq!(info.path.points[9].lane_ids, vec![LaneletID(1)]);
        assert_eq!(info.path.points[10].lane_ids, vec![LaneletID(2)]);
        assert_eq!(info.path.points[29].lane_ids, vec![LaneletID(2)]);
        assert!(info.path.points[30]
            .pos()
            .approx_eq(Pt2D::new(30.0, 0.0), Distance::meters(0.01)));
        // The interval is in resampled indices
        assert_eq!(info.lane_id_interval, (9, 30));
        assert_eq!(info.ceil_steps(Distance::meters(2.5)), 3);
        assert_eq!(info.floor_steps(Distance::meters(2.5)), 2);
    }

    #[test]
    fn spacing_carries_across_segments() {
        // Raw points every 1.5m, so segments aren't a multiple of the step
        let raw = straight_path(1.5, &[1, 1, 1, 2, 2, 2, 3, 3]);
        let ids: BTreeSet<LaneletID> = vec![LaneletID(2)].into_iter().collect();
        let info = generate_interpolated_path(LaneletID(2), &ids, &raw, Distance::meters(1.0))
            .unwrap()
            .unwrap();
        // Samples at x = 0..=10, then the raw endpoint at 10.5
        assert_eq!(info.path.len(), 12);
        let s = info.path.arc_lengths();
        for pair in s[..11].windows(2) {
            assert_eq!(pair[1] - pair[0], Distance::meters(1.0));
        }
        assert_eq!(s[11] - s[10], Distance::meters(0.5));

        // Tagged by the raw segment each sample falls on: 2 covers [4.5, 9)
        let tags: Vec<i64> = info.path.points.iter().map(|pt| pt.lane_ids[0].0).collect();
        assert_eq!(tags, vec![1, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3]);
        assert_eq!(info.lane_id_interval, (4, 9));

        // Margins converted to steps are never shorter than asked for
        let margin = Distance::meters(3.0);
        assert!(info.path.signed_arc_length(2, 2 + info.ceil_steps(margin)) >= margin);
    }

    #[test]
    fn no_near_duplicate_endpoint() {
        // 0.3m segments sampled every 0.1m, ending just past the sample at 0.9m
        let mut raw = straight_path(0.3, &[2, 2, 2, 2]);
        raw.points[3].pose.pos = Pt2D::new(0.905, 0.0);
        let ids: BTreeSet<LaneletID> = vec![LaneletID(2)].into_iter().collect();
        let info = generate_interpolated_path(LaneletID(2), &ids, &raw, Distance::meters(0.1))
            .unwrap()
            .unwrap();
        assert_eq!(info.path.len(), 10);
        for pair in info.path.points.windows(2) {
            assert!(pair[0].pos().dist_to(pair[1].pos()) > EPSILON_DIST);
        }
        assert!(info.path.points[9]
            .pos()
            .approx_eq(Pt2D::new(0.905, 0.0), Distance::meters(0.001)));
    }

    #[test]
    fn missing_lane() {
        let raw = straight_path(10.0, &[1, 1, 3]);
        let ids: BTreeSet<LaneletID> = vec![LaneletID(2)].into_iter().collect();
        assert!(
            generate_interpolated_path(LaneletID(2), &ids, &raw, Distance::meters(1.0))
                .unwrap()
                .is_none()
        );
        assert!(generate_interpolated_path(LaneletID(2), &ids, &raw, Distance::ZERO).is_err());
    }
}
