use geom::{Distance, Duration, Speed};

use crate::{IntersectionConfig, PathWithLaneId};

/// When the ego vehicle is expected to reach each distance along the path. Both times and
/// distances strictly increase.
pub type TimeDistanceArray = Vec<(Duration, Distance)>;

/// How the ego vehicle is assumed to drive through the intersection.
#[derive(Clone, Debug, PartialEq)]
pub struct PassingTimeParams {
    pub start_delay: Duration,
    pub current_velocity: Speed,
    pub intersection_velocity: Speed,
    pub minimum_ego_velocity: Speed,
    /// m/s^2 of the ramp from the current velocity to the intersection velocity. Zero jumps
    /// straight to the intersection velocity.
    pub ramp_acceleration: f64,
    pub use_upstream_velocity: bool,
    pub minimum_upstream_velocity: Speed,
}

impl PassingTimeParams {
    pub fn new(cfg: &IntersectionConfig, current_velocity: Speed) -> PassingTimeParams {
        let c = &cfg.collision_detection;
        PassingTimeParams {
            start_delay: c.start_delay,
            current_velocity,
            intersection_velocity: c.intersection_velocity,
            minimum_ego_velocity: c.minimum_ego_velocity,
            ramp_acceleration: c.ramp_acceleration,
            use_upstream_velocity: c.use_upstream_velocity,
            minimum_upstream_velocity: c.minimum_upstream_velocity,
        }
    }

    // The ramped velocity after covering `dist` from the start
    fn ramp(&self, dist: Distance) -> Speed {
        let target = self.intersection_velocity;
        if self.ramp_acceleration <= 0.0 {
            return target;
        }
        let v0 = self.current_velocity.abs().inner_meters_per_second();
        let delta = 2.0 * self.ramp_acceleration * dist.inner_meters();
        if self.current_velocity.abs() < target {
            Speed::meters_per_second((v0 * v0 + delta).sqrt()).min(target)
        } else {
            Speed::meters_per_second((v0 * v0 - delta).max(0.0).sqrt()).max(target)
        }
    }
}

/// Estimates when the ego vehicle passes each point from `closest_idx` to `last_idx`. The
/// profile starts at `(start_delay, s(closest_idx))` and ends at `s(last_idx)`, where `s` is
/// the distance along `path`. Each segment takes its length divided by the average velocity at
/// its ends, never going below the minimum velocity.
pub fn calc_intersection_passing_time(
    path: &PathWithLaneId,
    closest_idx: usize,
    last_idx: usize,
    params: &PassingTimeParams,
) -> TimeDistanceArray {
    let s = path.arc_lengths();
    let mut result = vec![(params.start_delay, s[closest_idx])];
    let last_idx = last_idx.min(path.len() - 1);
    if last_idx <= closest_idx {
        return result;
    }

    let mut passed_upstream_stop = false;
    let mut velocity_at = |idx: usize| -> Speed {
        if params.use_upstream_velocity {
            if idx > closest_idx && path.points[idx].velocity <= Speed::ZERO {
                passed_upstream_stop = true;
            }
            if passed_upstream_stop {
                params.minimum_upstream_velocity
            } else {
                path.points[idx].velocity
            }
        } else {
            params.ramp(s[idx] - s[closest_idx])
        }
    };

    let mut time = params.start_delay;
    let mut prev_velocity = velocity_at(closest_idx);
    for idx in closest_idx + 1..=last_idx {
        let velocity = velocity_at(idx);
        let segment = s[idx] - s[idx - 1];
        if segment <= Distance::ZERO {
            prev_velocity = velocity;
            continue;
        }
        let average = (prev_velocity + velocity) / 2.0;
        let passing_velocity = average.max(params.minimum_ego_velocity);
        let mut next_time = time + segment / passing_velocity;
        if next_time <= time {
            next_time = time + Duration::EPSILON;
        }
        time = next_time;
        prev_velocity = velocity;
        result.push((time, s[idx]));
    }
    result
}
