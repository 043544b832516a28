//! Typed 2D geometry for the intersection planner. Everything lives in a local, metric,
//! right-handed world frame: x and y in meters, angles counter-clockwise from +x.

#[macro_use]
extern crate anyhow;

pub use crate::angle::Angle;
pub use crate::distance::Distance;
pub use crate::duration::Duration;
pub use crate::line::Line;
pub use crate::polygon::Polygon;
pub use crate::polyline::PolyLine;
pub use crate::pose::Pose;
pub use crate::pt::Pt2D;
pub use crate::speed::Speed;

mod angle;
mod distance;
mod duration;
mod line;
mod polygon;
mod polyline;
mod pose;
mod pt;
mod speed;

/// About 1cm. Points closer than this are treated as identical.
pub const EPSILON_DIST: Distance = Distance::const_meters(0.01);

/// Reduce the precision of an f64. This helps ensure serialization is idempotent (everything is
/// exactly the same before and after saving/loading). Ideally we'd use some kind of proper
/// fixed-precision type instead of f64.
pub fn trim_f64(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}
