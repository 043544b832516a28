use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Angle, Distance, Pt2D};

/// A position with a heading.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub pos: Pt2D,
    pub yaw: Angle,
}

impl Pose {
    pub fn new(pos: Pt2D, yaw: Angle) -> Pose {
        Pose { pos, yaw }
    }

    /// Express a world point in this pose's frame: +x forward, +y to the left.
    pub fn to_local(&self, pt: Pt2D) -> (f64, f64) {
        let dx = pt.x() - self.pos.x();
        let dy = pt.y() - self.pos.y();
        let (sin, cos) = self.yaw.normalized_radians().sin_cos();
        (dx * cos + dy * sin, -dx * sin + dy * cos)
    }

    /// Map a point expressed in this pose's frame back to the world.
    pub fn to_world(&self, forward: Distance, left: Distance) -> Pt2D {
        let (sin, cos) = self.yaw.normalized_radians().sin_cos();
        let (f, l) = (forward.inner_meters(), left.inner_meters());
        self.pos.offset(f * cos - l * sin, f * sin + l * cos)
    }

    /// Is `other` strictly ahead of this pose, along this pose's heading?
    pub fn is_behind(&self, other: &Pose) -> bool {
        self.to_local(other.pos).0 > 0.0
    }

    /// The same position, facing the other way.
    pub fn reversed(&self) -> Pose {
        Pose::new(self.pos, self.yaw.opposite())
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Pose({}, {})", self.pos, self.yaw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_frame() {
        let pose = Pose::new(Pt2D::new(1.0, 1.0), Angle::degrees(90.0));
        let (fwd, left) = pose.to_local(Pt2D::new(1.0, 3.0));
        assert!((fwd - 2.0).abs() < 1e-9);
        assert!(left.abs() < 1e-9);

        let back = pose.to_world(Distance::meters(2.0), Distance::meters(1.0));
        assert!(back.approx_eq(Pt2D::new(0.0, 3.0), Distance::meters(0.001)));

        let ahead = Pose::new(Pt2D::new(1.0, 1.5), Angle::degrees(90.0));
        assert!(pose.is_behind(&ahead));
        assert!(!ahead.is_behind(&pose));
    }
}
