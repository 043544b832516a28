use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::{Angle, Distance, Pt2D, EPSILON_DIST};

/// A line segment.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Line(Pt2D, Pt2D);

impl Line {
    /// Creates a line segment between two points, which must not be the same.
    pub fn new(pt1: Pt2D, pt2: Pt2D) -> Result<Line> {
        if pt1.dist_to(pt2) < EPSILON_DIST {
            bail!("Line from {} to {} too small", pt1, pt2);
        }
        Ok(Line(pt1, pt2))
    }

    /// Equivalent to `Line::new(pt1, pt2).unwrap()`. Use this to effectively document an
    /// assertion at the call-site.
    pub fn must_new(pt1: Pt2D, pt2: Pt2D) -> Line {
        Line::new(pt1, pt2).unwrap()
    }

    pub fn pt1(&self) -> Pt2D {
        self.0
    }

    pub fn pt2(&self) -> Pt2D {
        self.1
    }

    pub fn length(&self) -> Distance {
        self.0.dist_to(self.1)
    }

    pub fn angle(&self) -> Angle {
        self.0.angle_to(self.1)
    }

    /// Returns the point `dist` along the line from pt1. Doesn't clamp; negative distances or
    /// ones past the end extrapolate.
    pub fn unbounded_dist_along(&self, dist: Distance) -> Pt2D {
        self.0.lerp(self.1, dist / self.length())
    }

    pub fn percent_along(&self, percent: f64) -> Pt2D {
        self.0.lerp(self.1, percent)
    }

    /// Where along the segment (clamped to [0, 1]) is the closest point to `pt`?
    pub fn percent_of_projection(&self, pt: Pt2D) -> f64 {
        let dx = self.1.x() - self.0.x();
        let dy = self.1.y() - self.0.y();
        let t = ((pt.x() - self.0.x()) * dx + (pt.y() - self.0.y()) * dy) / (dx * dx + dy * dy);
        t.clamp(0.0, 1.0)
    }

    /// The closest point on the segment to `pt`.
    pub fn project_pt(&self, pt: Pt2D) -> Pt2D {
        self.percent_along(self.percent_of_projection(pt))
    }

    /// Where do two segments cross? Touching at an endpoint counts. Parallel segments never
    /// intersect.
    pub fn intersection(&self, other: &Line) -> Option<Pt2D> {
        let (p, r) = (self.0, (self.1.x() - self.0.x(), self.1.y() - self.0.y()));
        let (q, s) = (
            other.0,
            (other.1.x() - other.0.x(), other.1.y() - other.0.y()),
        );
        let r_cross_s = r.0 * s.1 - r.1 * s.0;
        if r_cross_s.abs() < f64::EPSILON {
            return None;
        }
        let qp = (q.x() - p.x(), q.y() - p.y());
        let t = (qp.0 * s.1 - qp.1 * s.0) / r_cross_s;
        let u = (qp.0 * r.1 - qp.1 * r.0) / r_cross_s;
        if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
            Some(self.percent_along(t))
        } else {
            None
        }
    }

    pub fn intersects(&self, other: &Line) -> bool {
        self.intersection(other).is_some()
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Line::new(")?;
        writeln!(f, "  Pt2D::new({}, {}),", self.0.x(), self.0.y())?;
        writeln!(f, "  Pt2D::new({}, {}),", self.1.x(), self.1.y())?;
        write!(f, ")")
    }
}
