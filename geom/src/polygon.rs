use std::fmt;

use anyhow::Result;
use geo::{Area, BooleanOps, Contains, Intersects};
use serde::{Deserialize, Serialize};

use crate::{Distance, Line, PolyLine, Pose, Pt2D, EPSILON_DIST};

/// A simple polygon without holes. The points form a closed ring: the first and last point are
/// the same.
#[derive(PartialEq, Serialize, Deserialize, Clone, Debug)]
pub struct Polygon {
    points: Vec<Pt2D>,
}

impl Polygon {
    /// Builds a polygon from its outline. The ring is closed automatically if needed.
    pub fn new(mut pts: Vec<Pt2D>) -> Result<Polygon> {
        pts.dedup_by(|a, b| a.approx_eq(*b, EPSILON_DIST));
        if pts.len() >= 2 && pts[0].approx_eq(*pts.last().unwrap(), EPSILON_DIST) {
            pts.pop();
        }
        if pts.len() < 3 {
            bail!("Polygon needs at least 3 distinct points, got {}", pts.len());
        }
        pts.push(pts[0]);
        Ok(Polygon { points: pts })
    }

    pub fn must_new(pts: Vec<Pt2D>) -> Polygon {
        Polygon::new(pts).unwrap()
    }

    /// The area between two roughly parallel boundaries running the same direction, like the
    /// left and right side of a lane.
    pub fn from_bounds(left: &PolyLine, right: &PolyLine) -> Result<Polygon> {
        let mut pts = left.points().clone();
        pts.extend(right.points().iter().rev().cloned());
        Polygon::new(pts)
    }

    /// A rectangle centered on a pose, with `length` along the heading.
    pub fn rectangle_centered(center: Pose, length: Distance, width: Distance) -> Polygon {
        let (half_l, half_w) = (length / 2.0, width / 2.0);
        Polygon::must_new(vec![
            center.to_world(half_l, half_w),
            center.to_world(-half_l, half_w),
            center.to_world(-half_l, -half_w),
            center.to_world(half_l, -half_w),
        ])
    }

    /// The closed ring; the first and last point match.
    pub fn points(&self) -> &Vec<Pt2D> {
        &self.points
    }

    pub fn edges(&self) -> impl Iterator<Item = Line> + '_ {
        self.points.windows(2).filter_map(|pair| Line::new(pair[0], pair[1]).ok())
    }

    /// Does this polygon contain the point, counting its boundary?
    pub fn contains_pt(&self, pt: Pt2D) -> bool {
        self.to_geo().contains(&geo::Point::from(pt)) || self.dist_to_boundary(pt) < EPSILON_DIST
    }

    /// Distance from the point to the closest edge.
    pub fn dist_to_boundary(&self, pt: Pt2D) -> Distance {
        self.edges()
            .map(|l| l.project_pt(pt).dist_to(pt))
            .min()
            .unwrap_or(Distance::ZERO)
    }

    /// Zero when inside, otherwise the distance to the closest edge.
    pub fn dist_to_pt(&self, pt: Pt2D) -> Distance {
        if self.contains_pt(pt) {
            Distance::ZERO
        } else {
            self.dist_to_boundary(pt)
        }
    }

    /// Do two polygons intersect at all?
    pub fn intersects(&self, other: &Polygon) -> bool {
        self.to_geo().intersects(&other.to_geo())
    }

    /// The area shared by two polygons. Touching along an edge or at a corner counts as zero.
    pub fn overlap_area(&self, other: &Polygon) -> f64 {
        if !self.intersects(other) {
            return 0.0;
        }
        self.to_geo().intersection(&other.to_geo()).unsigned_area()
    }

    // A less verbose way of invoking the From/Into impl. Note this hides a clone.
    fn to_geo(&self) -> geo::Polygon<f64> {
        self.clone().into()
    }
}

impl fmt::Display for Polygon {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Polygon with {} points", self.points.len())?;
        for (idx, pt) in self.points.iter().enumerate() {
            writeln!(f, "  {}: {}", idx, pt)?;
        }
        Ok(())
    }
}

impl From<Polygon> for geo::Polygon<f64> {
    fn from(poly: Polygon) -> Self {
        let exterior = geo::LineString::from(
            poly.points
                .into_iter()
                .map(geo::Coordinate::from)
                .collect::<Vec<_>>(),
        );
        Self::new(exterior, Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Angle;

    fn square() -> Polygon {
        Polygon::must_new(vec![
            Pt2D::new(0.0, 0.0),
            Pt2D::new(4.0, 0.0),
            Pt2D::new(4.0, 4.0),
            Pt2D::new(0.0, 4.0),
        ])
    }

    #[test]
    fn containment_counts_the_boundary() {
        let p = square();
        assert_eq!(p.points().len(), 5);
        assert!(p.contains_pt(Pt2D::new(2.0, 2.0)));
        assert!(p.contains_pt(Pt2D::new(0.0, 2.0)));
        assert!(!p.contains_pt(Pt2D::new(5.0, 2.0)));
        assert_eq!(p.dist_to_pt(Pt2D::new(7.0, 2.0)), Distance::meters(3.0));
        assert!((p.overlap_area(&p) - 16.0).abs() < 1e-9);
    }

    #[test]
    fn rotated_rectangle() {
        let r = Polygon::rectangle_centered(
            Pose::new(Pt2D::new(10.0, 10.0), Angle::degrees(90.0)),
            Distance::meters(4.0),
            Distance::meters(2.0),
        );
        assert!(r.contains_pt(Pt2D::new(10.0, 11.9)));
        assert!(!r.contains_pt(Pt2D::new(11.9, 10.0)));
        assert!(!r.intersects(&square()));
        assert!((r.overlap_area(&r) - 8.0).abs() < 1e-6);
    }

    #[test]
    fn lane_shaped_polygon() {
        let left = PolyLine::must_new(vec![Pt2D::new(0.0, 1.0), Pt2D::new(10.0, 1.0)]);
        let right = PolyLine::must_new(vec![Pt2D::new(0.0, -1.0), Pt2D::new(10.0, -1.0)]);
        let lane = Polygon::from_bounds(&left, &right).unwrap();
        assert!((lane.overlap_area(&lane) - 20.0).abs() < 1e-9);
        let neighbor = Polygon::must_new(vec![
            Pt2D::new(10.0, 1.0),
            Pt2D::new(10.0, -1.0),
            Pt2D::new(20.0, -1.0),
            Pt2D::new(20.0, 1.0),
        ]);
        assert!(lane.overlap_area(&neighbor) < 1e-9);
    }
}
