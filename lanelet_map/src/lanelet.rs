use std::collections::BTreeSet;
use std::fmt;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use geom::{Angle, Distance, PolyLine, Polygon, Pt2D};

/// The centerline is rebuilt from both boundaries at roughly this spacing.
const CENTERLINE_STEP: Distance = Distance::const_meters(1.0);

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LaneletID(pub i64);

impl fmt::Display for LaneletID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Lanelet #{}", self.0)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrafficLightID(pub i64);

impl fmt::Display for TrafficLightID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "TrafficLight #{}", self.0)
    }
}

/// Identifies an intersection area polygon in the map.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AreaID(pub i64);

impl fmt::Display for AreaID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Area #{}", self.0)
    }
}

/// The `turn_direction` attribute of lanelets inside an intersection. Lanelets outside of
/// intersections have `Else`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnDirection {
    Straight,
    Left,
    Right,
    Else,
}

/// An atomic directed lane segment. Traffic flows from the first to the last point of both
/// boundaries.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Lanelet {
    pub id: LaneletID,
    pub left: PolyLine,
    pub right: PolyLine,
    pub centerline: PolyLine,
    pub turn_direction: TurnDirection,
    pub traffic_light: Option<TrafficLightID>,
    pub stop_line: Option<PolyLine>,
    pub intersection_area: Option<AreaID>,
    /// Right-of-way: these lanelets must yield to this one.
    pub yield_lanelets: BTreeSet<LaneletID>,
    polygon: Polygon,
}

impl Lanelet {
    pub fn new(id: LaneletID, left: PolyLine, right: PolyLine) -> Result<Lanelet> {
        let centerline =
            centerline_between(&left, &right).with_context(|| format!("centerline of {}", id))?;
        let polygon =
            Polygon::from_bounds(&left, &right).with_context(|| format!("polygon of {}", id))?;
        Ok(Lanelet {
            id,
            left,
            right,
            centerline,
            turn_direction: TurnDirection::Else,
            traffic_light: None,
            stop_line: None,
            intersection_area: None,
            yield_lanelets: BTreeSet::new(),
            polygon,
        })
    }

    pub fn with_turn_direction(mut self, turn_direction: TurnDirection) -> Lanelet {
        self.turn_direction = turn_direction;
        self
    }

    pub fn with_traffic_light(mut self, light: TrafficLightID) -> Lanelet {
        self.traffic_light = Some(light);
        self
    }

    pub fn with_stop_line(mut self, stop_line: PolyLine) -> Lanelet {
        self.stop_line = Some(stop_line);
        self
    }

    pub fn with_intersection_area(mut self, area: AreaID) -> Lanelet {
        self.intersection_area = Some(area);
        self
    }

    pub fn with_yield_lanelets(mut self, yielding: Vec<LaneletID>) -> Lanelet {
        self.yield_lanelets.extend(yielding);
        self
    }

    pub fn polygon(&self) -> &Polygon {
        &self.polygon
    }

    pub fn length(&self) -> Distance {
        self.centerline.length()
    }

    pub fn is_turning(&self) -> bool {
        matches!(self.turn_direction, TurnDirection::Left | TurnDirection::Right)
    }

    /// Is the point inside the lanelet, or at most `margin` away from it?
    pub fn contains_pt(&self, pt: Pt2D, margin: Distance) -> bool {
        self.polygon.dist_to_pt(pt) <= margin
    }

    /// The direction of travel closest to the point.
    pub fn direction_at(&self, pt: Pt2D) -> Angle {
        self.centerline.angle_near(pt)
    }

    /// The left and right boundary points matching some distance along the centerline.
    pub fn cross_section_at(&self, dist: Distance) -> Result<(Pt2D, Pt2D)> {
        let pct = dist.safe_percent(self.length()).clamp(0.0, 1.0);
        let (left, _) = self.left.dist_along(pct * self.left.length())?;
        let (right, _) = self.right.dist_along(pct * self.right.length())?;
        Ok((left, right))
    }
}

fn centerline_between(left: &PolyLine, right: &PolyLine) -> Result<PolyLine> {
    let longest = left.length().max(right.length());
    let steps = ((longest / CENTERLINE_STEP).ceil() as usize).max(1);
    let mut pts = Vec::new();
    for i in 0..=steps {
        let pct = (i as f64) / (steps as f64);
        let (l, _) = left.dist_along(pct * left.length())?;
        let (r, _) = right.dist_along(pct * right.length())?;
        pts.push(l.lerp(r, 0.5));
    }
    PolyLine::deduping_new(pts)
}

/// The area covered by a consecutive sequence of lanelets, between two distances measured along
/// their joined centerlines. Returns `None` if the range is empty.
pub fn polygon_from_arc_length(
    lanelets: &[&Lanelet],
    start: Distance,
    end: Distance,
) -> Option<Polygon> {
    let total: Distance = lanelets.iter().map(|l| l.length()).sum();
    let start = start.max(Distance::ZERO);
    let end = end.min(total);
    if start >= end {
        return None;
    }

    let mut left_pts = Vec::new();
    let mut right_pts = Vec::new();
    let mut travelled = Distance::ZERO;
    for l in lanelets {
        let len = l.length();
        let (from, to) = (start - travelled, end - travelled);
        travelled += len;
        if to <= Distance::ZERO || from >= len {
            continue;
        }
        let from = from.max(Distance::ZERO).safe_percent(len);
        let to = to.min(len).safe_percent(len);
        for (bound, pts) in [(&l.left, &mut left_pts), (&l.right, &mut right_pts)] {
            // Slivers shorter than the epsilon are just skipped
            if let Ok(slice) = bound.maybe_exact_slice(from * bound.length(), to * bound.length())
            {
                pts.extend(slice.into_points());
            }
        }
    }
    let left = PolyLine::deduping_new(left_pts).ok()?;
    let right = PolyLine::deduping_new(right_pts).ok()?;
    Polygon::from_bounds(&left, &right).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight(id: i64, x1: f64, x2: f64) -> Lanelet {
        Lanelet::new(
            LaneletID(id),
            PolyLine::must_new(vec![Pt2D::new(x1, 1.5), Pt2D::new(x2, 1.5)]),
            PolyLine::must_new(vec![Pt2D::new(x1, -1.5), Pt2D::new(x2, -1.5)]),
        )
        .unwrap()
    }

    #[test]
    fn centerline_runs_between_bounds() {
        let l = straight(1, 0.0, 10.0);
        assert_eq!(l.length(), Distance::meters(10.0));
        assert!(l.centerline.first_pt().approx_eq(Pt2D::new(0.0, 0.0), Distance::meters(0.01)));
        assert!(l.contains_pt(Pt2D::new(5.0, 1.0), Distance::ZERO));
        assert!(!l.contains_pt(Pt2D::new(5.0, 2.0), Distance::ZERO));
        assert!(l.contains_pt(Pt2D::new(5.0, 2.0), Distance::meters(1.0)));
        let (left, right) = l.cross_section_at(Distance::meters(4.0)).unwrap();
        assert!(left.approx_eq(Pt2D::new(4.0, 1.5), Distance::meters(0.01)));
        assert!(right.approx_eq(Pt2D::new(4.0, -1.5), Distance::meters(0.01)));
    }

    #[test]
    fn arc_length_polygon_spans_lanelets() {
        let a = straight(1, 0.0, 10.0);
        let b = straight(2, 10.0, 20.0);
        let poly =
            polygon_from_arc_length(&[&a, &b], Distance::meters(5.0), Distance::meters(15.0))
                .unwrap();
        assert!((poly.overlap_area(&poly) - 30.0).abs() < 0.1);
        assert!(poly.contains_pt(Pt2D::new(12.0, 0.0)));
        assert!(!poly.contains_pt(Pt2D::new(17.0, 0.0)));

        // Past the end gets clamped
        let poly =
            polygon_from_arc_length(&[&a, &b], Distance::meters(18.0), Distance::meters(50.0))
                .unwrap();
        assert!((poly.overlap_area(&poly) - 6.0).abs() < 0.1);
        assert!(
            polygon_from_arc_length(&[&a], Distance::meters(12.0), Distance::meters(15.0))
                .is_none()
        );
    }
}
