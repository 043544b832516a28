use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::{Angle, Distance, Line, Pt2D, EPSILON_DIST};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolyLine {
    pts: Vec<Pt2D>,
    length: Distance,
}

impl PolyLine {
    pub fn new(pts: Vec<Pt2D>) -> Result<PolyLine> {
        if pts.len() < 2 {
            bail!("Need at least two points for a PolyLine");
        }
        let length = pts.windows(2).fold(Distance::ZERO, |so_far, pair| {
            so_far + pair[0].dist_to(pair[1])
        });

        if pts.windows(2).any(|pair| pair[0].approx_eq(pair[1], EPSILON_DIST)) {
            bail!("PolyLine has ~dupe adjacent pts");
        }

        Ok(PolyLine { pts, length })
    }

    pub fn must_new(pts: Vec<Pt2D>) -> PolyLine {
        PolyLine::new(pts).unwrap()
    }

    /// Like `new`, but removes adjacent points that are too close together first.
    pub fn deduping_new(mut pts: Vec<Pt2D>) -> Result<PolyLine> {
        pts.dedup_by(|a, b| a.approx_eq(*b, EPSILON_DIST));
        PolyLine::new(pts)
    }

    pub fn points(&self) -> &Vec<Pt2D> {
        &self.pts
    }

    pub fn into_points(self) -> Vec<Pt2D> {
        self.pts
    }

    pub fn lines(&self) -> impl Iterator<Item = Line> + '_ {
        self.pts
            .windows(2)
            .map(|pair| Line::must_new(pair[0], pair[1]))
    }

    pub fn length(&self) -> Distance {
        self.length
    }

    pub fn first_pt(&self) -> Pt2D {
        self.pts[0]
    }

    pub fn last_pt(&self) -> Pt2D {
        *self.pts.last().unwrap()
    }

    /// Returns the point and angle `dist_along` from the start. Tolerates a tiny bit of excess
    /// at the end.
    pub fn dist_along(&self, dist_along: Distance) -> Result<(Pt2D, Angle)> {
        if dist_along < Distance::ZERO {
            bail!("dist_along {} is negative", dist_along);
        }
        if dist_along > self.length + EPSILON_DIST {
            bail!("dist_along {} is longer than {}", dist_along, self.length);
        }

        let mut dist_left = dist_along;
        for (idx, l) in self.lines().enumerate() {
            let length = l.length();
            let last = idx == self.pts.len() - 2;
            if dist_left <= length || last {
                let dist_left = if dist_left > length {
                    length
                } else {
                    dist_left
                };
                return Ok((l.unbounded_dist_along(dist_left), l.angle()));
            }
            dist_left -= length;
        }
        unreachable!()
    }

    pub fn must_dist_along(&self, dist_along: Distance) -> (Pt2D, Angle) {
        self.dist_along(dist_along).unwrap()
    }

    /// Distances 0, step, 2 * step, ..., always ending with the full length. Panics on a
    /// non-positive step.
    pub fn step_distances(&self, step: Distance) -> Vec<Distance> {
        assert!(step > Distance::ZERO, "step_distances needs a positive step");
        let mut result = Vec::new();
        let mut dist = Distance::ZERO;
        while dist < self.length - EPSILON_DIST {
            result.push(dist);
            dist += step;
        }
        result.push(self.length);
        result
    }

    /// Returns the piece of the polyline between two distances.
    pub fn maybe_exact_slice(&self, start: Distance, end: Distance) -> Result<PolyLine> {
        if start < Distance::ZERO || end > self.length + EPSILON_DIST || start >= end {
            bail!(
                "Can't get a polyline slice [{}, {}] of length {}",
                start,
                end,
                self.length
            );
        }

        let mut result: Vec<Pt2D> = Vec::new();
        let mut dist_so_far = Distance::ZERO;
        for line in self.lines() {
            let length = line.length();

            // Does this line contain the first point of the slice?
            if result.is_empty() && dist_so_far + length >= start {
                result.push(line.unbounded_dist_along(start - dist_so_far));
            }

            // Does this line contain the last point of the slice?
            if dist_so_far + length >= end {
                result.push(line.unbounded_dist_along(end - dist_so_far));
                return PolyLine::deduping_new(result);
            }

            // If we're in the middle, just collect the endpoint.
            if !result.is_empty() {
                result.push(line.pt2());
            }

            dist_so_far += length;
        }

        // Only the epsilon of excess at the end gets here
        result.push(self.last_pt());
        PolyLine::deduping_new(result)
    }

    /// Find the closest point on the polyline to `pt`, returning how far along it is.
    pub fn project_pt(&self, pt: Pt2D) -> (Distance, Pt2D) {
        let mut best: Option<(Distance, Distance, Pt2D)> = None;
        let mut dist_so_far = Distance::ZERO;
        for l in self.lines() {
            let hit = l.project_pt(pt);
            let off = hit.dist_to(pt);
            if best.map(|(b, _, _)| off < b).unwrap_or(true) {
                best = Some((off, dist_so_far + l.pt1().dist_to(hit), hit));
            }
            dist_so_far += l.length();
        }
        let (_, dist, hit) = best.unwrap();
        (dist, hit)
    }

    /// The direction of the segment closest to `pt`.
    pub fn angle_near(&self, pt: Pt2D) -> Angle {
        let (dist, _) = self.project_pt(pt);
        self.must_dist_along(dist).1
    }

    /// Shift the polyline to the left by `width`. Interior points use a miter join; the number
    /// of points doesn't change, but the length probably does.
    pub fn shift_left(&self, width: Distance) -> Result<PolyLine> {
        self.shift_either_direction(width)
    }

    pub fn shift_right(&self, width: Distance) -> Result<PolyLine> {
        self.shift_either_direction(-width)
    }

    fn shift_either_direction(&self, width: Distance) -> Result<PolyLine> {
        let shifted: Vec<(Pt2D, Pt2D)> = self
            .lines()
            .map(|l| {
                let normal = l.angle().rotate_degs(90.0);
                (
                    shift_pt(l.pt1(), width, normal),
                    shift_pt(l.pt2(), width, normal),
                )
            })
            .collect();

        let mut result = vec![shifted[0].0];
        for pair in shifted.windows(2) {
            let (a1, a2) = pair[0];
            let (b1, b2) = pair[1];
            // When the lines are parallel, the shifted endpoints coincide.
            result.push(infinite_line_intersection(a1, a2, b1, b2).unwrap_or(a2));
        }
        result.push(shifted.last().unwrap().1);
        PolyLine::deduping_new(result)
    }
}

fn shift_pt(pt: Pt2D, width: Distance, normal: Angle) -> Pt2D {
    if width < Distance::ZERO {
        pt.project_away(-width, normal.opposite())
    } else {
        pt.project_away(width, normal)
    }
}

fn infinite_line_intersection(a1: Pt2D, a2: Pt2D, b1: Pt2D, b2: Pt2D) -> Option<Pt2D> {
    let r = (a2.x() - a1.x(), a2.y() - a1.y());
    let s = (b2.x() - b1.x(), b2.y() - b1.y());
    let denom = r.0 * s.1 - r.1 * s.0;
    if denom.abs() < 1e-9 {
        return None;
    }
    let t = ((b1.x() - a1.x()) * s.1 - (b1.y() - a1.y()) * s.0) / denom;
    Some(a1.lerp(a2, t))
}

impl fmt::Display for PolyLine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "PolyLine::new(vec![")?;
        for pt in &self.pts {
            writeln!(f, "  Pt2D::new({}, {}),", pt.x(), pt.y())?;
        }
        write!(f, "])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn l_shape() -> PolyLine {
        PolyLine::must_new(vec![
            Pt2D::new(0.0, 0.0),
            Pt2D::new(10.0, 0.0),
            Pt2D::new(10.0, 10.0),
        ])
    }

    #[test]
    fn dist_along_and_slice() {
        let pl = l_shape();
        assert_eq!(pl.length(), Distance::meters(20.0));
        let (pt, angle) = pl.must_dist_along(Distance::meters(15.0));
        assert!(pt.approx_eq(Pt2D::new(10.0, 5.0), EPSILON_DIST));
        assert!(angle.approx_eq(Angle::degrees(90.0), 1e-6));
        assert!(pl.dist_along(Distance::meters(21.0)).is_err());

        let slice = pl
            .maybe_exact_slice(Distance::meters(5.0), Distance::meters(15.0))
            .unwrap();
        assert_eq!(slice.points().len(), 3);
        assert_eq!(slice.length(), Distance::meters(10.0));
    }

    #[test]
    fn step_distances_include_both_ends() {
        let pl = l_shape();
        let steps = pl.step_distances(Distance::meters(3.0));
        assert_eq!(steps[0], Distance::ZERO);
        assert_eq!(*steps.last().unwrap(), Distance::meters(20.0));
        assert_eq!(steps.len(), 8);
    }

    #[test]
    fn shifting_keeps_corners() {
        let pl = l_shape();
        let left = pl.shift_left(Distance::meters(1.0)).unwrap();
        assert!(left.points()[0].approx_eq(Pt2D::new(0.0, 1.0), EPSILON_DIST));
        assert!(left.points()[1].approx_eq(Pt2D::new(9.0, 1.0), EPSILON_DIST));
        let right = pl.shift_right(Distance::meters(1.0)).unwrap();
        assert!(right.points()[1].approx_eq(Pt2D::new(11.0, -1.0), EPSILON_DIST));
    }

    #[test]
    fn projection() {
        let pl = l_shape();
        let (dist, hit) = pl.project_pt(Pt2D::new(12.0, 4.0));
        assert_eq!(dist, Distance::meters(14.0));
        assert!(hit.approx_eq(Pt2D::new(10.0, 4.0), EPSILON_DIST));
        assert!(pl.angle_near(Pt2D::new(12.0, 4.0)).approx_eq(Angle::degrees(90.0), 1e-6));
    }
}
