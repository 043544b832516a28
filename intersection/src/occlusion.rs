use geom::{Distance, PolyLine, Polygon, Pt2D};

use crate::{DebugData, DiscretizedLane};

/// The closest place along the ego path where the view of an attention lane is blocked.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OcclusionProjection {
    /// The first point on a cross-section that can't be seen
    pub occluded: Pt2D,
    /// Where that point projects onto the ego path
    pub projection: Pt2D,
    /// How far along the ego path the projection is
    pub dist_along_path: Distance,
}

/// Walks each cross-section from left to right, stopping at the first point that's covered by
/// an obstacle or out of sensing range. Of those points, returns the one projecting nearest to
/// the start of `ego_path`. Blocking obstacles are recorded in `debug`.
pub fn find_nearest_occlusion_projection(
    lanes: &[DiscretizedLane],
    obstacles: &[Polygon],
    ego_position: Pt2D,
    sensing_range: Distance,
    ego_path: &PolyLine,
    debug: &mut DebugData,
) -> Option<OcclusionProjection> {
    let mut blocking: Vec<usize> = Vec::new();
    let mut best: Option<OcclusionProjection> = None;
    for lane in lanes {
        for division in &lane.divisions {
            let occluded = division.points().iter().find_map(|pt| {
                if pt.dist_to(ego_position) > sensing_range {
                    return Some(*pt);
                }
                let hit = obstacles.iter().position(|o| o.contains_pt(*pt))?;
                if !blocking.contains(&hit) {
                    blocking.push(hit);
                }
                Some(*pt)
            });
            let occluded = match occluded {
                Some(pt) => pt,
                None => continue,
            };
            let (dist_along_path, projection) = ego_path.project_pt(occluded);
            if best
                .map(|b| dist_along_path < b.dist_along_path)
                .unwrap_or(true)
            {
                best = Some(OcclusionProjection {
                    occluded,
                    projection,
                    dist_along_path,
                });
            }
        }
    }

    blocking.sort_unstable();
    debug
        .occlusion_polygons
        .extend(blocking.into_iter().map(|idx| obstacles[idx].clone()));
    debug.nearest_occlusion_projection = best.map(|b| (b.occluded, b.projection));
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use lanelet_map::LaneletID;

    // Cross-sections across a northbound lane at x=50, spanning 48.5 to 51.5
    fn lane() -> DiscretizedLane {
        DiscretizedLane {
            lane_id: LaneletID(1),
            divisions: (-10..=10)
                .map(|y| {
                    let y = y as f64;
                    PolyLine::must_new(vec![
                        Pt2D::new(48.5, y),
                        Pt2D::new(50.0, y),
                        Pt2D::new(51.5, y),
                    ])
                })
                .collect(),
        }
    }

    fn eastbound_path() -> PolyLine {
        PolyLine::must_new(vec![Pt2D::new(0.0, 0.0), Pt2D::new(100.0, 0.0)])
    }

    fn square(x: f64, y: f64) -> Polygon {
        Polygon::must_new(vec![
            Pt2D::new(x - 1.0, y - 1.0),
            Pt2D::new(x + 1.0, y - 1.0),
            Pt2D::new(x + 1.0, y + 1.0),
            Pt2D::new(x - 1.0, y + 1.0),
        ])
    }

    #[test]
    fn clear_view() {
        let mut debug = DebugData::default();
        assert_eq!(
            find_nearest_occlusion_projection(
                &[lane()],
                &[square(10.0, 10.0)],
                Pt2D::new(40.0, 0.0),
                Distance::meters(100.0),
                &eastbound_path(),
                &mut debug,
            ),
            None
        );
        assert!(debug.occlusion_polygons.is_empty());
        assert!(debug.nearest_occlusion_projection.is_none());
    }

    #[test]
    fn blocked_by_obstacle() {
        let mut debug = DebugData::default();
        let result = find_nearest_occlusion_projection(
            &[lane()],
            &[square(10.0, 10.0), square(50.0, 5.0)],
            Pt2D::new(40.0, 0.0),
            Distance::meters(100.0),
            &eastbound_path(),
            &mut debug,
        )
        .unwrap();
        assert!(result.occluded.approx_eq(Pt2D::new(50.0, 4.0), Distance::meters(0.01)));
        assert!(result.projection.approx_eq(Pt2D::new(50.0, 0.0), Distance::meters(0.01)));
        assert_eq!(debug.occlusion_polygons, vec![square(50.0, 5.0)]);
    }

    #[test]
    fn out_of_range() {
        let mut debug = DebugData::default();
        let result = find_nearest_occlusion_projection(
            &[lane()],
            &[],
            Pt2D::new(40.0, 0.0),
            Distance::meters(10.5),
            &eastbound_path(),
            &mut debug,
        )
        .unwrap();
        // Far cross-sections are out of range right at their left end, which projects nearest
        assert!(result.projection.approx_eq(Pt2D::new(48.5, 0.0), Distance::meters(0.01)));
        assert!(debug.occlusion_polygons.is_empty());
    }
}
