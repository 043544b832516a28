use geom::{Distance, Polygon, Pose};
use lanelet_map::{Lanelet, LaneletMap};

use crate::PathWithLaneId;

/// The whole intersection's area, if the map tags `lanelet` with one.
pub fn get_intersection_area(lanelet: &Lanelet, map: &LaneletMap) -> Option<Polygon> {
    let id = lanelet.intersection_area?;
    match map.get_area(id) {
        Some(poly) => Some(poly.clone()),
        None => {
            warn!("{} refers to {}, which isn't in the map", lanelet.id, id);
            None
        }
    }
}

/// How far the ego vehicle at `closest_idx` still has to go before entering `lanelet`. Zero if
/// the path never reaches it or the ego vehicle is already there.
pub fn calc_distance_until_intersection_lanelet(
    lanelet: &Lanelet,
    path: &PathWithLaneId,
    closest_idx: usize,
) -> Distance {
    let entry = match path
        .points
        .iter()
        .position(|pt| pt.lane_ids.contains(&lanelet.id))
    {
        Some(idx) => idx,
        None => {
            return Distance::ZERO;
        }
    };
    if entry <= closest_idx {
        return Distance::ZERO;
    }

    // The last point before the lanelet
    let dst = entry - 1;
    if dst == closest_idx {
        let ego: &Pose = &path.points[closest_idx].pose;
        let (forward, _) = ego.to_local(lanelet.centerline.first_pt());
        return Distance::meters(forward.max(0.0));
    }
    path.signed_arc_length(closest_idx, dst)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::path::tests::straight_path;
    use geom::{PolyLine, Pt2D};
    use lanelet_map::{AreaID, LaneletID};

    fn lanelet(id: i64, x1: f64, x2: f64) -> Lanelet {
        Lanelet::new(
            LaneletID(id),
            PolyLine::must_new(vec![Pt2D::new(x1, 1.5), Pt2D::new(x2, 1.5)]),
            PolyLine::must_new(vec![Pt2D::new(x1, -1.5), Pt2D::new(x2, -1.5)]),
        )
        .unwrap()
    }

    #[test]
    fn intersection_area() {
        let area = Polygon::must_new(vec![
            Pt2D::new(10.0, -10.0),
            Pt2D::new(30.0, -10.0),
            Pt2D::new(30.0, 10.0),
            Pt2D::new(10.0, 10.0),
        ]);
        let mut areas = BTreeMap::new();
        areas.insert(AreaID(7), area.clone());
        let map = LaneletMap::new(
            vec![
                lanelet(1, 0.0, 10.0),
                lanelet(2, 10.0, 30.0).with_intersection_area(AreaID(7)),
            ],
            areas,
        )
        .unwrap();
        assert_eq!(get_intersection_area(map.get_l(LaneletID(1)), &map), None);
        assert_eq!(get_intersection_area(map.get_l(LaneletID(2)), &map), Some(area));
    }

    #[test]
    fn distance_until_lanelet() {
        // 1m apart; lanelet 2 starts at x=10
        let mut tags = vec![1; 10];
        tags.extend(vec![2; 10]);
        let path = straight_path(1.0, &tags);
        let target = lanelet(2, 10.0, 20.0);

        assert_eq!(
            calc_distance_until_intersection_lanelet(&target, &path, 2),
            Distance::meters(7.0)
        );
        // Right before the lanelet, measure to the start of its centerline
        assert_eq!(
            calc_distance_until_intersection_lanelet(&target, &path, 9),
            Distance::meters(1.0)
        );
        // Already inside
        assert_eq!(
            calc_distance_until_intersection_lanelet(&target, &path, 12),
            Distance::ZERO
        );
        // Never reached
        assert_eq!(
            calc_distance_until_intersection_lanelet(&lanelet(3, 0.0, 5.0), &path, 0),
            Distance::ZERO
        );
    }
}
