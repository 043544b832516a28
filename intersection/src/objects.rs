use std::fmt;

use serde::{Deserialize, Serialize};

use geom::{Angle, Distance, Duration, Polygon, Pose, Speed};
use lanelet_map::{polygon_from_arc_length, Lanelet};

use crate::{DebugData, IntersectionConfig, PathLanelets};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectID(pub u64);

impl fmt::Display for ObjectID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Object #{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectClassification {
    Unknown,
    Car,
    Truck,
    Bus,
    Trailer,
    Motorcycle,
    Bicycle,
    Pedestrian,
}

impl ObjectClassification {
    /// Vehicles that can block an intersection or collide with the ego vehicle inside it.
    pub fn is_target_vehicle(self) -> bool {
        matches!(
            self,
            ObjectClassification::Car
                | ObjectClassification::Truck
                | ObjectClassification::Bus
                | ObjectClassification::Trailer
                | ObjectClassification::Motorcycle
                | ObjectClassification::Bicycle
        )
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    BoundingBox { length: Distance, width: Distance },
    /// Outline in the object's own frame: +x forward, +y left, in meters.
    Polygon(Vec<(f64, f64)>),
}

/// One possible future of an object, with a pose every `time_step`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PredictedPath {
    pub path: Vec<Pose>,
    pub time_step: Duration,
    pub confidence: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PredictedObject {
    pub id: ObjectID,
    pub classification: ObjectClassification,
    pub pose: Pose,
    /// Longitudinal velocity; negative when the object is reversing.
    pub velocity: Speed,
    pub shape: Shape,
    pub predicted_paths: Vec<PredictedPath>,
}

impl PredictedObject {
    /// The object's current outline in the world.
    pub fn footprint(&self) -> Option<Polygon> {
        let pose = self.pose;
        match &self.shape {
            Shape::BoundingBox { length, width } => {
                if *length <= Distance::ZERO || *width <= Distance::ZERO {
                    return None;
                }
                Some(Polygon::rectangle_centered(pose, *length, *width))
            }
            Shape::Polygon(pts) => Polygon::new(
                pts.iter()
                    .map(|(x, y)| pose.to_world(Distance::meters(*x), Distance::meters(*y)))
                    .collect(),
            )
            .ok(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct PredictedObjects {
    /// When the predictions were made.
    pub stamp: Duration,
    pub objects: Vec<PredictedObject>,
}

/// The object's pose, facing the way it's actually moving.
pub fn object_pose_with_velocity_direction(obj: &PredictedObject) -> Pose {
    if obj.velocity < Speed::ZERO {
        obj.pose.reversed()
    } else {
        obj.pose
    }
}

/// Is the pose on one of `lanelets` (or within `margin` of it), heading roughly the same way as
/// the lane? With `consider_wrong_direction`, heading roughly the opposite way also counts.
pub fn check_angle_for_target_lanelets(
    pose: &Pose,
    lanelets: &[&Lanelet],
    angle_threshold: Angle,
    consider_wrong_direction: bool,
    margin: Distance,
) -> bool {
    let threshold = angle_threshold.normalized_radians();
    lanelets.iter().any(|l| {
        if !l.contains_pt(pose.pos, margin) {
            return false;
        }
        let diff = l
            .direction_at(pose.pos)
            .shortest_rotation_towards(pose.yaw)
            .abs();
        diff < threshold || (consider_wrong_direction && std::f64::consts::PI - diff < threshold)
    })
}

/// The area to look for stuck vehicles: from the start of the conflicting part of the path,
/// through the rest of the intersection lane and `detect_dist` into the next lane.
pub fn generate_stuck_vehicle_detect_area_polygon(
    path_lanelets: &PathLanelets,
    detect_dist: Distance,
) -> Option<Polygon> {
    let mut lanelets: Vec<&Lanelet> = path_lanelets
        .conflicting_interval_and_remaining
        .iter()
        .collect();
    let intersection_length: Distance = lanelets.iter().map(|l| l.length()).sum();
    if let Some(ref next) = path_lanelets.next {
        lanelets.push(next);
    }
    polygon_from_arc_length(&lanelets, Distance::ZERO, intersection_length + detect_dist)
}

/// Is some vehicle stopped in `stuck_vehicle_detect_area`, facing along `target_lanelets` (or
/// against them, when wrong-direction vehicles are considered)? A moving vehicle never counts, no matter where it is. Stuck vehicles are recorded in `debug`.
pub fn check_stuck_vehicle_in_intersection(
    objects: &PredictedObjects,
    stuck_vehicle_detect_area: &Polygon,
    velocity_threshold: Speed,
    target_lanelets: &[&Lanelet],
    cfg: &IntersectionConfig,
    debug: &mut DebugData,
) -> bool {
    let mut found = false;
    for obj in &objects.objects {
        if !obj.classification.is_target_vehicle() {
            continue;
        }
        if obj.velocity.abs() > velocity_threshold {
            continue;
        }
        let pose = object_pose_with_velocity_direction(obj);
        if !check_angle_for_target_lanelets(
            &pose,
            target_lanelets,
            cfg.common.attention_area_angle_threshold,
            cfg.common.consider_wrong_direction_vehicle,
            cfg.common.attention_area_margin,
        ) {
            continue;
        }
        let footprint = match obj.footprint() {
            Some(poly) => poly,
            None => {
                warn!("{} has a degenerate shape; skipping it", obj.id);
                continue;
            }
        };
        if footprint.intersects(stuck_vehicle_detect_area) {
            debug!("{} is stuck at {}", obj.id, obj.pose.pos);
            debug.stuck_targets.push(obj.id);
            found = true;
        }
    }
    found
}

/// Vehicles on the attention lanelets, heading along them. They're recorded in `debug`.
pub fn filter_attention_targets<'a>(
    objects: &'a PredictedObjects,
    attention_lanelets: &[&Lanelet],
    cfg: &IntersectionConfig,
    debug: &mut DebugData,
) -> Vec<&'a PredictedObject> {
    let mut result = Vec::new();
    for obj in &objects.objects {
        if !obj.classification.is_target_vehicle() {
            continue;
        }
        let pose = object_pose_with_velocity_direction(obj);
        if check_angle_for_target_lanelets(
            &pose,
            attention_lanelets,
            cfg.common.attention_area_angle_threshold,
            cfg.common.consider_wrong_direction_vehicle,
            cfg.common.attention_area_margin,
        ) {
            debug.conflicting_targets.push(obj.id);
            result.push(obj);
        }
    }
    result
}

/// Drops the parts of every predicted path further than `horizon` past `now`.
pub fn cut_predicted_path_with_duration(
    objects: &mut PredictedObjects,
    now: Duration,
    horizon: Duration,
) {
    let stamp = objects.stamp;
    for obj in &mut objects.objects {
        for predicted in &mut obj.predicted_paths {
            let step = predicted.time_step;
            let mut idx = 0;
            predicted.path.retain(|_| {
                let keep = stamp + step * (idx as f64) - now < horizon;
                idx += 1;
                keep
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{Rng, SeedableRng};
    use rand_xorshift::XorShiftRng;

    use super::*;
    use geom::{PolyLine, Pt2D};
    use lanelet_map::LaneletID;

    fn eastbound() -> Lanelet {
        Lanelet::new(
            LaneletID(1),
            PolyLine::must_new(vec![Pt2D::new(0.0, 1.5), Pt2D::new(50.0, 1.5)]),
            PolyLine::must_new(vec![Pt2D::new(0.0, -1.5), Pt2D::new(50.0, -1.5)]),
        )
        .unwrap()
    }

    fn car(id: u64, pos: Pt2D, heading: Angle, velocity: f64) -> PredictedObject {
        PredictedObject {
            id: ObjectID(id),
            classification: ObjectClassification::Car,
            pose: Pose::new(pos, heading),
            velocity: Speed::meters_per_second(velocity),
            shape: Shape::BoundingBox {
                length: Distance::meters(4.0),
                width: Distance::meters(1.8),
            },
            predicted_paths: Vec::new(),
        }
    }

    #[test]
    fn reversing_flips_heading() {
        let obj = car(1, Pt2D::new(10.0, 0.0), Angle::ZERO, -2.0);
        let pose = object_pose_with_velocity_direction(&obj);
        assert!(pose.yaw.approx_eq(Angle::degrees(180.0), 1e-6));
        let obj = car(1, Pt2D::new(10.0, 0.0), Angle::ZERO, 2.0);
        assert_eq!(object_pose_with_velocity_direction(&obj), obj.pose);
    }

    #[test]
    fn angle_filter() {
        let lane = eastbound();
        let lanes = vec![&lane];
        let thr = Angle::degrees(30.0);
        let margin = Distance::meters(0.5);
        let at = |degs: f64| Pose::new(Pt2D::new(20.0, 0.0), Angle::degrees(degs));

        assert!(check_angle_for_target_lanelets(&at(10.0), &lanes, thr, false, margin));
        assert!(check_angle_for_target_lanelets(&at(-10.0), &lanes, thr, false, margin));
        assert!(!check_angle_for_target_lanelets(&at(90.0), &lanes, thr, false, margin));
        assert!(!check_angle_for_target_lanelets(&at(180.0), &lanes, thr, false, margin));
        assert!(check_angle_for_target_lanelets(&at(180.0), &lanes, thr, true, margin));
        assert!(check_angle_for_target_lanelets(&at(200.0), &lanes, thr, true, margin));
        // Off the lane
        let away = Pose::new(Pt2D::new(20.0, 10.0), Angle::ZERO);
        assert!(!check_angle_for_target_lanelets(&away, &lanes, thr, false, margin));
        let close = Pose::new(Pt2D::new(20.0, 1.8), Angle::ZERO);
        assert!(check_angle_for_target_lanelets(&close, &lanes, thr, false, margin));
    }

    #[test]
    fn angle_filter_random_headings() {
        let lane = eastbound();
        let lanes = vec![&lane];
        let thr = Angle::degrees(30.0);
        let mut rng = XorShiftRng::seed_from_u64(42);
        for _ in 0..500 {
            let degs: f64 = rng.gen_range(-180.0..180.0);
            let pose = Pose::new(Pt2D::new(25.0, 0.0), Angle::degrees(degs));
            let expected = degs.abs() < 29.9;
            if degs.abs() < 29.9 || degs.abs() > 30.1 {
                assert_eq!(
                    check_angle_for_target_lanelets(&pose, &lanes, thr, false, Distance::ZERO),
                    expected,
                    "heading {}",
                    degs
                );
            }
        }
    }

    #[test]
    fn stuck_needs_stopped_vehicle() {
        let lane = eastbound();
        let lanes = vec![&lane];
        let area = Polygon::must_new(vec![
            Pt2D::new(20.0, -2.0),
            Pt2D::new(30.0, -2.0),
            Pt2D::new(30.0, 2.0),
            Pt2D::new(20.0, 2.0),
        ]);
        let cfg = IntersectionConfig::default();
        let threshold = cfg.stuck_vehicle.stuck_vehicle_velocity_threshold;

        let mut objects = PredictedObjects::default();
        objects
            .objects
            .push(car(1, Pt2D::new(25.0, 0.0), Angle::ZERO, 0.0));
        let mut debug = DebugData::default();
        assert!(check_stuck_vehicle_in_intersection(
            &objects, &area, threshold, &lanes, &cfg, &mut debug
        ));
        assert_eq!(debug.stuck_targets, vec![ObjectID(1)]);

        // Moving, crossing, or not a vehicle
        for obj in [
            car(2, Pt2D::new(25.0, 0.0), Angle::ZERO, 5.0),
            car(3, Pt2D::new(25.0, 0.0), Angle::degrees(90.0), 0.0),
            PredictedObject {
                classification: ObjectClassification::Pedestrian,
                ..car(4, Pt2D::new(25.0, 0.0), Angle::ZERO, 0.0)
            },
            car(5, Pt2D::new(40.0, 0.0), Angle::ZERO, 0.0),
        ] {
            let objects = PredictedObjects {
                stamp: Duration::ZERO,
                objects: vec![obj],
            };
            let mut debug = DebugData::default();
            assert!(!check_stuck_vehicle_in_intersection(
                &objects, &area, threshold, &lanes, &cfg, &mut debug
            ));
            assert!(debug.stuck_targets.is_empty());
        }
    }

    #[test]
    fn stuck_wrong_way_vehicle() {
        let lane = eastbound();
        let lanes = vec![&lane];
        let area = Polygon::must_new(vec![
            Pt2D::new(20.0, -2.0),
            Pt2D::new(30.0, -2.0),
            Pt2D::new(30.0, 2.0),
            Pt2D::new(20.0, 2.0),
        ]);
        let objects = PredictedObjects {
            stamp: Duration::ZERO,
            objects: vec![car(1, Pt2D::new(25.0, 0.0), Angle::degrees(180.0), 0.0)],
        };

        let mut cfg = IntersectionConfig::default();
        cfg.common.consider_wrong_direction_vehicle = false;
        let threshold = cfg.stuck_vehicle.stuck_vehicle_velocity_threshold;
        let mut debug = DebugData::default();
        assert!(!check_stuck_vehicle_in_intersection(
            &objects, &area, threshold, &lanes, &cfg, &mut debug
        ));

        cfg.common.consider_wrong_direction_vehicle = true;
        let mut debug = DebugData::default();
        assert!(check_stuck_vehicle_in_intersection(
            &objects, &area, threshold, &lanes, &cfg, &mut debug
        ));
        assert_eq!(debug.stuck_targets, vec![ObjectID(1)]);
    }

    #[test]
    fn cut_paths() {
        let mut obj = car(1, Pt2D::new(0.0, 0.0), Angle::ZERO, 5.0);
        obj.predicted_paths.push(PredictedPath {
            path: (0..10)
                .map(|i| Pose::new(Pt2D::new(i as f64, 0.0), Angle::ZERO))
                .collect(),
            time_step: Duration::seconds(0.5),
            confidence: 1.0,
        });
        let mut objects = PredictedObjects {
            stamp: Duration::seconds(10.0),
            objects: vec![obj],
        };
        // Only points stamped before 11.5 are within 2s of 9.5
        cut_predicted_path_with_duration(
            &mut objects,
            Duration::seconds(9.5),
            Duration::seconds(2.0),
        );
        assert_eq!(objects.objects[0].predicted_paths[0].path.len(), 3);
    }
}
