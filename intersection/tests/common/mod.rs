#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};

use geom::{Angle, Distance, Duration, PolyLine, Polygon, Pose, Pt2D, Speed};
use intersection::{
    EgoState, IntersectionConfig, ObjectClassification, ObjectID, PathPointWithLaneId,
    PathWithLaneId, PredictedObject, Shape, SignalColor, SignalElement, SignalShape,
    SignalSnapshot, TrafficSignal, TrafficSignalStamped,
};
use lanelet_map::{Lanelet, LaneletID, LaneletMap, TrafficLightID, TurnDirection};

pub fn ids(list: &[i64]) -> BTreeSet<LaneletID> {
    list.iter().map(|id| LaneletID(*id)).collect()
}

pub fn eastbound(id: i64, x1: f64, x2: f64, y: f64) -> Lanelet {
    Lanelet::new(
        LaneletID(id),
        PolyLine::must_new(vec![Pt2D::new(x1, y + 1.5), Pt2D::new(x2, y + 1.5)]),
        PolyLine::must_new(vec![Pt2D::new(x1, y - 1.5), Pt2D::new(x2, y - 1.5)]),
    )
    .unwrap()
}

pub fn northbound(id: i64, x: f64, y1: f64, y2: f64) -> Lanelet {
    Lanelet::new(
        LaneletID(id),
        PolyLine::must_new(vec![Pt2D::new(x - 1.5, y1), Pt2D::new(x - 1.5, y2)]),
        PolyLine::must_new(vec![Pt2D::new(x + 1.5, y1), Pt2D::new(x + 1.5, y2)]),
    )
    .unwrap()
}

/// Two eastbound lanes (1 -> 2 -> 3 along y=0, and 4 -> 5 -> 6 along y=3 to the left) cross
/// one northbound lane (12 -> 10 -> 11 along x=50). 2 and 5 are inside the intersection, and
/// both conflict with 11.
pub fn crossroad_lanelets() -> Vec<Lanelet> {
    vec![
        eastbound(1, 0.0, 40.0, 0.0),
        eastbound(2, 40.0, 60.0, 0.0).with_turn_direction(TurnDirection::Straight),
        eastbound(3, 60.0, 100.0, 0.0),
        eastbound(4, 0.0, 40.0, 3.0),
        eastbound(5, 40.0, 60.0, 3.0).with_turn_direction(TurnDirection::Straight),
        eastbound(6, 60.0, 100.0, 3.0),
        northbound(12, 50.0, -100.0, -60.0),
        northbound(10, 50.0, -60.0, -20.0),
        northbound(11, 50.0, -20.0, 20.0),
    ]
}

/// Applies `f` to the lanelet with `id`.
pub fn modify(
    lanelets: Vec<Lanelet>,
    id: i64,
    f: impl Fn(Lanelet) -> Lanelet,
) -> Vec<Lanelet> {
    lanelets
        .into_iter()
        .map(|l| if l.id == LaneletID(id) { f(l) } else { l })
        .collect()
}

pub fn build_map(lanelets: Vec<Lanelet>) -> LaneletMap {
    LaneletMap::new(lanelets, BTreeMap::new()).unwrap()
}

/// An eastbound path along `y` from x=0 to x=100, one point per meter. Points before x=40 are
/// tagged with `tags[0]`, then `tags[1]` until x=60, and `tags[2]` after that.
pub fn path_along(y: f64, tags: [i64; 3]) -> PathWithLaneId {
    PathWithLaneId::new(
        (0..=100)
            .map(|x| {
                let tag = if x < 40 {
                    tags[0]
                } else if x < 60 {
                    tags[1]
                } else {
                    tags[2]
                };
                PathPointWithLaneId::new(
                    Pose::new(Pt2D::new(x as f64, y), Angle::ZERO),
                    Speed::meters_per_second(5.0),
                    vec![LaneletID(tag)],
                )
            })
            .collect(),
    )
}

/// Resampling every half meter keeps the scenarios quick; an index is twice the x coordinate.
pub fn config() -> IntersectionConfig {
    let mut cfg = IntersectionConfig::default();
    cfg.common.path_interpolation_ds = Distance::meters(0.5);
    cfg
}

pub fn ego_at(x: f64, y: f64) -> EgoState {
    EgoState {
        pose: Pose::new(Pt2D::new(x, y), Angle::ZERO),
        velocity: Speed::meters_per_second(3.0),
    }
}

pub fn car(id: u64, pos: Pt2D, heading: Angle, velocity: f64) -> PredictedObject {
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

pub fn signal(light: i64, color: SignalColor) -> SignalSnapshot {
    let mut snapshot = BTreeMap::new();
    snapshot.insert(
        TrafficLightID(light),
        TrafficSignalStamped {
            stamp: Duration::ZERO,
            signal: TrafficSignal {
                light: TrafficLightID(light),
                elements: vec![SignalElement {
                    color,
                    shape: SignalShape::Circle,
                    confidence: 1.0,
                }],
            },
        },
    );
    snapshot
}

/// Where `path` first enters `area`.
pub fn entry_idx(path: &PathWithLaneId, area: &Polygon) -> usize {
    path.points
        .iter()
        .position(|pt| area.contains_pt(pt.pos()))
        .unwrap()
}
