use geom::{Polygon, Pose, Pt2D};

use crate::ObjectID;

/// Everything a visualization stage might want to draw about one planning cycle. Nothing reads
/// this back to make decisions.
#[derive(Clone, Debug, Default)]
pub struct DebugData {
    pub collision_stop_wall_pose: Option<Pose>,
    pub occlusion_first_stop_wall_pose: Option<Pose>,
    pub occlusion_stop_wall_pose: Option<Pose>,
    pub stuck_stop_wall_pose: Option<Pose>,
    pub pass_judge_wall_pose: Option<Pose>,

    pub attention_area: Option<Vec<Polygon>>,
    pub occlusion_attention_area: Option<Vec<Polygon>>,
    pub adjacent_area: Option<Vec<Polygon>>,
    pub first_attention_area: Option<Polygon>,
    pub intersection_area: Option<Polygon>,
    pub stuck_vehicle_detect_area: Option<Polygon>,
    pub ego_lane: Option<Polygon>,

    pub conflicting_targets: Vec<ObjectID>,
    pub stuck_targets: Vec<ObjectID>,

    /// Obstacle footprints blocking the view of attention lanes
    pub occlusion_polygons: Vec<Polygon>,
    /// The nearest occluded point, and where it projects onto the ego path
    pub nearest_occlusion_projection: Option<(Pt2D, Pt2D)>,
}
