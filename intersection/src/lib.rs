//! The decision core of an intersection-crossing behavior. Each planning cycle, it figures out
//! where along the ego vehicle's path to stop for conflicting traffic, blocked exits and
//! occlusions, and estimates when the ego vehicle would pass through. Deciding whether to
//! actually stop happens elsewhere, using these outputs.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod config;
mod debug;
mod discretize;
mod interpolate;
mod lanelets;
mod map_utils;
mod module;
mod objects;
mod occlusion;
mod path;
mod path_lanelets;
mod stop_lines;
mod time_distance;
mod traffic;

pub use crate::config::{
    CollisionDetectionConfig, CommonConfig, IntersectionConfig, OcclusionConfig,
    StuckVehicleConfig, VehicleConfig,
};
pub use crate::debug::DebugData;
pub use crate::discretize::{generate_detection_lane_divisions, DiscretizedLane};
pub use crate::interpolate::{generate_interpolated_path, InterpolatedPathInfo};
pub use crate::lanelets::{
    get_objective_lanelets, AttentionView, FirstAreaCache, FirstAreas, IntersectionLanelets,
    LaneletSet,
};
pub use crate::map_utils::{calc_distance_until_intersection_lanelet, get_intersection_area};
pub use crate::module::{CycleOutput, EgoState, IntersectionModule, PlannerData};
pub use crate::objects::{
    check_angle_for_target_lanelets, check_stuck_vehicle_in_intersection,
    cut_predicted_path_with_duration, filter_attention_targets,
    generate_stuck_vehicle_detect_area_polygon, object_pose_with_velocity_direction, ObjectID,
    ObjectClassification, PredictedObject, PredictedObjects, PredictedPath, Shape,
};
pub use crate::occlusion::{find_nearest_occlusion_projection, OcclusionProjection};
pub use crate::path::{
    find_lane_ids_interval, has_lane_ids, PathPointWithLaneId, PathWithLaneId,
};
pub use crate::path_lanelets::{generate_path_lanelet, generate_path_lanelets, PathLanelets};
pub use crate::stop_lines::{
    generate_intersection_stop_lines, generate_stuck_stop_line, get_first_point_inside_polygon,
    get_first_point_inside_polygons, is_before_target_index, is_over_target_index,
    stop_line_index_from_map, IntersectionStopLines,
};
pub use crate::time_distance::{
    calc_intersection_passing_time, PassingTimeParams, TimeDistanceArray,
};
pub use crate::traffic::{
    get_traffic_prioritized_level, has_associated_traffic_light, SignalColor, SignalElement,
    SignalShape, SignalSnapshot, TrafficPrioritizedLevel, TrafficSignal, TrafficSignalStamped,
};
