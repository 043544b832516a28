use std::collections::BTreeSet;

use anyhow::{Context, Result};

use geom::{Distance, Duration, Polygon, Pose, Speed};
use lanelet_map::{Lanelet, LaneletID, LaneletMap};

use crate::lanelets::{get_objective_lanelets, AttentionView, FirstAreaCache, FirstAreas};
use crate::map_utils::{calc_distance_until_intersection_lanelet, get_intersection_area};
use crate::objects::{
    check_stuck_vehicle_in_intersection, cut_predicted_path_with_duration,
    filter_attention_targets, generate_stuck_vehicle_detect_area_polygon, ObjectID,
    PredictedObjects,
};
use crate::occlusion::{find_nearest_occlusion_projection, OcclusionProjection};
use crate::path_lanelets::generate_path_lanelets;
use crate::stop_lines::{
    generate_intersection_stop_lines, is_over_target_index, stop_line_index_from_map,
    IntersectionStopLines,
};
use crate::time_distance::{calc_intersection_passing_time, PassingTimeParams, TimeDistanceArray};
use crate::traffic::{get_traffic_prioritized_level, SignalSnapshot, TrafficPrioritizedLevel};
use crate::{
    generate_detection_lane_divisions, generate_interpolated_path, DebugData,
    IntersectionConfig, PathWithLaneId,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EgoState {
    pub pose: Pose,
    pub velocity: Speed,
}

/// A snapshot of everything one planning cycle looks at. Nothing here is modified.
pub struct PlannerData<'a> {
    pub map: &'a LaneletMap,
    pub path: &'a PathWithLaneId,
    pub ego: EgoState,
    pub objects: &'a PredictedObjects,
    pub signals: &'a SignalSnapshot,
    pub now: Duration,
}

/// The result of one planning cycle. Every index refers to `path`, the interpolated path.
#[derive(Clone, Debug)]
pub struct CycleOutput {
    pub path: PathWithLaneId,
    pub stop_lines: IntersectionStopLines,
    pub traffic_prioritized_level: TrafficPrioritizedLevel,
    /// Is a vehicle stopped inside or just past the intersection?
    pub stuck_detected: bool,
    /// Vehicles to check for collisions.
    pub attention_targets: Vec<ObjectID>,
    /// Only computed when the ego vehicle doesn't have the right-of-way.
    pub nearest_occlusion: Option<OcclusionProjection>,
    pub time_distance: TimeDistanceArray,
    /// How far until the ego vehicle enters the intersection lanelet.
    pub distance_to_intersection: Distance,
    /// Past this point, the ego vehicle can't safely stop before the intersection anymore.
    pub over_pass_judge_line: bool,
    pub debug: DebugData,
}

/// Plans around one intersection for as long as the ego vehicle's route goes through it.
/// Remembers the first conflicting and attention areas between cycles, so they stay put even
/// when the route shifts between associative lanelets.
pub struct IntersectionModule {
    lane_id: LaneletID,
    associative_ids: BTreeSet<LaneletID>,
    config: IntersectionConfig,
    first_areas: FirstAreaCache,
}

impl IntersectionModule {
    pub fn new(
        lane_id: LaneletID,
        mut associative_ids: BTreeSet<LaneletID>,
        config: IntersectionConfig,
    ) -> Result<IntersectionModule> {
        config
            .validate()
            .with_context(|| format!("bad config for the intersection at {}", lane_id))?;
        associative_ids.insert(lane_id);
        Ok(IntersectionModule {
            lane_id,
            associative_ids,
            config,
            first_areas: FirstAreaCache::default(),
        })
    }

    pub fn lane_id(&self) -> LaneletID {
        self.lane_id
    }

    pub fn associative_ids(&self) -> &BTreeSet<LaneletID> {
        &self.associative_ids
    }

    pub fn config(&self) -> &IntersectionConfig {
        &self.config
    }

    /// The route now goes through a different lanelet of the same intersection.
    pub fn reassign(&mut self, lane_id: LaneletID) -> Result<()> {
        if !self.associative_ids.contains(&lane_id) {
            bail!(
                "Can't reassign the intersection at {} to {}; it's not one of {:?}",
                self.lane_id,
                lane_id,
                self.associative_ids
            );
        }
        if lane_id != self.lane_id {
            debug!("Intersection at {} reassigned to {}", self.lane_id, lane_id);
            self.lane_id = lane_id;
        }
        Ok(())
    }

    pub fn first_areas(&self) -> Option<&FirstAreas> {
        self.first_areas.get(&self.associative_ids)
    }

    /// Runs one planning cycle. Returns `None` when the path doesn't pass through the
    /// intersection at all.
    pub fn plan(&mut self, input: &PlannerData) -> Result<Option<CycleOutput>> {
        let cfg = &self.config;
        let map = input.map;
        let assigned = map
            .maybe_get_l(self.lane_id)
            .ok_or_else(|| anyhow!("assigned {} isn't in the map", self.lane_id))?;

        let path_info = match generate_interpolated_path(
            self.lane_id,
            &self.associative_ids,
            input.path,
            cfg.common.path_interpolation_ds,
        )? {
            Some(info) => info,
            None => {
                debug!("The path doesn't go through {}", self.lane_id);
                return Ok(None);
            }
        };
        let path = &path_info.path;
        let lanelets_on_path = input.path.lane_id_sequence();

        let mut lanelets = get_objective_lanelets(
            map,
            self.lane_id,
            &lanelets_on_path,
            &self.associative_ids,
            cfg.common.attention_area_length,
            cfg.occlusion.occlusion_attention_area_length,
            cfg.common.consider_wrong_direction_vehicle,
        )?;
        let traffic_prioritized_level = get_traffic_prioritized_level(assigned, input.signals);
        let view = AttentionView::for_priority(traffic_prioritized_level);
        self.first_areas.apply(&mut lanelets, &path_info);

        let closest_idx = path
            .find_nearest_index(input.ego.pose.pos)
            .ok_or_else(|| anyhow!("interpolated path for {} is empty", self.lane_id))?;
        let map_stop_line = assigned
            .stop_line
            .as_ref()
            .and_then(|line| stop_line_index_from_map(&path_info, line));
        let stop_lines = generate_intersection_stop_lines(
            lanelets.first_conflicting_area.as_ref(),
            lanelets.first_attention_area.as_ref(),
            map_stop_line,
            &path_info,
            closest_idx,
            cfg,
        );

        let attention = lanelets.attention(view);
        let mut debug = DebugData {
            attention_area: Some(attention.areas.clone()),
            occlusion_attention_area: Some(lanelets.occlusion_attention(view).areas.clone()),
            adjacent_area: Some(lanelets.adjacent.areas.clone()),
            first_attention_area: lanelets.first_attention_area.clone(),
            intersection_area: get_intersection_area(assigned, map),
            ..Default::default()
        };

        let mut stuck_detected = false;
        let path_lanelets = lanelets.first_conflicting_area.as_ref().and_then(|first| {
            generate_path_lanelets(
                map,
                &lanelets_on_path,
                &path_info,
                first,
                &lanelets.conflicting.areas,
                lanelets.first_attention_area.as_ref(),
                &attention.areas,
                closest_idx,
                cfg.vehicle.vehicle_width,
            )
        });
        if let Some(ref path_lanelets) = path_lanelets {
            debug.ego_lane = Some(path_lanelets.ego_or_entry2exit.polygon().clone());
            if let Some(area) = generate_stuck_vehicle_detect_area_polygon(
                path_lanelets,
                cfg.stuck_vehicle.stuck_vehicle_detect_dist,
            ) {
                let targets: Vec<&Lanelet> = path_lanelets.all.iter().collect();
                stuck_detected = check_stuck_vehicle_in_intersection(
                    input.objects,
                    &area,
                    cfg.stuck_vehicle.stuck_vehicle_velocity_threshold,
                    &targets,
                    cfg,
                    &mut debug,
                );
                debug.stuck_vehicle_detect_area = Some(area);
            }
        }

        let mut objects = input.objects.clone();
        cut_predicted_path_with_duration(
            &mut objects,
            input.now,
            cfg.collision_detection.predicted_path_horizon,
        );
        let attention_targets: Vec<ObjectID> =
            filter_attention_targets(&objects, &attention.lanelets(map), cfg, &mut debug)
                .into_iter()
                .map(|obj| obj.id)
                .collect();

        let mut nearest_occlusion = None;
        if cfg.occlusion.enable
            && traffic_prioritized_level != TrafficPrioritizedLevel::FullyPrioritized
        {
            let lanes = generate_detection_lane_divisions(
                &lanelets.occlusion_attention(view).ids,
                map,
                cfg.occlusion.resolution,
            )
            .with_context(|| format!("discretizing the attention lanes of {}", self.lane_id))?;
            let obstacles: Vec<Polygon> = objects
                .objects
                .iter()
                .filter_map(|obj| obj.footprint())
                .collect();
            nearest_occlusion = find_nearest_occlusion_projection(
                &lanes,
                &obstacles,
                input.ego.pose.pos,
                cfg.occlusion.sensing_range,
                &path.to_polyline()?,
                &mut debug,
            );
        }

        let last_idx = [
            stop_lines.stuck_stop_line,
            stop_lines.default_stop_line,
            stop_lines.first_attention_stop_line,
            stop_lines.occlusion_peeking_stop_line,
        ]
        .iter()
        .flatten()
        .max()
        .copied()
        .unwrap_or(path_info.lane_id_interval.1);
        let time_distance = calc_intersection_passing_time(
            path,
            closest_idx,
            last_idx,
            &PassingTimeParams::new(cfg, input.ego.velocity),
        );

        let wall = |idx: Option<usize>| idx.map(|i| path.points[i].pose);
        if stuck_detected {
            debug.stuck_stop_wall_pose = wall(stop_lines.stuck_stop_line);
        }
        debug.collision_stop_wall_pose = wall(stop_lines.default_stop_line);
        debug.occlusion_first_stop_wall_pose = wall(stop_lines.first_attention_stop_line);
        debug.occlusion_stop_wall_pose = wall(stop_lines.occlusion_peeking_stop_line);
        debug.pass_judge_wall_pose = wall(Some(stop_lines.pass_judge_line));

        let distance_to_intersection =
            calc_distance_until_intersection_lanelet(assigned, path, closest_idx);
        let over_pass_judge_line = is_over_target_index(
            path,
            closest_idx,
            &input.ego.pose,
            stop_lines.pass_judge_line,
        );
        debug!(
            "{}: {:?}, stuck {}, {} attention targets, {} to go",
            self.lane_id,
            traffic_prioritized_level,
            stuck_detected,
            attention_targets.len(),
            distance_to_intersection
        );

        Ok(Some(CycleOutput {
            path: path_info.path.clone(),
            stop_lines,
            traffic_prioritized_level,
            stuck_detected,
            attention_targets,
            nearest_occlusion,
            time_distance,
            distance_to_intersection,
            over_pass_judge_line,
            debug,
        }))
    }
}
