use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use geom::{Angle, Distance, Duration, Speed};

/// Tunable parameters for one intersection instance. Every section falls back to defaults, so a
/// JSON file only needs to list the values it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct IntersectionConfig {
    pub common: CommonConfig,
    pub stuck_vehicle: StuckVehicleConfig,
    pub occlusion: OcclusionConfig,
    pub collision_detection: CollisionDetectionConfig,
    pub vehicle: VehicleConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommonConfig {
    /// The path is resampled at this interval before anything else happens.
    pub path_interpolation_ds: Distance,
    /// Distance kept between the front of the vehicle and an area it must not enter.
    pub stop_line_margin: Distance,
    /// How far upstream conflicting lanes are attended.
    pub attention_area_length: Distance,
    /// Objects this close to an attention lanelet count as being on it.
    pub attention_area_margin: Distance,
    /// Maximum difference between an object's heading and its lane's direction.
    pub attention_area_angle_threshold: Angle,
    pub consider_wrong_direction_vehicle: bool,
    /// Stop at the very start of the intersection lane when a vehicle is stuck, instead of
    /// just before the conflicting area.
    pub use_stuck_stopline: bool,
}

impl Default for CommonConfig {
    fn default() -> CommonConfig {
        CommonConfig {
            path_interpolation_ds: Distance::meters(0.1),
            stop_line_margin: Distance::meters(3.0),
            attention_area_length: Distance::meters(200.0),
            attention_area_margin: Distance::meters(0.75),
            attention_area_angle_threshold: Angle::degrees(45.0),
            consider_wrong_direction_vehicle: false,
            use_stuck_stopline: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StuckVehicleConfig {
    /// The detection area extends this far past the conflicting part of the path.
    pub stuck_vehicle_detect_dist: Distance,
    /// Vehicles at or below this speed are considered stopped.
    pub stuck_vehicle_velocity_threshold: Speed,
}

impl Default for StuckVehicleConfig {
    fn default() -> StuckVehicleConfig {
        StuckVehicleConfig {
            stuck_vehicle_detect_dist: Distance::meters(3.0),
            stuck_vehicle_velocity_threshold: Speed::km_per_hour(3.0),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcclusionConfig {
    pub enable: bool,
    pub occlusion_attention_area_length: Distance,
    /// How far past the first attention entry the vehicle may creep to get a better view.
    pub peeking_offset: Distance,
    /// Spacing of the cross-sections sampled across attention lanes, and of the points along
    /// each one.
    pub resolution: Distance,
    /// Anything farther than this from the ego vehicle can't be seen.
    pub sensing_range: Distance,
}

impl Default for OcclusionConfig {
    fn default() -> OcclusionConfig {
        OcclusionConfig {
            enable: true,
            occlusion_attention_area_length: Distance::meters(70.0),
            peeking_offset: Distance::meters(1.0),
            resolution: Distance::meters(0.5),
            sensing_range: Distance::meters(50.0),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionDetectionConfig {
    /// The ego vehicle is assumed to start moving after this long.
    pub start_delay: Duration,
    pub intersection_velocity: Speed,
    /// Floor used when estimating how long each path segment takes.
    pub minimum_ego_velocity: Speed,
    /// Follow the velocities already planned upstream instead of the ramp.
    pub use_upstream_velocity: bool,
    pub minimum_upstream_velocity: Speed,
    /// m/s^2 used to ramp from the current velocity to the intersection velocity. Zero means
    /// the intersection velocity is used right away.
    pub ramp_acceleration: f64,
    /// Predicted paths of other objects are cut to this horizon.
    pub predicted_path_horizon: Duration,
}

impl Default for CollisionDetectionConfig {
    fn default() -> CollisionDetectionConfig {
        CollisionDetectionConfig {
            start_delay: Duration::seconds(1.0),
            intersection_velocity: Speed::km_per_hour(10.0),
            minimum_ego_velocity: Speed::km_per_hour(5.0),
            use_upstream_velocity: false,
            minimum_upstream_velocity: Speed::meters_per_second(0.01),
            ramp_acceleration: 0.5,
            predicted_path_horizon: Duration::seconds(15.0),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleConfig {
    /// From the reference point on the rear axle to the front bumper.
    pub base_link_to_front: Distance,
    /// Lanelets synthesized from the path are this wide.
    pub vehicle_width: Distance,
}

impl Default for VehicleConfig {
    fn default() -> VehicleConfig {
        VehicleConfig {
            base_link_to_front: Distance::meters(4.0),
            vehicle_width: Distance::meters(1.9),
        }
    }
}

impl IntersectionConfig {
    pub fn from_json(raw: &str) -> Result<IntersectionConfig> {
        let cfg: IntersectionConfig =
            serde_json::from_str(raw).context("parsing IntersectionConfig")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.common.path_interpolation_ds <= Distance::ZERO {
            bail!(
                "path_interpolation_ds must be positive, not {}",
                self.common.path_interpolation_ds
            );
        }
        if self.occlusion.resolution <= Distance::ZERO {
            bail!("occlusion resolution must be positive, not {}", self.occlusion.resolution);
        }
        if self.collision_detection.minimum_ego_velocity <= Speed::ZERO {
            bail!(
                "minimum_ego_velocity must be positive, not {}",
                self.collision_detection.minimum_ego_velocity
            );
        }
        if self.collision_detection.intersection_velocity <= Speed::ZERO {
            bail!(
                "intersection_velocity must be positive, not {}",
                self.collision_detection.intersection_velocity
            );
        }
        if self.collision_detection.ramp_acceleration < 0.0 {
            bail!(
                "ramp_acceleration can't be negative, got {}",
                self.collision_detection.ramp_acceleration
            );
        }
        if self.vehicle.vehicle_width <= Distance::ZERO {
            bail!("vehicle_width must be positive, not {}", self.vehicle.vehicle_width);
        }
        if self.common.stop_line_margin < Distance::ZERO
            || self.vehicle.base_link_to_front < Distance::ZERO
            || self.occlusion.peeking_offset < Distance::ZERO
        {
            bail!("stop_line_margin, base_link_to_front, and peeking_offset can't be negative");
        }
        Ok(())
    }
}
