use std::fmt;

use serde::{Deserialize, Serialize};

/// An angle, stored in radians. Zero points along +x, positive rotates counter-clockwise.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Angle(f64);

impl Angle {
    pub const ZERO: Angle = Angle(0.0);

    pub fn new_rads(rads: f64) -> Angle {
        if !rads.is_finite() {
            panic!("Bad Angle {}", rads);
        }
        Angle(rads)
    }

    pub fn degrees(degs: f64) -> Angle {
        Angle::new_rads(degs.to_radians())
    }

    pub fn opposite(self) -> Angle {
        Angle(self.0 + std::f64::consts::PI)
    }

    pub fn rotate_degs(self, degrees: f64) -> Angle {
        Angle(self.0 + degrees.to_radians())
    }

    /// In [0, 2pi)
    pub fn normalized_radians(self) -> f64 {
        self.0.rem_euclid(2.0 * std::f64::consts::PI)
    }

    /// In [0, 360)
    pub fn normalized_degrees(self) -> f64 {
        self.normalized_radians().to_degrees()
    }

    /// The signed rotation needed to get from self to other, in (-pi, pi].
    pub fn shortest_rotation_towards(self, other: Angle) -> f64 {
        let diff = (other.0 - self.0).rem_euclid(2.0 * std::f64::consts::PI);
        if diff > std::f64::consts::PI {
            diff - 2.0 * std::f64::consts::PI
        } else {
            diff
        }
    }

    /// True if the two angles are within `threshold` radians of each other, in either rotation
    /// direction.
    pub fn approx_eq(self, other: Angle, threshold: f64) -> bool {
        self.shortest_rotation_towards(other).abs() < threshold
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Angle({} degrees)", self.normalized_degrees())
    }
}
