use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use geom::Duration;
use lanelet_map::{Lanelet, TrafficLightID};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalColor {
    Red,
    Amber,
    Green,
    White,
    Unknown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalShape {
    Circle,
    LeftArrow,
    RightArrow,
    UpArrow,
    DownArrow,
    Cross,
    Unknown,
}

impl SignalShape {
    pub fn is_arrow(self) -> bool {
        matches!(
            self,
            SignalShape::LeftArrow
                | SignalShape::RightArrow
                | SignalShape::UpArrow
                | SignalShape::DownArrow
        )
    }
}

/// One lamp of a traffic light.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignalElement {
    pub color: SignalColor,
    pub shape: SignalShape,
    pub confidence: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrafficSignal {
    pub light: TrafficLightID,
    pub elements: Vec<SignalElement>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrafficSignalStamped {
    pub stamp: Duration,
    pub signal: TrafficSignal,
}

/// The latest recognized state of every traffic light.
pub type SignalSnapshot = BTreeMap<TrafficLightID, TrafficSignalStamped>;

/// Does the ego vehicle have the right-of-way because conflicting traffic faces a stop signal?
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TrafficPrioritizedLevel {
    /// Conflicting traffic is fully stopped: the light is red, or shows an arrow.
    FullyPrioritized,
    /// Amber; conflicting traffic may still be clearing.
    PartiallyPrioritized,
    /// Green, no light at all, or nothing recognized.
    NotPrioritized,
}

pub fn has_associated_traffic_light(lanelet: &Lanelet) -> bool {
    lanelet.traffic_light.is_some()
}

/// Classifies the light controlling `lanelet`. Missing or unrecognized signals never grant
/// priority.
pub fn get_traffic_prioritized_level(
    lanelet: &Lanelet,
    signals: &SignalSnapshot,
) -> TrafficPrioritizedLevel {
    let light = match lanelet.traffic_light {
        Some(light) => light,
        None => {
            return TrafficPrioritizedLevel::NotPrioritized;
        }
    };
    let stamped = match signals.get(&light) {
        Some(stamped) => stamped,
        None => {
            return TrafficPrioritizedLevel::NotPrioritized;
        }
    };
    if stamped.signal.light != light {
        warn!(
            "Signal snapshot entry for {} actually describes {}; ignoring it",
            light, stamped.signal.light
        );
        return TrafficPrioritizedLevel::NotPrioritized;
    }

    let elements = &stamped.signal.elements;
    if elements.iter().any(|e| e.color == SignalColor::Amber) {
        return TrafficPrioritizedLevel::PartiallyPrioritized;
    }
    if elements
        .iter()
        .any(|e| e.color == SignalColor::Red || e.shape.is_arrow())
    {
        return TrafficPrioritizedLevel::FullyPrioritized;
    }
    TrafficPrioritizedLevel::NotPrioritized
}
