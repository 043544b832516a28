//! The already-structured HD map consumed by the intersection engine: lanelets with their
//! boundaries and traffic rules, plus a routing graph answering topology queries.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod lanelet;
mod map;
mod routing;

pub use crate::lanelet::{
    polygon_from_arc_length, AreaID, Lanelet, LaneletID, TrafficLightID, TurnDirection,
};
pub use crate::map::LaneletMap;
pub use crate::routing::{Relation, RoutingGraph};
