use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;

use geom::{Distance, Polygon};
use lanelet_map::{polygon_from_arc_length, Lanelet, LaneletID, LaneletMap, TurnDirection};

use crate::stop_lines::get_first_point_inside_polygons;
use crate::traffic::{has_associated_traffic_light, TrafficPrioritizedLevel};
use crate::InterpolatedPathInfo;

/// Some lanelets along with the areas to check for them. There may be more areas than lanelets
/// when an area covers a lanelet joined with its upstream neighbors.
#[derive(Clone, Debug, Default)]
pub struct LaneletSet {
    pub ids: Vec<LaneletID>,
    pub areas: Vec<Polygon>,
}

impl LaneletSet {
    fn from_lanelets(map: &LaneletMap, ids: Vec<LaneletID>) -> LaneletSet {
        let areas = ids.iter().map(|id| map.get_l(*id).polygon().clone()).collect();
        LaneletSet { ids, areas }
    }

    pub fn lanelets<'a>(&self, map: &'a LaneletMap) -> Vec<&'a Lanelet> {
        self.ids.iter().map(|id| map.get_l(*id)).collect()
    }
}

/// Which attention lanelets matter this cycle. Chosen once from the signal state and passed to
/// everything reading attention areas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttentionView {
    /// Everything conflicting, plus upstream lanelets feeding into it.
    All,
    /// When the ego vehicle has the right-of-way, traffic still upstream will stop, so only the
    /// conflicting lanelets themselves matter.
    NonPreceding,
}

impl AttentionView {
    pub fn for_priority(level: TrafficPrioritizedLevel) -> AttentionView {
        if level == TrafficPrioritizedLevel::FullyPrioritized {
            AttentionView::NonPreceding
        } else {
            AttentionView::All
        }
    }
}

/// Lanelets around one intersection, classified relative to the ego's assigned lanelet.
#[derive(Clone, Debug)]
pub struct IntersectionLanelets {
    pub attention: LaneletSet,
    pub attention_non_preceding: LaneletSet,
    pub conflicting: LaneletSet,
    pub adjacent: LaneletSet,
    pub occlusion_attention: LaneletSet,
    /// The conflicting area the path enters first.
    pub first_conflicting_area: Option<Polygon>,
    /// The non-preceding attention area the path enters first.
    pub first_attention_area: Option<Polygon>,
}

impl IntersectionLanelets {
    pub fn attention(&self, view: AttentionView) -> &LaneletSet {
        match view {
            AttentionView::All => &self.attention,
            AttentionView::NonPreceding => &self.attention_non_preceding,
        }
    }

    pub fn occlusion_attention(&self, view: AttentionView) -> &LaneletSet {
        match view {
            AttentionView::All => &self.occlusion_attention,
            AttentionView::NonPreceding => &self.attention_non_preceding,
        }
    }

    /// Finds the first conflicting and attention areas along the path, but only fills in the
    /// ones not already known.
    pub fn update(&mut self, path_info: &InterpolatedPathInfo) {
        if self.first_conflicting_area.is_none() {
            self.first_conflicting_area = first_area_along(&self.conflicting.areas, path_info);
        }
        if self.first_attention_area.is_none() {
            self.first_attention_area =
                first_area_along(&self.attention_non_preceding.areas, path_info);
        }
    }
}

fn first_area_along(areas: &[Polygon], path_info: &InterpolatedPathInfo) -> Option<Polygon> {
    let (_, idx) = get_first_point_inside_polygons(
        &path_info.path,
        path_info.lane_id_interval,
        areas,
        true,
    )?;
    Some(areas[idx].clone())
}

/// Remembers the first conflicting and attention areas for each set of associative lanelets.
/// Once an area is known for a set, it never changes, so stop lines don't jump around when the
/// live attention set shifts between cycles.
#[derive(Default)]
pub struct FirstAreaCache {
    entries: BTreeMap<BTreeSet<LaneletID>, FirstAreas>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FirstAreas {
    pub conflicting: Option<Polygon>,
    pub attention: Option<Polygon>,
}

impl FirstAreaCache {
    /// Restores any remembered first areas into `lanelets`, computes the missing ones, and
    /// remembers those.
    pub fn apply(&mut self, lanelets: &mut IntersectionLanelets, path_info: &InterpolatedPathInfo) {
        let entry = self
            .entries
            .entry(path_info.associative_lane_ids.clone())
            .or_default();
        if entry.conflicting.is_some() {
            lanelets.first_conflicting_area = entry.conflicting.clone();
        }
        if entry.attention.is_some() {
            lanelets.first_attention_area = entry.attention.clone();
        }
        let was_empty = entry.conflicting.is_none() && entry.attention.is_none();

        lanelets.update(path_info);
        entry.conflicting = lanelets.first_conflicting_area.clone();
        entry.attention = lanelets.first_attention_area.clone();
        if was_empty && (entry.conflicting.is_some() || entry.attention.is_some()) {
            info!(
                "Found the first conflicting/attention areas for {:?}",
                path_info.associative_lane_ids
            );
        }
    }

    pub fn get(&self, associative_lane_ids: &BTreeSet<LaneletID>) -> Option<&FirstAreas> {
        self.entries.get(associative_lane_ids)
    }
}

/// Classifies the lanelets around the ego vehicle's assigned intersection lanelet.
///
/// - Ego lanelets are the predecessors of the assigned lanelet and everything following them,
///   meaning every lanelet branching from the same entry.
/// - Conflicting lanelets overlap the assigned one, excluding ego lanelets.
/// - Attention lanelets are the conflicting ones the ego vehicle must watch. Lanelets that must
///   yield to the assigned one are skipped, and nothing is watched when going straight under a
///   traffic light. The attention set also includes upstream lanelets up to
///   `detection_area_length`.
/// - Adjacent lanelets are the other associative lanelets and the assigned lanelet's
///   neighbors, as long as they don't conflict.
pub fn get_objective_lanelets(
    map: &LaneletMap,
    assigned: LaneletID,
    lanelets_on_path: &[LaneletID],
    associative_ids: &BTreeSet<LaneletID>,
    detection_area_length: Distance,
    occlusion_detection_area_length: Distance,
    consider_wrong_direction_vehicle: bool,
) -> Result<IntersectionLanelets> {
    let assigned_lanelet = map
        .maybe_get_l(assigned)
        .ok_or_else(|| anyhow!("{} isn't in the map", assigned))?;
    let routing = map.routing();

    let mut yield_lanelets: BTreeSet<LaneletID> = BTreeSet::new();
    for id in &assigned_lanelet.yield_lanelets {
        yield_lanelets.insert(*id);
        yield_lanelets.extend(routing.previous(*id));
    }

    let mut ego_lanelets: BTreeSet<LaneletID> = BTreeSet::new();
    for prev in routing.previous(assigned) {
        ego_lanelets.insert(prev);
        ego_lanelets.extend(routing.following(prev));
    }
    ego_lanelets.insert(assigned);
    ego_lanelets.extend(lanelets_on_path.iter().cloned());

    let raw_conflicting = routing.conflicting(assigned);
    let conflicting: Vec<LaneletID> = raw_conflicting
        .iter()
        .filter(|id| !ego_lanelets.contains(id))
        .cloned()
        .collect();

    let straight_under_light = assigned_lanelet.turn_direction == TurnDirection::Straight
        && has_associated_traffic_light(assigned_lanelet);
    let detection: Vec<LaneletID> = if straight_under_light {
        Vec::new()
    } else if consider_wrong_direction_vehicle {
        let mut candidates: Vec<LaneletID> = Vec::new();
        for id in &raw_conflicting {
            for candidate in std::iter::once(*id)
                .chain(routing.following(*id))
                .chain(routing.previous(*id))
            {
                if candidate != assigned
                    && !yield_lanelets.contains(&candidate)
                    && !candidates.contains(&candidate)
                {
                    candidates.push(candidate);
                }
            }
        }
        candidates
    } else {
        conflicting
            .iter()
            .filter(|id| !yield_lanelets.contains(id))
            .cloned()
            .collect()
    };

    let attention = with_preceding(map, &detection, detection_area_length, &ego_lanelets);
    let occlusion_attention =
        with_preceding(map, &detection, occlusion_detection_area_length, &ego_lanelets);

    let mut adjacent: Vec<LaneletID> = Vec::new();
    for id in associative_ids
        .iter()
        .cloned()
        .chain(routing.besides(assigned))
    {
        if id != assigned
            && !raw_conflicting.contains(&id)
            && !adjacent.contains(&id)
            && map.maybe_get_l(id).is_some()
        {
            adjacent.push(id);
        }
    }

    debug!(
        "{}: {} conflicting, {} attention, {} adjacent lanelets",
        assigned,
        conflicting.len(),
        attention.ids.len(),
        adjacent.len()
    );
    Ok(IntersectionLanelets {
        attention,
        attention_non_preceding: LaneletSet::from_lanelets(map, detection),
        conflicting: LaneletSet::from_lanelets(map, conflicting),
        adjacent: LaneletSet::from_lanelets(map, adjacent),
        occlusion_attention,
        first_conflicting_area: None,
        first_attention_area: None,
    })
}

/// Each detection lanelet joined with every upstream sequence feeding it. The areas reach
/// `length` upstream from the start of the detection lanelet.
fn with_preceding(
    map: &LaneletMap,
    detection: &[LaneletID],
    length: Distance,
    exclude: &BTreeSet<LaneletID>,
) -> LaneletSet {
    let mut result = LaneletSet::default();
    for id in detection {
        let mut sequences = map.preceding_sequences(*id, length, exclude);
        if sequences.is_empty() {
            sequences.push(Vec::new());
        }
        for seq in sequences {
            // Upstream first
            let mut chain: Vec<&Lanelet> = seq.iter().rev().map(|id| map.get_l(*id)).collect();
            chain.push(map.get_l(*id));
            for l in &chain {
                if !result.ids.contains(&l.id) {
                    result.ids.push(l.id);
                }
            }

            let total: Distance = chain.iter().map(|l| l.length()).sum();
            let start = total - map.get_l(*id).length() - length;
            match polygon_from_arc_length(&chain, start, total) {
                Some(poly) => result.areas.push(poly),
                None => {
                    warn!("Couldn't build the attention area upstream of {}", id);
                    result.areas.push(map.get_l(*id).polygon().clone());
                }
            }
        }
    }
    result
}
