use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;

use geom::{Distance, Polygon};

use crate::{AreaID, Lanelet, LaneletID, RoutingGraph};

/// An immutable snapshot of the map around the ego vehicle. A new map replaces this wholesale.
pub struct LaneletMap {
    lanelets: BTreeMap<LaneletID, Lanelet>,
    intersection_areas: BTreeMap<AreaID, Polygon>,
    routing: RoutingGraph,
}

impl LaneletMap {
    /// Checks that every reference between lanelets and areas resolves, then derives the
    /// routing graph.
    pub fn new(
        input: Vec<Lanelet>,
        intersection_areas: BTreeMap<AreaID, Polygon>,
    ) -> Result<LaneletMap> {
        let mut lanelets = BTreeMap::new();
        for l in input {
            let id = l.id;
            if lanelets.insert(id, l).is_some() {
                bail!("{} is defined twice", id);
            }
        }
        for l in lanelets.values() {
            for other in &l.yield_lanelets {
                if !lanelets.contains_key(other) {
                    bail!("{} has right-of-way over {}, which doesn't exist", l.id, other);
                }
            }
            if let Some(area) = l.intersection_area {
                if !intersection_areas.contains_key(&area) {
                    bail!("{} belongs to {}, which doesn't exist", l.id, area);
                }
            }
        }

        let routing = RoutingGraph::new(&lanelets);
        debug!(
            "Built routing graph for {} lanelets and {} intersection areas",
            lanelets.len(),
            intersection_areas.len()
        );
        Ok(LaneletMap {
            lanelets,
            intersection_areas,
            routing,
        })
    }

    pub fn get_l(&self, id: LaneletID) -> &Lanelet {
        &self.lanelets[&id]
    }

    pub fn maybe_get_l(&self, id: LaneletID) -> Option<&Lanelet> {
        self.lanelets.get(&id)
    }

    pub fn get_area(&self, id: AreaID) -> Option<&Polygon> {
        self.intersection_areas.get(&id)
    }

    pub fn routing(&self) -> &RoutingGraph {
        &self.routing
    }

    /// All sequences of lanelets leading into `id`, walking upstream until each sequence covers
    /// at least `length` or runs out of predecessors. A sequence is listed from its lanelet
    /// closest to `id` going upstream, and never includes `id` itself or anything in `exclude`.
    pub fn preceding_sequences(
        &self,
        id: LaneletID,
        length: Distance,
        exclude: &BTreeSet<LaneletID>,
    ) -> Vec<Vec<LaneletID>> {
        let mut result = Vec::new();
        let mut queue: Vec<(Vec<LaneletID>, Distance)> = vec![(Vec::new(), Distance::ZERO)];
        while let Some((seq, so_far)) = queue.pop() {
            let tip = seq.last().cloned().unwrap_or(id);
            let prev: Vec<LaneletID> = self
                .routing
                .previous(tip)
                .into_iter()
                .filter(|p| *p != id && !exclude.contains(p) && !seq.contains(p))
                .collect();
            if so_far >= length || prev.is_empty() {
                if !seq.is_empty() {
                    result.push(seq);
                }
                continue;
            }
            for p in prev {
                let mut next = seq.clone();
                next.push(p);
                queue.push((next, so_far + self.get_l(p).length()));
            }
        }
        result.sort();
        result
    }
}
