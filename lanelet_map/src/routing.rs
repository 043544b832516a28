use std::collections::{BTreeMap, BTreeSet};

use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;

use geom::Distance;

use crate::{Lanelet, LaneletID};

/// Boundary endpoints closer than this are treated as the same map point.
const CONNECT_THRESHOLD: Distance = Distance::const_meters(0.1);
/// Lanelets must overlap by more than this many square meters to conflict. Neighbors touching
/// along an edge or corner don't count.
const CONFLICT_AREA_THRESHOLD: f64 = 0.1;

/// How one lanelet relates to another. Every edge in the routing graph is one of these.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Relation {
    Successor,
    Left,
    Right,
    Conflicting,
}

/// Topology derived from lanelet geometry: which lanelets follow each other, which run side by
/// side, and which cross.
pub struct RoutingGraph {
    graph: DiGraphMap<LaneletID, Relation>,
}

impl RoutingGraph {
    pub fn new(lanelets: &BTreeMap<LaneletID, Lanelet>) -> RoutingGraph {
        let mut graph = DiGraphMap::new();
        for id in lanelets.keys() {
            graph.add_node(*id);
        }

        for a in lanelets.values() {
            for b in lanelets.values() {
                if a.id == b.id {
                    continue;
                }
                if same_pt(a.left.last_pt(), b.left.first_pt())
                    && same_pt(a.right.last_pt(), b.right.first_pt())
                {
                    graph.add_edge(a.id, b.id, Relation::Successor);
                } else if same_pt(a.left.first_pt(), b.right.first_pt())
                    && same_pt(a.left.last_pt(), b.right.last_pt())
                {
                    graph.add_edge(a.id, b.id, Relation::Left);
                    graph.add_edge(b.id, a.id, Relation::Right);
                }
            }
        }

        let ids: Vec<LaneletID> = lanelets.keys().cloned().collect();
        for (idx, a) in ids.iter().enumerate() {
            for b in &ids[idx + 1..] {
                if graph.contains_edge(*a, *b) || graph.contains_edge(*b, *a) {
                    continue;
                }
                if lanelets[a].polygon().overlap_area(lanelets[b].polygon())
                    > CONFLICT_AREA_THRESHOLD
                {
                    graph.add_edge(*a, *b, Relation::Conflicting);
                    graph.add_edge(*b, *a, Relation::Conflicting);
                }
            }
        }

        RoutingGraph { graph }
    }

    fn related(&self, id: LaneletID, dir: Direction, relation: Relation) -> Vec<LaneletID> {
        if !self.graph.contains_node(id) {
            return Vec::new();
        }
        let mut result: Vec<LaneletID> = self
            .graph
            .neighbors_directed(id, dir)
            .filter(|other| {
                let edge = if dir == Direction::Outgoing {
                    self.graph.edge_weight(id, *other)
                } else {
                    self.graph.edge_weight(*other, id)
                };
                edge == Some(&relation)
            })
            .collect();
        result.sort();
        result
    }

    pub fn following(&self, id: LaneletID) -> Vec<LaneletID> {
        self.related(id, Direction::Outgoing, Relation::Successor)
    }

    pub fn previous(&self, id: LaneletID) -> Vec<LaneletID> {
        self.related(id, Direction::Incoming, Relation::Successor)
    }

    /// Lanelets whose area overlaps this one without being connected to it.
    pub fn conflicting(&self, id: LaneletID) -> Vec<LaneletID> {
        self.related(id, Direction::Outgoing, Relation::Conflicting)
    }

    pub fn left(&self, id: LaneletID) -> Option<LaneletID> {
        self.related(id, Direction::Outgoing, Relation::Left).pop()
    }

    pub fn right(&self, id: LaneletID) -> Option<LaneletID> {
        self.related(id, Direction::Outgoing, Relation::Right).pop()
    }

    /// Same-direction neighbors sharing a boundary.
    pub fn besides(&self, id: LaneletID) -> Vec<LaneletID> {
        self.left(id).into_iter().chain(self.right(id)).collect()
    }

    /// Orders some lanelets so that every lanelet comes before its successors.
    pub fn upstream_first(&self, ids: &[LaneletID]) -> Vec<LaneletID> {
        let members: BTreeSet<LaneletID> = ids.iter().cloned().collect();
        let mut subgraph: DiGraphMap<LaneletID, ()> = DiGraphMap::new();
        for id in ids {
            subgraph.add_node(*id);
        }
        for id in ids {
            for next in self.following(*id) {
                if members.contains(&next) {
                    subgraph.add_edge(*id, next, ());
                }
            }
        }
        match petgraph::algo::toposort(&subgraph, None) {
            Ok(order) => order,
            Err(cycle) => {
                warn!(
                    "Lanelets around {} form a cycle; keeping the input order",
                    cycle.node_id()
                );
                ids.to_vec()
            }
        }
    }
}

fn same_pt(a: geom::Pt2D, b: geom::Pt2D) -> bool {
    a.approx_eq(b, CONNECT_THRESHOLD)
}
