//! Lane graph and precomputed routes
//!
//! Entry points, turn points and exit points form a small directed graph.
//! Every movement (entry side + turn) is resolved once with A* and the
//! resulting waypoint sequence is shared by every vehicle that takes it.

use anyhow::{Context, Result};
use petgraph::algo::astar;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;
use std::sync::Arc;

use super::types::{Approach, Position, RoadClass, Route, TurnKind, Waypoint};

/// Flat cost added per edge so a straight run beats a collinear detour
const HOP_COST: u32 = 1;

/// An entry side combined with the manoeuvre taken there
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Movement {
    pub approach: Approach,
    pub turn: TurnKind,
}

impl Movement {
    pub fn new(approach: Approach, turn: TurnKind) -> Self {
        Self { approach, turn }
    }

    pub fn exit(&self) -> Approach {
        self.approach.exit_for(self.turn)
    }

    /// Movements a vehicle of the given class may be assigned when entering
    /// from `approach`. The through road carries straight traffic only.
    pub fn options(class: RoadClass, approach: Approach) -> Vec<Movement> {
        match class {
            RoadClass::Primary => vec![Movement::new(approach, TurnKind::Straight)],
            RoadClass::Secondary => [TurnKind::Straight, TurnKind::Right, TurnKind::Left]
                .into_iter()
                .map(|turn| Movement::new(approach, turn))
                .collect(),
        }
    }
}

/// Where vehicles appear for each side
pub fn entry_point(approach: Approach) -> Waypoint {
    match approach {
        Approach::North => Position::new(410.0, -100.0),
        Approach::South => Position::new(490.0, 750.0),
        Approach::West => Position::new(-100.0, 365.0),
        Approach::East => Position::new(1000.0, 285.0),
    }
}

/// Where vehicles leave for each side
pub fn exit_point(side: Approach) -> Waypoint {
    match side {
        Approach::North => Position::new(490.0, -200.0),
        Approach::South => Position::new(410.0, 900.0),
        Approach::West => Position::new(-200.0, 285.0),
        Approach::East => Position::new(1100.0, 365.0),
    }
}

/// Point inside the box where a turning vehicle changes lane axis
fn turn_point(movement: Movement) -> Option<Waypoint> {
    use Approach::*;
    let point = match (movement.approach, movement.turn) {
        (_, TurnKind::Straight) => return None,
        (North, TurnKind::Right) => Position::new(410.0, 285.0),
        (North, TurnKind::Left) => Position::new(410.0, 365.0),
        (South, TurnKind::Right) => Position::new(490.0, 365.0),
        (South, TurnKind::Left) => Position::new(490.0, 285.0),
        (West, TurnKind::Right) => Position::new(410.0, 365.0),
        (West, TurnKind::Left) => Position::new(490.0, 365.0),
        (East, TurnKind::Right) => Position::new(490.0, 285.0),
        (East, TurnKind::Left) => Position::new(410.0, 285.0),
    };
    Some(point)
}

fn all_movements() -> impl Iterator<Item = Movement> {
    Approach::ALL.into_iter().flat_map(|approach| {
        [TurnKind::Straight, TurnKind::Right, TurnKind::Left]
            .into_iter()
            .map(move |turn| Movement::new(approach, turn))
    })
}

/// Directed graph of lane connections
#[derive(Debug, Default)]
pub struct LaneGraph {
    graph: DiGraph<Waypoint, u32>,
    nodes: Vec<(Waypoint, NodeIndex)>,
}

impl LaneGraph {
    /// Graph for the standard layout, one connector per legal movement
    pub fn standard() -> Self {
        let mut lanes = Self::default();
        for movement in all_movements() {
            let entry = entry_point(movement.approach);
            let exit = exit_point(movement.exit());
            match turn_point(movement) {
                Some(via) => {
                    lanes.connect(entry, via);
                    lanes.connect(via, exit);
                }
                None => lanes.connect(entry, exit),
            }
        }
        lanes
    }

    fn node(&mut self, point: Waypoint) -> NodeIndex {
        if let Some((_, index)) = self.nodes.iter().find(|(p, _)| *p == point) {
            return *index;
        }
        let index = self.graph.add_node(point);
        self.nodes.push((point, index));
        index
    }

    fn find_node(&self, point: &Waypoint) -> Option<NodeIndex> {
        self.nodes
            .iter()
            .find(|(p, _)| p == point)
            .map(|(_, index)| *index)
    }

    /// Adds a one-way connector between two points
    pub fn connect(&mut self, from: Waypoint, to: Waypoint) {
        let a = self.node(from);
        let b = self.node(to);
        if self.graph.find_edge(a, b).is_some() {
            return;
        }
        // Scaled by 100 to keep integer weights precise
        let weight = (from.distance(&to) * 100.0) as u32 + HOP_COST;
        self.graph.add_edge(a, b, weight);
    }

    /// Shortest waypoint sequence between two points, both ends included
    pub fn find_path(&self, from: &Waypoint, to: &Waypoint) -> Option<Vec<Waypoint>> {
        let start = self.find_node(from)?;
        let goal = self.find_node(to)?;
        let target = self.graph[goal];

        let (_, node_path) = astar(
            &self.graph,
            start,
            |node| node == goal,
            |edge| *edge.weight(),
            |node| (self.graph[node].distance(&target) * 100.0) as u32,
        )?;

        Some(node_path.into_iter().map(|node| self.graph[node]).collect())
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

/// Every movement resolved to a shared route
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: HashMap<Movement, Arc<Route>>,
}

impl RouteTable {
    pub fn standard() -> Result<Self> {
        Self::from_graph(&LaneGraph::standard())
    }

    pub fn from_graph(lanes: &LaneGraph) -> Result<Self> {
        let mut routes = HashMap::new();
        for movement in all_movements() {
            let entry = entry_point(movement.approach);
            let exit = exit_point(movement.exit());
            let path = lanes
                .find_path(&entry, &exit)
                .with_context(|| format!("No lane path for {:?}", movement))?;
            routes.insert(movement, Route::new(path));
        }
        Ok(Self { routes })
    }

    pub fn get(&self, movement: Movement) -> Option<Arc<Route>> {
        self.routes.get(&movement).cloned()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
