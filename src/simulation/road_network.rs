//! Drivable-cell graph for pathfinding
//!
//! Every grid cell is a node. A directed edge `a -> b` exists when `b` is a
//! 4-connected neighbour of `a` and `b` is road, so a route may leave any cell
//! (a facility or a house) but only ever passes through road. The goal cell is
//! always enterable: the search stops on the goal or on any cell next to it
//! and then steps into the goal, which leaves the rest of the goal's block
//! closed.

use petgraph::algo::astar;
use petgraph::graph::{DiGraph, NodeIndex};

use super::grid::GridModel;
use super::types::{Path, Position};

/// Cost of moving to an adjacent cell
pub const STEP_COST: u32 = 1;

/// Standalone road graph built once per city grid
#[derive(Debug, Clone)]
pub struct RoadNetwork {
    /// Directed graph over all cells, edges point into road cells only
    graph: DiGraph<Position, u32>,

    /// Row-major cell index to node index
    nodes: Vec<NodeIndex>,

    size: usize,
}

impl RoadNetwork {
    pub fn from_grid(grid: &GridModel) -> Self {
        let size = grid.size();
        let mut graph = DiGraph::with_capacity(size * size, size * size * 4);
        let nodes: Vec<NodeIndex> = grid.positions().map(|pos| graph.add_node(pos)).collect();

        for from in grid.positions() {
            for to in grid.neighbors4(from) {
                if grid.get(to).is_some_and(|kind| kind.is_drivable()) {
                    graph.add_edge(nodes[grid.index(from)], nodes[grid.index(to)], STEP_COST);
                }
            }
        }

        Self { graph, nodes, size }
    }

    fn node(&self, pos: Position) -> Option<NodeIndex> {
        (pos.row < self.size && pos.col < self.size).then(|| self.nodes[pos.row * self.size + pos.col])
    }

    /// Shortest path from `start` to `goal`, both inclusive.
    ///
    /// Uses A* with a null heuristic (Dijkstra). Returns an empty path when
    /// the goal is unreachable or either endpoint is off the grid.
    pub fn find_path(&self, start: Position, goal: Position) -> Path {
        let (Some(start_node), Some(_)) = (self.node(start), self.node(goal)) else {
            return Vec::new();
        };

        if start == goal {
            return vec![start];
        }

        let result = astar(
            &self.graph,
            start_node,
            |node| self.graph[node].manhattan(&goal) <= 1,
            |edge| *edge.weight(),
            |_| 0,
        );

        let Some((_, node_path)) = result else {
            return Vec::new();
        };

        let mut path: Path = node_path.iter().map(|node| self.graph[*node]).collect();
        if path.last() != Some(&goal) {
            path.push(goal);
        }
        path
    }

    /// Number of moves on the shortest route, if one exists
    pub fn distance(&self, start: Position, goal: Position) -> Option<usize> {
        let path = self.find_path(start, goal);
        (!path.is_empty()).then(|| path.len() - 1)
    }

    /// Number of directed moves in the graph
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}
