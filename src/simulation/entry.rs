//! Entry-cell selection for 2x2 facilities

use super::road_network::RoadNetwork;
use super::types::{Facility, Path, Position};

/// The facility cell a vehicle leaves from, with the route it produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryChoice {
    pub cell: Position,
    pub path: Path,
}

impl EntryChoice {
    pub fn is_reachable(&self) -> bool {
        !self.path.is_empty()
    }
}

fn route_cost(path: &Path) -> usize {
    if path.is_empty() {
        usize::MAX
    } else {
        path.len()
    }
}

/// Pick the facility cell with the shortest route to `goal`.
///
/// Unreachable cells cost infinity. Ties go to the first cell in row-major
/// block order, so when nothing is reachable the anchor is returned with an
/// empty path.
pub fn select_best_entry(roads: &RoadNetwork, facility: &Facility, goal: Position) -> EntryChoice {
    let cells = facility.cells();
    let mut best = EntryChoice {
        cell: cells[0],
        path: roads.find_path(cells[0], goal),
    };

    for cell in cells.into_iter().skip(1) {
        let path = roads.find_path(cell, goal);
        if route_cost(&path) < route_cost(&best.path) {
            best = EntryChoice { cell, path };
        }
    }

    best
}
