//! Core types for the dispatch simulation

use std::fmt;

/// A single (row, col) cell coordinate on the city grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Chebyshev (king-move) distance between two cells
    pub fn chebyshev(&self, other: &Position) -> usize {
        self.row.abs_diff(other.row).max(self.col.abs_diff(other.col))
    }

    /// Manhattan distance between two cells
    pub fn manhattan(&self, other: &Position) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }

    /// The four cells of the 2x2 block anchored here, in row-major order
    pub fn block(&self) -> [Position; 4] {
        [
            Position::new(self.row, self.col),
            Position::new(self.row, self.col + 1),
            Position::new(self.row + 1, self.col),
            Position::new(self.row + 1, self.col + 1),
        ]
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Ordered sequence of cells from start to goal, both inclusive.
/// An empty path means no route exists.
pub type Path = Vec<Position>;

/// What occupies a grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CellKind {
    #[default]
    Road,
    GreyObstacle,
    House,
    Firetruck,
    Hospital,
    GreenObstacle,
    Tree,
    Garden,
}

impl CellKind {
    /// Only roads can be driven through; every other kind is entered only as a goal
    pub fn is_drivable(self) -> bool {
        matches!(self, CellKind::Road)
    }

    /// Single-character map glyph, also used by `GridModel::from_rows`
    pub fn glyph(self) -> char {
        match self {
            CellKind::Road => '.',
            CellKind::GreyObstacle => '#',
            CellKind::House => 'H',
            CellKind::Firetruck => 'F',
            CellKind::Hospital => '+',
            CellKind::GreenObstacle => '%',
            CellKind::Tree => 'T',
            CellKind::Garden => 'g',
        }
    }

    pub fn from_glyph(glyph: char) -> Option<Self> {
        let kind = match glyph {
            '.' => CellKind::Road,
            '#' => CellKind::GreyObstacle,
            'H' => CellKind::House,
            'F' => CellKind::Firetruck,
            '+' => CellKind::Hospital,
            '%' => CellKind::GreenObstacle,
            'T' => CellKind::Tree,
            'g' => CellKind::Garden,
            _ => return None,
        };
        Some(kind)
    }
}

/// The two fixed facility types in every city
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FacilityKind {
    /// Fire station, home of the truck
    Station,
    /// Hospital, home of the ambulance
    Hospital,
}

impl FacilityKind {
    /// Cell kind stamped onto the grid for this facility's block
    pub fn cell_kind(self) -> CellKind {
        match self {
            FacilityKind::Station => CellKind::Firetruck,
            FacilityKind::Hospital => CellKind::Hospital,
        }
    }
}

/// A fixed 2x2 facility block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Facility {
    pub kind: FacilityKind,
    pub anchor: Position,
}

impl Facility {
    pub fn new(kind: FacilityKind, anchor: Position) -> Self {
        Self { kind, anchor }
    }

    /// Occupied cells in row-major scan order
    pub fn cells(&self) -> [Position; 4] {
        self.anchor.block()
    }
}
