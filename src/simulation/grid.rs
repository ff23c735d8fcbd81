//! The city grid and its named houses
//!
//! A `GridModel` is filled in once by the generator and is read-only after that.
//! Vehicle positions are never written into it.

use anyhow::{bail, Context, Result};

use super::types::{CellKind, Position};

/// Square matrix of cell kinds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridModel {
    size: usize,
    cells: Vec<CellKind>,
}

impl GridModel {
    /// Create a grid where every cell is road
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![CellKind::Road; size * size],
        }
    }

    /// Build a grid from equal-length rows of cell glyphs (see `CellKind::glyph`)
    pub fn from_rows(rows: &[&str]) -> Result<Self> {
        let size = rows.len();
        let mut grid = Self::new(size);

        for (row, line) in rows.iter().enumerate() {
            let glyphs: Vec<char> = line.chars().collect();
            if glyphs.len() != size {
                bail!(
                    "row {} has {} cells, expected {} for a square grid",
                    row,
                    glyphs.len(),
                    size
                );
            }
            for (col, glyph) in glyphs.into_iter().enumerate() {
                let kind = CellKind::from_glyph(glyph)
                    .with_context(|| format!("unknown cell glyph {:?} at ({}, {})", glyph, row, col))?;
                grid.set(Position::new(row, col), kind);
            }
        }

        Ok(grid)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.row < self.size && pos.col < self.size
    }

    /// Cell kind at a position, or None when out of bounds
    pub fn get(&self, pos: Position) -> Option<CellKind> {
        self.in_bounds(pos).then(|| self.cells[self.index(pos)])
    }

    pub(crate) fn set(&mut self, pos: Position, kind: CellKind) {
        let index = self.index(pos);
        self.cells[index] = kind;
    }

    /// Stamp a 2x2 block. Callers check bounds first.
    pub(crate) fn stamp_block(&mut self, anchor: Position, kind: CellKind) {
        for cell in anchor.block() {
            self.set(cell, kind);
        }
    }

    /// Whether the whole 2x2 block anchored at `anchor` is in bounds and road
    pub fn block_is_road(&self, anchor: Position) -> bool {
        anchor
            .block()
            .iter()
            .all(|cell| self.get(*cell) == Some(CellKind::Road))
    }

    /// Flat index used for cell storage and graph node lookup
    pub fn index(&self, pos: Position) -> usize {
        pos.row * self.size + pos.col
    }

    /// In-bounds 4-connected neighbours in right, down, left, up order
    pub fn neighbors4(&self, pos: Position) -> impl Iterator<Item = Position> + '_ {
        let Position { row, col } = pos;
        [
            Some(Position::new(row, col + 1)),
            Some(Position::new(row + 1, col)),
            col.checked_sub(1).map(|c| Position::new(row, c)),
            row.checked_sub(1).map(|r| Position::new(r, col)),
        ]
        .into_iter()
        .flatten()
        .filter(move |p| self.in_bounds(*p))
    }

    /// All positions in row-major order
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.size).flat_map(move |row| (0..self.size).map(move |col| Position::new(row, col)))
    }

    /// Number of cells of the given kind
    pub fn count(&self, kind: CellKind) -> usize {
        self.cells.iter().filter(|cell| **cell == kind).count()
    }
}

/// A named house and the top-left cell of its 2x2 block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct House {
    pub name: String,
    pub anchor: Position,
}

/// Houses of one city, kept in placement order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HouseRegistry {
    houses: Vec<House>,
}

impl HouseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a house. Names are unique; re-registering a name moves it.
    pub fn insert(&mut self, name: impl Into<String>, anchor: Position) {
        let name = name.into();
        match self.houses.iter_mut().find(|house| house.name == name) {
            Some(existing) => existing.anchor = anchor,
            None => self.houses.push(House { name, anchor }),
        }
    }

    pub fn get(&self, name: &str) -> Option<Position> {
        self.houses
            .iter()
            .find(|house| house.name == name)
            .map(|house| house.anchor)
    }

    pub fn iter(&self) -> impl Iterator<Item = &House> {
        self.houses.iter()
    }

    pub fn anchors(&self) -> impl Iterator<Item = Position> + '_ {
        self.houses.iter().map(|house| house.anchor)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.houses.iter().map(|house| house.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.houses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.houses.is_empty()
    }
}
