//! City generation parameters
//!
//! Defaults reproduce the classic 30x30 layout with 25 houses.

use super::types::Position;

/// Default side length of the square grid
pub const DEFAULT_GRID_SIZE: usize = 30;
/// Default number of houses per city
pub const DEFAULT_HOUSE_COUNT: usize = 25;
/// Default number of grey obstacle cells
pub const DEFAULT_GREY_OBSTACLES: usize = 90;
/// Default number of green obstacle cells
pub const DEFAULT_GREEN_OBSTACLES: usize = 30;
/// Inset from each edge when sampling house anchors
pub const DEFAULT_HOUSE_MARGIN: usize = 3;
/// Rejection-sampling ceiling per placement category
pub const DEFAULT_MAX_ATTEMPTS: usize = 100_000;

/// Fixed anchor of the fire station block
pub const STATION_ANCHOR: Position = Position::new(2, 2);

/// Minimum Chebyshev distance (exclusive) between a house anchor and any other anchor
pub const HOUSE_SPACING: usize = 2;
/// Obstacles may not sit within this Chebyshev distance of a house or facility anchor
pub const OBSTACLE_CLEARANCE: usize = 1;

/// Parameters for generating one city
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityConfig {
    pub size: usize,
    pub house_count: usize,
    pub grey_obstacles: usize,
    pub green_obstacles: usize,
    pub house_margin: usize,
    pub max_attempts: usize,
}

impl Default for CityConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_GRID_SIZE,
            house_count: DEFAULT_HOUSE_COUNT,
            grey_obstacles: DEFAULT_GREY_OBSTACLES,
            green_obstacles: DEFAULT_GREEN_OBSTACLES,
            house_margin: DEFAULT_HOUSE_MARGIN,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl CityConfig {
    pub fn with_size(size: usize) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    pub fn station_anchor(&self) -> Position {
        STATION_ANCHOR
    }

    /// The hospital sits in the bottom-right corner, two cells in
    pub fn hospital_anchor(&self) -> Position {
        let inset = self.size.saturating_sub(2);
        Position::new(inset, inset)
    }
}
