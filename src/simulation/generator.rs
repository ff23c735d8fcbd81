//! Procedural city generation
//!
//! Places the two facility blocks at fixed anchors, then rejection-samples
//! house blocks and single-cell obstacles. Every sampling loop is bounded by
//! `CityConfig::max_attempts` and fails with `GenerationError::Infeasible`
//! instead of spinning forever on a crowded configuration.

use log::debug;
use rand::Rng;

use super::config::{CityConfig, HOUSE_SPACING, OBSTACLE_CLEARANCE};
use super::error::GenerationError;
use super::grid::{GridModel, HouseRegistry};
use super::types::{CellKind, Facility, FacilityKind, Position};

/// Smallest grid that fits the station and hospital blocks without overlap
pub const MIN_GRID_SIZE: usize = 6;

/// Output of one generation pass
#[derive(Debug, Clone)]
pub struct GeneratedCity {
    pub grid: GridModel,
    pub houses: HouseRegistry,
    pub station: Facility,
    pub hospital: Facility,
}

/// Builds grids and house registries from a `CityConfig`
#[derive(Debug, Clone, Default)]
pub struct CityGenerator {
    config: CityConfig,
}

impl CityGenerator {
    pub fn new(config: CityConfig) -> Self {
        Self { config }
    }

    /// Generate a city. Deterministic for a seeded `rng`.
    pub fn generate<R: Rng>(&self, rng: &mut R) -> Result<GeneratedCity, GenerationError> {
        let config = &self.config;
        if config.size < MIN_GRID_SIZE {
            return Err(GenerationError::GridTooSmall { size: config.size });
        }

        let mut grid = GridModel::new(config.size);
        let station = Facility::new(FacilityKind::Station, config.station_anchor());
        let hospital = Facility::new(FacilityKind::Hospital, config.hospital_anchor());

        for facility in [&station, &hospital] {
            grid.stamp_block(facility.anchor, facility.kind.cell_kind());
        }

        let houses = self.place_houses(&mut grid, rng, &[station.anchor, hospital.anchor])?;

        // Obstacles keep clear of every house and facility anchor
        let mut anchors: Vec<Position> = houses.anchors().collect();
        anchors.push(station.anchor);
        anchors.push(hospital.anchor);

        self.scatter_obstacles(
            &mut grid,
            rng,
            CellKind::GreyObstacle,
            config.grey_obstacles,
            &anchors,
            "grey obstacles",
        )?;
        self.scatter_obstacles(
            &mut grid,
            rng,
            CellKind::GreenObstacle,
            config.green_obstacles,
            &anchors,
            "green obstacles",
        )?;

        debug!(
            "Generated {}x{} city: {} houses, {} grey and {} green obstacles",
            config.size,
            config.size,
            houses.len(),
            grid.count(CellKind::GreyObstacle),
            grid.count(CellKind::GreenObstacle)
        );

        Ok(GeneratedCity {
            grid,
            houses,
            station,
            hospital,
        })
    }

    fn place_houses<R: Rng>(
        &self,
        grid: &mut GridModel,
        rng: &mut R,
        facility_anchors: &[Position],
    ) -> Result<HouseRegistry, GenerationError> {
        let config = &self.config;
        let mut houses = HouseRegistry::new();
        if config.house_count == 0 {
            return Ok(houses);
        }

        let low = config.house_margin;
        let high = config.size.saturating_sub(config.house_margin);
        let infeasible = |placed: usize, attempts: usize| GenerationError::Infeasible {
            category: "houses",
            placed,
            requested: config.house_count,
            attempts,
        };
        if low >= high {
            return Err(infeasible(0, 0));
        }

        let mut taken: Vec<Position> = facility_anchors.to_vec();
        let mut attempts = 0;

        while houses.len() < config.house_count {
            if attempts >= config.max_attempts {
                return Err(infeasible(houses.len(), attempts));
            }
            attempts += 1;

            let anchor = Position::new(rng.random_range(low..high), rng.random_range(low..high));
            if !grid.block_is_road(anchor) {
                continue;
            }
            if taken.iter().any(|other| other.chebyshev(&anchor) <= HOUSE_SPACING) {
                continue;
            }

            let name = format!("House {}", houses.len() + 1);
            grid.stamp_block(anchor, CellKind::House);
            houses.insert(name, anchor);
            taken.push(anchor);
        }

        Ok(houses)
    }

    fn scatter_obstacles<R: Rng>(
        &self,
        grid: &mut GridModel,
        rng: &mut R,
        kind: CellKind,
        count: usize,
        anchors: &[Position],
        category: &'static str,
    ) -> Result<(), GenerationError> {
        let size = grid.size();
        let mut placed = 0;
        let mut attempts = 0;

        while placed < count {
            if attempts >= self.config.max_attempts {
                return Err(GenerationError::Infeasible {
                    category,
                    placed,
                    requested: count,
                    attempts,
                });
            }
            attempts += 1;

            let cell = Position::new(rng.random_range(0..size), rng.random_range(0..size));
            if grid.get(cell) != Some(CellKind::Road) {
                continue;
            }
            if anchors
                .iter()
                .any(|anchor| anchor.chebyshev(&cell) <= OBSTACLE_CLEARANCE)
            {
                continue;
            }

            grid.set(cell, kind);
            placed += 1;
        }

        Ok(())
    }
}
