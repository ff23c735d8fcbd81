//! Standalone emergency dispatch simulation
//!
//! City generation, grid pathfinding and the dispatch state machine. Rendering
//! and user prompts are reached only through the `Renderer` and `Prompter`
//! traits, so everything here runs headless and under test.

mod catalog;
mod collaborators;
mod config;
mod dispatch;
mod entry;
mod error;
mod generator;
mod grid;
mod motion;
mod road_network;
mod terminal;
mod types;
mod world;

// Re-export public types for external use
pub use catalog::{City, CityCatalog, CITY_NAMES};
pub use collaborators::{NoticeLevel, Prompter, Renderer, Snapshot};
pub use config::{
    CityConfig, DEFAULT_GREEN_OBSTACLES, DEFAULT_GREY_OBSTACLES, DEFAULT_GRID_SIZE,
    DEFAULT_HOUSE_COUNT, DEFAULT_HOUSE_MARGIN, DEFAULT_MAX_ATTEMPTS, HOUSE_SPACING,
    OBSTACLE_CLEARANCE, STATION_ANCHOR,
};
pub use dispatch::{DispatchController, DispatchPhase, RunOutcome, RunReport, Tick};
pub use entry::{select_best_entry, EntryChoice};
pub use error::{GenerationError, TriggerRejection, WorldError};
pub use generator::{CityGenerator, GeneratedCity, MIN_GRID_SIZE};
pub use grid::{GridModel, House, HouseRegistry};
pub use motion::{CancellationToken, MotionTrail};
pub use road_network::{RoadNetwork, STEP_COST};
pub use terminal::{draw_map, ConsolePrompter, ScriptedPrompter, TerminalRenderer};
pub use types::{CellKind, Facility, FacilityKind, Path, Position};
pub use world::{SimWorld, DEFAULT_STEP_INTERVAL};
