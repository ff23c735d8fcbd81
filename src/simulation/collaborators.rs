//! Interfaces to the renderer and the user-facing prompts
//!
//! Both are synchronous. The renderer never affects the simulation; the
//! prompter answers yes/no questions and shows messages.

use super::grid::{GridModel, HouseRegistry};
use super::types::Position;

/// Everything a renderer needs to draw one frame
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub city_name: &'a str,
    pub grid: &'a GridModel,
    pub houses: &'a HouseRegistry,
    pub station: Position,
    pub hospital: Position,
    /// Truck position, None while the truck is hidden
    pub truck: Option<Position>,
    pub ambulance: Option<Position>,
    pub truck_trail: Option<&'a [Position]>,
    pub ambulance_trail: Option<&'a [Position]>,
    pub highlighted_house: Option<Position>,
}

/// Receives a snapshot after every state change
pub trait Renderer {
    fn render(&mut self, snapshot: &Snapshot<'_>);
}

/// Severity of a user-facing message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Blocking decision points and messages shown to the user
pub trait Prompter {
    /// Show a message and wait for it to be acknowledged
    fn notify(&mut self, level: NoticeLevel, title: &str, message: &str);

    /// Ask whether the emergency needs an ambulance
    fn confirm_medical_emergency(&mut self) -> bool;
}
