//! Emergency Dispatch Simulation Library
//!
//! Procedurally generated city grids, shortest-path routing and a cancellable
//! fire truck / ambulance dispatch state machine that runs without any UI.

pub mod simulation;
