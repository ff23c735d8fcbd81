//! Emergency dispatch state machine
//!
//! One run moves the fire truck from the station to a house, optionally
//! sends the ambulance on a round trip from the hospital, and then puts the
//! truck back at the station. The controller is driven by `tick`, which
//! advances exactly one phase or one motion step, so the host loop decides
//! how long to wait between steps and can poll for new triggers in between.
//!
//! Cancellation is cooperative: the token is checked at the start of every
//! phase and before every motion step. Once observed, the run is dropped and
//! nothing visible is rolled back.

use log::{debug, info, warn};

use super::catalog::City;
use super::collaborators::{NoticeLevel, Prompter, Renderer};
use super::entry::select_best_entry;
use super::error::TriggerRejection;
use super::motion::{CancellationToken, MotionTrail};
use super::types::{Path, Position};

/// Where the controller is in the current run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchPhase {
    Idle,
    /// Acknowledge the emergency and plan the truck route
    TruckDeparting,
    TruckEnRoute,
    AtHouse,
    AmbulanceDecision,
    AmbulanceEnRoute,
    AmbulanceAtHouse,
    AmbulanceReturning,
    TruckReturning,
    /// A run was cancelled; `reset` returns to `Idle`
    Cancelled,
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Not a medical emergency
    FireHandled,
    /// Ambulance completed the round trip
    PatientDelivered,
    /// Medical emergency but no ambulance route both ways; handled as fire only
    AmbulanceRouteUnavailable,
    /// The house cannot be reached from the station
    NoRouteFound,
    Cancelled,
}

/// Result of a single `tick`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// No run in progress
    Idle,
    /// Moved to a new phase
    Advanced(DispatchPhase),
    /// A vehicle took one step; the host should wait one step interval
    Moved(Position),
    Finished(RunOutcome),
}

/// Summary of the last finished run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub house_name: String,
    pub outcome: RunOutcome,
    /// Length of the truck's route in cells, start and goal included
    pub truck_path_len: Option<usize>,
    /// Outbound and return route lengths of the ambulance
    pub ambulance_path_lens: Option<(usize, usize)>,
}

/// State of the single active emergency
#[derive(Debug, Clone)]
struct EmergencyRun {
    house_name: String,
    house: Position,
    truck_trail: Option<MotionTrail>,
    ambulance_trail: Option<MotionTrail>,
    return_path: Path,
    outcome: Option<RunOutcome>,
    truck_path_len: Option<usize>,
    ambulance_path_lens: Option<(usize, usize)>,
}

impl EmergencyRun {
    fn new(house_name: &str, house: Position) -> Self {
        Self {
            house_name: house_name.to_string(),
            house,
            truck_trail: None,
            ambulance_trail: None,
            return_path: Vec::new(),
            outcome: None,
            truck_path_len: None,
            ambulance_path_lens: None,
        }
    }

    fn report(&self, outcome: RunOutcome) -> RunReport {
        RunReport {
            house_name: self.house_name.clone(),
            outcome,
            truck_path_len: self.truck_path_len,
            ambulance_path_lens: self.ambulance_path_lens,
        }
    }
}

/// Drives one emergency at a time for a single city
#[derive(Debug, Clone)]
pub struct DispatchController {
    phase: DispatchPhase,
    cancel: CancellationToken,
    station: Position,
    truck: Position,
    truck_visible: bool,
    ambulance: Option<Position>,
    highlighted_house: Option<Position>,
    run: Option<EmergencyRun>,
    last_report: Option<RunReport>,
}

impl DispatchController {
    /// Create a controller with the truck parked at the station anchor
    pub fn new(station: Position, cancel: CancellationToken) -> Self {
        Self {
            phase: DispatchPhase::Idle,
            cancel,
            station,
            truck: station,
            truck_visible: true,
            ambulance: None,
            highlighted_house: None,
            run: None,
            last_report: None,
        }
    }

    pub fn for_city(city: &City, cancel: CancellationToken) -> Self {
        Self::new(city.station.anchor, cancel)
    }

    pub fn phase(&self) -> DispatchPhase {
        self.phase
    }

    pub fn is_run_active(&self) -> bool {
        self.run.is_some()
    }

    pub fn truck_position(&self) -> Position {
        self.truck
    }

    pub fn is_truck_visible(&self) -> bool {
        self.truck_visible
    }

    pub fn ambulance_position(&self) -> Option<Position> {
        self.ambulance
    }

    pub fn highlighted_house(&self) -> Option<Position> {
        self.highlighted_house
    }

    pub fn last_report(&self) -> Option<&RunReport> {
        self.last_report.as_ref()
    }

    /// A handle to the token this controller polls
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn clear_highlight(&mut self) {
        self.highlighted_house = None;
    }

    /// Clear a cancellation and park the truck back at `station`
    pub fn reset(&mut self, station: Position) {
        self.cancel.reset();
        self.run = None;
        self.phase = DispatchPhase::Idle;
        self.station = station;
        self.truck = station;
        self.truck_visible = true;
        self.ambulance = None;
        self.highlighted_house = None;
    }

    /// Arm a run for `house_name`. Nothing changes when the trigger is rejected.
    pub fn trigger(&mut self, city: &City, house_name: &str) -> Result<Position, TriggerRejection> {
        if self.run.is_some() {
            warn!("Ignoring emergency at {}: a run is already active", house_name);
            return Err(TriggerRejection::RunAlreadyActive);
        }
        if self.phase == DispatchPhase::Cancelled || self.cancel.is_cancelled() {
            warn!("Ignoring emergency at {}: simulation was cancelled", house_name);
            return Err(TriggerRejection::AlreadyCancelled);
        }
        let house = city
            .houses
            .get(house_name)
            .ok_or_else(|| TriggerRejection::UnknownHouse(house_name.to_string()))?;

        info!("Emergency triggered at {} {} in {}", house_name, house, city.name);
        self.run = Some(EmergencyRun::new(house_name, house));
        self.highlighted_house = Some(house);
        self.enter(DispatchPhase::TruckDeparting);
        Ok(house)
    }

    /// Advance the active run by one phase or one motion step
    pub fn tick<R, P>(&mut self, city: &City, renderer: &mut R, prompter: &mut P) -> Tick
    where
        R: Renderer + ?Sized,
        P: Prompter + ?Sized,
    {
        if self.run.is_none() {
            return Tick::Idle;
        }

        match self.phase {
            DispatchPhase::Idle | DispatchPhase::Cancelled => Tick::Idle,
            DispatchPhase::TruckDeparting => self.depart(city, renderer, prompter),
            DispatchPhase::TruckEnRoute => self.drive_truck(city, renderer),
            DispatchPhase::AtHouse => self.arrive(city, renderer),
            DispatchPhase::AmbulanceDecision => self.decide(city, renderer, prompter),
            DispatchPhase::AmbulanceEnRoute | DispatchPhase::AmbulanceReturning => {
                self.drive_ambulance(city, renderer, prompter)
            }
            DispatchPhase::AmbulanceAtHouse => self.turn_ambulance(city, renderer),
            DispatchPhase::TruckReturning => self.return_home(city, renderer),
        }
    }

    fn enter(&mut self, phase: DispatchPhase) -> Tick {
        debug!("Dispatch phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
        Tick::Advanced(phase)
    }

    /// Stop the run where it is. Vehicles keep their positions.
    fn abort<R: Renderer + ?Sized>(&mut self, city: &City, renderer: &mut R) -> Tick {
        if let Some(run) = self.run.take() {
            info!("Emergency run at {} cancelled", run.house_name);
            self.last_report = Some(run.report(RunOutcome::Cancelled));
        }
        self.highlighted_house = None;
        self.enter(DispatchPhase::Cancelled);
        self.render(city, renderer);
        Tick::Finished(RunOutcome::Cancelled)
    }

    fn depart<R, P>(&mut self, city: &City, renderer: &mut R, prompter: &mut P) -> Tick
    where
        R: Renderer + ?Sized,
        P: Prompter + ?Sized,
    {
        let Some(run) = self.run.as_ref() else {
            return Tick::Idle;
        };
        let (house_name, house) = (run.house_name.clone(), run.house);

        prompter.notify(
            NoticeLevel::Info,
            "Emergency",
            &format!("Emergency at {} in {} at {}.", house_name, city.name, house),
        );
        if self.cancel.is_cancelled() {
            return self.abort(city, renderer);
        }

        let entry = select_best_entry(city.roads(), &city.station, house);
        if !entry.is_reachable() {
            warn!("No path from the station to {} {}", house_name, house);
            prompter.notify(NoticeLevel::Error, "Error", &format!("No path to {}", house_name));
            if let Some(run) = self.run.take() {
                self.last_report = Some(run.report(RunOutcome::NoRouteFound));
            }
            self.highlighted_house = None;
            self.enter(DispatchPhase::Idle);
            self.render(city, renderer);
            return Tick::Finished(RunOutcome::NoRouteFound);
        }

        debug!(
            "Truck leaves station cell {} with a {}-cell route",
            entry.cell,
            entry.path.len()
        );
        if let Some(run) = self.run.as_mut() {
            run.truck_path_len = Some(entry.path.len());
            run.truck_trail = Some(MotionTrail::new(entry.path, self.cancel.clone()));
        }
        self.truck_visible = true;
        self.enter(DispatchPhase::TruckEnRoute)
    }

    fn drive_truck<R: Renderer + ?Sized>(&mut self, city: &City, renderer: &mut R) -> Tick {
        let step = self
            .run
            .as_mut()
            .and_then(|run| run.truck_trail.as_mut())
            .and_then(|trail| trail.next());

        match step {
            Some(position) => {
                self.truck = position;
                self.render(city, renderer);
                Tick::Moved(position)
            }
            None if self.cancel.is_cancelled() => self.abort(city, renderer),
            None => self.enter(DispatchPhase::AtHouse),
        }
    }

    fn arrive<R: Renderer + ?Sized>(&mut self, city: &City, renderer: &mut R) -> Tick {
        if self.cancel.is_cancelled() {
            return self.abort(city, renderer);
        }
        if let Some(run) = self.run.as_mut() {
            // The truck is pinned to the house anchor, not the route's last cell
            self.truck = run.house;
            run.truck_trail = None;
        }
        self.render(city, renderer);
        self.enter(DispatchPhase::AmbulanceDecision)
    }

    fn decide<R, P>(&mut self, city: &City, renderer: &mut R, prompter: &mut P) -> Tick
    where
        R: Renderer + ?Sized,
        P: Prompter + ?Sized,
    {
        let medical = prompter.confirm_medical_emergency();
        if self.cancel.is_cancelled() {
            return self.abort(city, renderer);
        }
        let Some(run) = self.run.as_mut() else {
            return Tick::Idle;
        };

        if !medical {
            prompter.notify(NoticeLevel::Info, "Handled", "Fire emergency handled.");
            run.outcome = Some(RunOutcome::FireHandled);
            return self.enter(DispatchPhase::TruckReturning);
        }

        let outbound = select_best_entry(city.roads(), &city.hospital, run.house);
        let back = if outbound.is_reachable() {
            city.roads().find_path(run.house, outbound.cell)
        } else {
            Vec::new()
        };

        prompter.notify(
            NoticeLevel::Info,
            "Ambulance",
            &format!("Dispatching ambulance to {} at {}.", run.house_name, run.house),
        );

        if !outbound.is_reachable() || back.is_empty() {
            info!(
                "No ambulance route between the hospital and {}, handling as fire only",
                run.house_name
            );
            run.outcome = Some(RunOutcome::AmbulanceRouteUnavailable);
            return self.enter(DispatchPhase::TruckReturning);
        }

        run.ambulance_path_lens = Some((outbound.path.len(), back.len()));
        run.ambulance_trail = Some(MotionTrail::new(outbound.path, self.cancel.clone()));
        run.return_path = back;

        self.truck_visible = false;
        self.ambulance = Some(outbound.cell);
        self.render(city, renderer);
        self.enter(DispatchPhase::AmbulanceEnRoute)
    }

    fn drive_ambulance<R, P>(&mut self, city: &City, renderer: &mut R, prompter: &mut P) -> Tick
    where
        R: Renderer + ?Sized,
        P: Prompter + ?Sized,
    {
        let step = self
            .run
            .as_mut()
            .and_then(|run| run.ambulance_trail.as_mut())
            .and_then(|trail| trail.next());

        if let Some(position) = step {
            self.ambulance = Some(position);
            self.render(city, renderer);
            return Tick::Moved(position);
        }
        if self.cancel.is_cancelled() {
            return self.abort(city, renderer);
        }

        if self.phase == DispatchPhase::AmbulanceEnRoute {
            return self.enter(DispatchPhase::AmbulanceAtHouse);
        }

        self.ambulance = None;
        if let Some(run) = self.run.as_mut() {
            run.ambulance_trail = None;
            run.outcome = Some(RunOutcome::PatientDelivered);
        }
        prompter.notify(
            NoticeLevel::Info,
            "Patient Arrived",
            "Patient reached hospital safely.",
        );
        self.enter(DispatchPhase::TruckReturning)
    }

    fn turn_ambulance<R: Renderer + ?Sized>(&mut self, city: &City, renderer: &mut R) -> Tick {
        if self.cancel.is_cancelled() {
            return self.abort(city, renderer);
        }
        if let Some(run) = self.run.as_mut() {
            let back = std::mem::take(&mut run.return_path);
            run.ambulance_trail = Some(MotionTrail::new(back, self.cancel.clone()));
        }
        self.enter(DispatchPhase::AmbulanceReturning)
    }

    fn return_home<R: Renderer + ?Sized>(&mut self, city: &City, renderer: &mut R) -> Tick {
        if self.cancel.is_cancelled() {
            return self.abort(city, renderer);
        }

        // Instantaneous reset, the return leg is not animated
        self.truck = self.station;
        self.truck_visible = true;
        self.highlighted_house = None;

        let outcome = match self.run.take() {
            Some(run) => {
                let outcome = run.outcome.unwrap_or(RunOutcome::FireHandled);
                info!("Emergency run at {} finished: {:?}", run.house_name, outcome);
                self.last_report = Some(run.report(outcome));
                outcome
            }
            None => RunOutcome::FireHandled,
        };

        self.enter(DispatchPhase::Idle);
        self.render(city, renderer);
        Tick::Finished(outcome)
    }

    /// Draw the current state, including the trail of whichever vehicle is moving
    pub fn render<R: Renderer + ?Sized>(&self, city: &City, renderer: &mut R) {
        let mut frame = city.snapshot();
        frame.truck = self.truck_visible.then_some(self.truck);
        frame.ambulance = self.ambulance;
        frame.highlighted_house = self.highlighted_house;
        if let Some(run) = &self.run {
            frame.truck_trail = run.truck_trail.as_ref().map(|trail| trail.trail());
            frame.ambulance_trail = run.ambulance_trail.as_ref().map(|trail| trail.trail());
        }
        renderer.render(&frame);
    }
}
