//! Main simulation world that ties everything together
//!
//! `SimWorld` owns the city catalog, the currently selected city and the
//! dispatch controller. It is the only place that waits between motion steps.

use anyhow::{bail, Result};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;

use super::catalog::{City, CityCatalog};
use super::collaborators::{Prompter, Renderer};
use super::config::CityConfig;
use super::dispatch::{DispatchController, RunOutcome, Tick};
use super::error::{TriggerRejection, WorldError};
use super::generator::CityGenerator;
use super::motion::CancellationToken;
use super::types::Position;

/// Delay between motion steps when animating
pub const DEFAULT_STEP_INTERVAL: Duration = Duration::from_millis(50);

/// The application root
pub struct SimWorld {
    catalog: CityCatalog,

    /// Index of the selected city in the catalog
    current: usize,

    controller: DispatchController,

    /// Pause after every motion step
    step_interval: Duration,
}

impl SimWorld {
    /// Create a world over an existing catalog; the first city is selected
    pub fn new(catalog: CityCatalog, step_interval: Duration) -> Result<Self> {
        let Some(first) = catalog.first() else {
            bail!("City catalog is empty");
        };
        let controller = DispatchController::for_city(first, CancellationToken::new());

        Ok(Self {
            catalog,
            current: 0,
            controller,
            step_interval,
        })
    }

    /// Generate one city per name. A seed makes generation reproducible.
    pub fn generate(
        config: &CityConfig,
        names: &[&str],
        seed: Option<u64>,
        step_interval: Duration,
    ) -> Result<Self> {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let generator = CityGenerator::new(config.clone());
        let catalog = CityCatalog::generate(names, &generator, &mut rng)?;
        Self::new(catalog, step_interval)
    }

    pub fn catalog(&self) -> &CityCatalog {
        &self.catalog
    }

    /// The selected city
    pub fn city(&self) -> &City {
        self.catalog.city_at(self.current)
    }

    pub fn controller(&self) -> &DispatchController {
        &self.controller
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.controller.cancellation_token()
    }

    pub fn step_interval(&self) -> Duration {
        self.step_interval
    }

    /// Switch cities. Refused while an emergency is running.
    pub fn select_city(&mut self, name: &str) -> Result<(), WorldError> {
        if self.controller.is_run_active() {
            warn!("Cannot switch to {} while an emergency is running", name);
            return Err(WorldError::RunActive);
        }
        let index = self
            .catalog
            .position(name)
            .ok_or_else(|| WorldError::UnknownCity(name.to_string()))?;

        self.current = index;
        let station = self.catalog.city_at(index).station.anchor;
        self.controller.reset(station);
        info!("Selected city {}", name);
        Ok(())
    }

    /// Arm a run without driving it
    pub fn trigger_emergency(&mut self, house_name: &str) -> Result<Position, TriggerRejection> {
        let city = self.catalog.city_at(self.current);
        self.controller.trigger(city, house_name)
    }

    /// Advance the active run by one step
    pub fn tick<R, P>(&mut self, renderer: &mut R, prompter: &mut P) -> Tick
    where
        R: Renderer + ?Sized,
        P: Prompter + ?Sized,
    {
        let city = self.catalog.city_at(self.current);
        self.controller.tick(city, renderer, prompter)
    }

    /// Trigger an emergency and drive it to completion, pausing after each step
    pub fn handle_emergency<R, P>(
        &mut self,
        house_name: &str,
        renderer: &mut R,
        prompter: &mut P,
    ) -> Result<RunOutcome, TriggerRejection>
    where
        R: Renderer + ?Sized,
        P: Prompter + ?Sized,
    {
        self.trigger_emergency(house_name)?;
        self.render(renderer);

        loop {
            match self.tick(renderer, prompter) {
                Tick::Finished(outcome) => return Ok(outcome),
                Tick::Moved(_) if !self.step_interval.is_zero() => {
                    std::thread::sleep(self.step_interval);
                }
                Tick::Idle => return Ok(RunOutcome::Cancelled),
                Tick::Moved(_) | Tick::Advanced(_) => {}
            }
        }
    }

    /// Stop any running emergency at its next check and clear the selection
    pub fn end_simulation<R: Renderer + ?Sized>(&mut self, renderer: &mut R) {
        info!("Ending simulation");
        self.controller.cancel();
        self.controller.clear_highlight();
        self.render(renderer);
    }

    /// Clear a cancellation so emergencies can be triggered again
    pub fn reset(&mut self) {
        let station = self.city().station.anchor;
        self.controller.reset(station);
    }

    pub fn render<R: Renderer + ?Sized>(&self, renderer: &mut R) {
        self.controller.render(self.city(), renderer);
    }

    /// Print a summary of the world state
    pub fn print_summary(&self) {
        let city = self.city();
        println!("=== Emergency Dispatch Summary ===");
        println!("City: {} ({}x{})", city.name, city.grid.size(), city.grid.size());
        println!("Houses: {}", city.houses.len());
        println!(
            "Station: {}, Hospital: {}",
            city.station.anchor, city.hospital.anchor
        );
        println!("Phase: {:?}", self.controller.phase());
        println!(
            "Truck: {} ({})",
            self.controller.truck_position(),
            if self.controller.is_truck_visible() {
                "visible"
            } else {
                "hidden"
            }
        );
        if let Some(ambulance) = self.controller.ambulance_position() {
            println!("Ambulance: {}", ambulance);
        }
        if let Some(report) = self.controller.last_report() {
            println!("Last run: {} -> {:?}", report.house_name, report.outcome);
        }
        println!();
    }
}
