//! Named cities generated once at startup

use anyhow::{Context, Result};
use log::info;
use rand::Rng;

use super::collaborators::Snapshot;
use super::generator::{CityGenerator, GeneratedCity};
use super::grid::{GridModel, HouseRegistry};
use super::road_network::RoadNetwork;
use super::types::{Facility, FacilityKind, Position};

/// Hyderabad localities used as the default city set
pub const CITY_NAMES: [&str; 7] = [
    "Madhapur",
    "Gachibowli",
    "Banjara Hills",
    "Begumpet",
    "Kukatpally",
    "Hitech City",
    "Jubilee Hills",
];

/// One generated city with its road graph
#[derive(Debug, Clone)]
pub struct City {
    pub name: String,
    pub grid: GridModel,
    pub houses: HouseRegistry,
    pub station: Facility,
    pub hospital: Facility,
    roads: RoadNetwork,
}

impl City {
    pub fn new(name: impl Into<String>, generated: GeneratedCity) -> Self {
        let roads = RoadNetwork::from_grid(&generated.grid);
        Self {
            name: name.into(),
            grid: generated.grid,
            houses: generated.houses,
            station: generated.station,
            hospital: generated.hospital,
            roads,
        }
    }

    /// Assemble a city from a hand-built grid, e.g. a test fixture
    pub fn from_parts(
        name: impl Into<String>,
        grid: GridModel,
        houses: HouseRegistry,
        station_anchor: Position,
        hospital_anchor: Position,
    ) -> Self {
        Self::new(
            name,
            GeneratedCity {
                grid,
                houses,
                station: Facility::new(FacilityKind::Station, station_anchor),
                hospital: Facility::new(FacilityKind::Hospital, hospital_anchor),
            },
        )
    }

    pub fn roads(&self) -> &RoadNetwork {
        &self.roads
    }

    /// A frame with no vehicles or trails; callers fill in the rest
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            city_name: &self.name,
            grid: &self.grid,
            houses: &self.houses,
            station: self.station.anchor,
            hospital: self.hospital.anchor,
            truck: None,
            ambulance: None,
            truck_trail: None,
            ambulance_trail: None,
            highlighted_house: None,
        }
    }
}

/// All cities known to the application, in display order
#[derive(Debug, Clone, Default)]
pub struct CityCatalog {
    cities: Vec<City>,
}

impl CityCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate one city per name
    pub fn generate<R: Rng>(names: &[&str], generator: &CityGenerator, rng: &mut R) -> Result<Self> {
        let mut catalog = Self::new();
        for name in names {
            let generated = generator
                .generate(rng)
                .with_context(|| format!("Failed to generate city {}", name))?;
            catalog.insert(City::new(*name, generated));
        }
        info!("Generated {} cities", catalog.len());
        Ok(catalog)
    }

    /// Add a city, replacing any city with the same name
    pub fn insert(&mut self, city: City) {
        match self.cities.iter_mut().find(|existing| existing.name == city.name) {
            Some(existing) => *existing = city,
            None => self.cities.push(city),
        }
    }

    pub fn get(&self, name: &str) -> Option<&City> {
        self.cities.iter().find(|city| city.name == name)
    }

    /// Index of the named city in display order
    pub fn position(&self, name: &str) -> Option<usize> {
        self.cities.iter().position(|city| city.name == name)
    }

    pub(crate) fn city_at(&self, index: usize) -> &City {
        &self.cities[index]
    }

    pub fn first(&self) -> Option<&City> {
        self.cities.first()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.cities.iter().map(|city| city.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &City> {
        self.cities.iter()
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }
}
