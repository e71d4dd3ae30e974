use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Elevation table only, fixed-size markers
    Simple,
    /// Elevation joined with demographics, population-sized markers
    Population,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct City {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
    // Always Some in the population variant (1.0 when the join found nothing)
    pub population: Option<f64>,
    // Remaining demographic columns of the matched row
    pub attributes: BTreeMap<String, String>,
}

/// Joined city dataset, built once at startup and read-only afterwards.
#[derive(Debug, Clone)]
pub struct WorkingTable {
    variant: Variant,
    cities: Vec<City>,
}

impl WorkingTable {
    pub fn new(variant: Variant, cities: Vec<City>) -> Self {
        Self { variant, cities }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }
}

/// The map point a user clicked on.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Selection {
    pub label: String,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
}

impl From<&City> for Selection {
    fn from(city: &City) -> Self {
        Self {
            label: city.name.clone(),
            latitude: city.latitude,
            longitude: city.longitude,
            elevation: city.elevation,
        }
    }
}
