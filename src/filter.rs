//! Sea-level threshold partitioning of the working table.

use crate::types::{City, Variant, WorkingTable};
use serde::{Deserialize, Serialize};

/// How the elevation/sea-level comparisons are evaluated.
///
/// `Legacy` reproduces the original dashboard: the submerged layer compares
/// against the sea level truncated toward zero, and the click panel truncates
/// the rate to a whole number. Near the boundary a city can then appear in
/// both layers or in neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdMode {
    #[default]
    Exact,
    Legacy,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct SeaLevelQuery {
    pub reference_year: i32,
    pub base_year: i32,
    pub rate_per_year: f64,
}

impl SeaLevelQuery {
    pub fn new(reference_year: i32, base_year: i32, rate_per_year: f64) -> Self {
        Self { reference_year, base_year, rate_per_year }
    }

    /// Metres of rise above the base year's level.
    pub fn sea_level(&self) -> f64 {
        (self.reference_year as f64 - self.base_year as f64) * self.rate_per_year
    }
}

#[derive(Debug, Clone)]
pub struct Partition<'a> {
    pub sea_level: f64,
    pub variant: Variant,
    pub above: Vec<&'a City>,
    pub submerged: Vec<&'a City>,
}

impl Partition<'_> {
    /// Total population of submerged cities, `None` without demographics.
    pub fn population_affected(&self) -> Option<f64> {
        match self.variant {
            Variant::Simple => None,
            Variant::Population => Some(
                self.submerged
                    .iter()
                    .filter_map(|c| c.population)
                    .sum(),
            ),
        }
    }
}

pub fn is_submerged(elevation: f64, sea_level: f64) -> bool {
    elevation < sea_level
}

pub fn partition<'a>(
    table: &'a WorkingTable,
    query: &SeaLevelQuery,
    mode: ThresholdMode,
) -> Partition<'a> {
    let sea_level = query.sea_level();
    let submerged_threshold = match mode {
        ThresholdMode::Exact => sea_level,
        ThresholdMode::Legacy => sea_level.trunc(),
    };

    let above = table
        .cities()
        .iter()
        .filter(|c| c.elevation >= sea_level)
        .collect();
    let submerged = table
        .cities()
        .iter()
        .filter(|c| is_submerged(c.elevation, submerged_threshold))
        .collect();

    Partition {
        sea_level,
        variant: table.variant(),
        above,
        submerged,
    }
}
