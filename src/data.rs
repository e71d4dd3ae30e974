use crate::config::InputConfig;
use crate::error::DataLoadError;
use crate::types::{City, Variant, WorkingTable};
use csv::{ReaderBuilder, StringRecord};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::path::Path;
use tracing::info;

const PRIMARY_COLUMNS: usize = 4;

/// Population filled in for cities the demographic table does not cover.
pub const UNKNOWN_POPULATION: f64 = 1.0;

struct ElevationRow {
    name: String,
    latitude: f64,
    longitude: f64,
    elevation: f64,
}

#[derive(Clone)]
struct DemographicRow {
    population: Option<f64>,
    attributes: BTreeMap<String, String>,
}

pub fn load_data(config: &InputConfig) -> Result<WorkingTable, DataLoadError> {
    info!(path = ?config.cities_csv, "Loading city elevations");

    // 1. Load primary table
    let rows = load_elevation_rows(&config.cities_csv)?;
    info!("Loaded {} elevation rows", rows.len());

    // 2. Load and join demographics (population variant only)
    let Some(demographics_path) = &config.demographics_csv else {
        let cities = rows
            .into_iter()
            .filter(|row| !row.name.is_empty())
            .map(|row| row.into_city(None, BTreeMap::new()))
            .collect();
        return Ok(WorkingTable::new(Variant::Simple, cities));
    };

    let demographics = load_demographics(config, demographics_path)?;
    info!("Loaded demographics for {} distinct names", demographics.len());

    let (cities, unmatched) = left_join(rows, &demographics);
    info!(unmatched, "Joined working table has {} cities", cities.len());

    Ok(WorkingTable::new(Variant::Population, cities))
}

fn open_csv(path: &Path, has_headers: bool) -> Result<csv::Reader<File>, DataLoadError> {
    let file = File::open(path).map_err(|source| DataLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(ReaderBuilder::new()
        .has_headers(has_headers)
        .flexible(true)
        .from_reader(file))
}

fn csv_error(path: &Path) -> impl FnOnce(csv::Error) -> DataLoadError + '_ {
    move |source| DataLoadError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

fn parse_finite(
    path: &Path,
    record: &StringRecord,
    raw: &str,
    column: &'static str,
) -> Result<f64, DataLoadError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| DataLoadError::InvalidValue {
            path: path.to_path_buf(),
            line: line_of(record),
            column,
            value: raw.to_string(),
        })
}

fn load_elevation_rows(path: &Path) -> Result<Vec<ElevationRow>, DataLoadError> {
    let mut rdr = open_csv(path, false)?;
    let mut rows = Vec::new();

    for result in rdr.records() {
        let record = result.map_err(csv_error(path))?;

        if record.len() != PRIMARY_COLUMNS {
            return Err(DataLoadError::InvalidValue {
                path: path.to_path_buf(),
                line: line_of(&record),
                column: "row",
                value: record.iter().collect::<Vec<_>>().join(","),
            });
        }

        rows.push(ElevationRow {
            name: record[0].trim().to_string(),
            latitude: parse_finite(path, &record, &record[1], "latitude")?,
            longitude: parse_finite(path, &record, &record[2], "longitude")?,
            elevation: parse_finite(path, &record, &record[3], "elevation")?,
        });
    }

    Ok(rows)
}

fn load_demographics(
    config: &InputConfig,
    path: &Path,
) -> Result<HashMap<String, Vec<DemographicRow>>, DataLoadError> {
    let mut rdr = open_csv(path, true)?;
    let headers = rdr.headers().map_err(csv_error(path))?.clone();

    let find_column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| DataLoadError::MissingColumn {
                path: path.to_path_buf(),
                column: name.to_string(),
            })
    };
    let join_idx = find_column(&config.join_column)?;
    let pop_idx = find_column(&config.population_column)?;

    let mut by_name: HashMap<String, Vec<DemographicRow>> = HashMap::new();

    for result in rdr.records() {
        let record = result.map_err(csv_error(path))?;
        let key = record.get(join_idx).unwrap_or("").trim();
        if key.is_empty() {
            continue;
        }

        let population = match record.get(pop_idx).map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(parse_finite(path, &record, raw, "population")?),
        };

        let attributes = headers
            .iter()
            .zip(record.iter())
            .enumerate()
            .filter(|(i, _)| *i != join_idx && *i != pop_idx)
            .map(|(_, (h, v))| (h.trim().to_string(), v.trim().to_string()))
            .collect();

        by_name
            .entry(key.to_string())
            .or_default()
            .push(DemographicRow { population, attributes });
    }

    Ok(by_name)
}

/// Returns the joined rows and how many primary rows found no demographic match.
fn left_join(
    rows: Vec<ElevationRow>,
    demographics: &HashMap<String, Vec<DemographicRow>>,
) -> (Vec<City>, usize) {
    let joined: Vec<(City, bool)> = rows
        .into_par_iter()
        .filter(|row| !row.name.is_empty())
        .flat_map_iter(|row| {
            let matches = demographics.get(&row.name);
            match matches {
                None => vec![(row.into_city(Some(UNKNOWN_POPULATION), BTreeMap::new()), false)],
                Some(matches) => matches
                    .iter()
                    .map(|m| {
                        let population = m.population.unwrap_or(UNKNOWN_POPULATION);
                        (row.to_city(Some(population), m.attributes.clone()), true)
                    })
                    .collect(),
            }
        })
        .collect();

    let unmatched = joined.iter().filter(|(_, matched)| !matched).count();
    let cities = joined.into_iter().map(|(city, _)| city).collect();
    (cities, unmatched)
}

impl ElevationRow {
    fn to_city(&self, population: Option<f64>, attributes: BTreeMap<String, String>) -> City {
        City {
            name: self.name.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
            elevation: self.elevation,
            population,
            attributes,
        }
    }

    fn into_city(self, population: Option<f64>, attributes: BTreeMap<String, String>) -> City {
        City {
            name: self.name,
            latitude: self.latitude,
            longitude: self.longitude,
            elevation: self.elevation,
            population,
            attributes,
        }
    }
}
