use crate::config::MapConfig;
use crate::filter::{Partition, SeaLevelQuery};
use crate::types::{City, Variant};
use serde::Serialize;

pub const ABOVE_LAYER: &str = "Above sea level";
pub const SUBMERGED_LAYER: &str = "Submerged";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerPoint {
    pub lat: f64,
    pub lon: f64,
    pub size: u32,
    pub label: String,
    pub elevation: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MarkerLayer {
    pub name: &'static str,
    pub color: String,
    pub opacity: f64,
    pub points: Vec<MarkerPoint>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MapCenter {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MapFigure {
    pub title: String,
    pub year: i32,
    pub sea_level: f64,
    pub style: String,
    pub center: MapCenter,
    pub layers: Vec<MarkerLayer>,
}

/// Marker diameter for a population, one unit per `per_unit` inhabitants.
pub fn marker_size(population: f64, per_unit: f64) -> u32 {
    (population / per_unit).floor().max(0.0) as u32
}

pub fn map_title(year: i32, sea_level: f64) -> String {
    format!("Satellite Overview : Year {} (sea level: {:.2}m)", year, sea_level)
}

pub fn render_map(partition: &Partition<'_>, query: &SeaLevelQuery, config: &MapConfig) -> MapFigure {
    let layer = |name, color: &str, cities: &[&City]| MarkerLayer {
        name,
        color: color.to_string(),
        opacity: config.opacity,
        points: cities
            .iter()
            .map(|c| to_marker(c, partition.variant, config))
            .collect(),
    };

    MapFigure {
        title: map_title(query.reference_year, partition.sea_level),
        year: query.reference_year,
        sea_level: partition.sea_level,
        style: config.style.clone(),
        center: MapCenter {
            lat: config.center_lat,
            lon: config.center_lon,
        },
        layers: vec![
            layer(ABOVE_LAYER, &config.above_color, &partition.above),
            layer(SUBMERGED_LAYER, &config.submerged_color, &partition.submerged),
        ],
    }
}

fn to_marker(city: &City, variant: Variant, config: &MapConfig) -> MarkerPoint {
    let size = match (variant, city.population) {
        (Variant::Population, Some(pop)) => marker_size(pop, config.population_per_marker_unit),
        _ => config.fixed_marker_size,
    };
    MarkerPoint {
        lat: city.latitude,
        lon: city.longitude,
        size,
        label: city.name.clone(),
        elevation: city.elevation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{partition, ThresholdMode};
    use crate::types::WorkingTable;
    use std::collections::BTreeMap;

    const PER_UNIT: f64 = 200_000.0;

    fn city(name: &str, elevation: f64, population: Option<f64>) -> City {
        City {
            name: name.to_string(),
            latitude: 10.0,
            longitude: 20.0,
            elevation,
            population,
            attributes: BTreeMap::new(),
        }
    }

    #[test]
    fn marker_size_thresholds() {
        assert_eq!(marker_size(0.0, PER_UNIT), 0);
        assert_eq!(marker_size(1.0, PER_UNIT), 0);
        assert_eq!(marker_size(199_999.0, PER_UNIT), 0);
        assert_eq!(marker_size(200_000.0, PER_UNIT), 1);
        assert_eq!(marker_size(400_000.0, PER_UNIT), 2);
        assert_eq!(marker_size(37_977_000.0, PER_UNIT), 189);
    }

    #[test]
    fn title_rounds_sea_level_to_centimetres() {
        assert_eq!(
            map_title(2100, 5.103),
            "Satellite Overview : Year 2100 (sea level: 5.10m)"
        );
    }

    #[test]
    fn population_variant_sizes_by_population() {
        let table = WorkingTable::new(
            Variant::Population,
            vec![
                city("Big", 5.0, Some(1_000_000.0)),
                city("Small", 500.0, Some(1.0)),
            ],
        );
        let query = SeaLevelQuery::new(2119, 2019, 0.1);
        let p = partition(&table, &query, ThresholdMode::Exact);

        let figure = render_map(&p, &query, &MapConfig::default());

        assert_eq!(figure.layers.len(), 2);
        let above = &figure.layers[0];
        let submerged = &figure.layers[1];
        assert_eq!(above.name, ABOVE_LAYER);
        assert_eq!(above.color, "rgb(160,82,45)");
        assert_eq!(submerged.name, SUBMERGED_LAYER);
        assert_eq!(submerged.color, "rgb(123, 199, 255)");

        assert_eq!(above.points[0].label, "Small");
        assert_eq!(above.points[0].size, 0);
        assert_eq!(submerged.points[0].label, "Big");
        assert_eq!(submerged.points[0].size, 5);
        assert_eq!(submerged.points[0].elevation, 5.0);
        assert_eq!(figure.center.lon, -73.58781);
    }

    #[test]
    fn simple_variant_uses_fixed_size() {
        let table = WorkingTable::new(Variant::Simple, vec![city("Only", 1.0, None)]);
        let query = SeaLevelQuery::new(2019, 2019, 1.0);
        let p = partition(&table, &query, ThresholdMode::Exact);

        let figure = render_map(&p, &query, &MapConfig::default());

        assert_eq!(figure.layers[0].points[0].size, 4);
        assert!(figure.layers[1].points.is_empty());
    }
}
