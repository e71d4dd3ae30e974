use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::fs;
use anyhow::{ensure, Context, Result};

use crate::filter::ThresholdMode;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    /// Headerless CSV: name, latitude, longitude, elevation
    pub cities_csv: PathBuf,
    /// Headed CSV joined on city name. Enables the population variant.
    pub demographics_csv: Option<PathBuf>,
    #[serde(default = "default_join_column")]
    pub join_column: String,
    #[serde(default = "default_population_column")]
    pub population_column: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ModelConfig {
    pub base_year: i32,
    pub threshold_mode: ThresholdMode,
    pub year_min: i32,
    pub year_max: i32,
    pub year_default: i32,
    pub year_marks: Vec<i32>,
    pub rate_min: f64,
    pub rate_max: f64,
    pub rate_step: f64,
    pub rate_default: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_year: 2019,
            threshold_mode: ThresholdMode::Exact,
            year_min: 2019,
            year_max: 3019,
            year_default: 2019,
            year_marks: vec![2019, 2250, 2500, 2750, 3019],
            rate_min: 0.001,
            rate_max: 5.0,
            rate_step: 0.001,
            rate_default: 0.063,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MapConfig {
    pub center_lat: f64,
    pub center_lon: f64,
    pub style: String,
    pub above_color: String,
    pub submerged_color: String,
    pub opacity: f64,
    pub population_per_marker_unit: f64,
    pub fixed_marker_size: u32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center_lat: 45.50884,
            center_lon: -73.58781,
            style: "light".to_string(),
            above_color: "rgb(160,82,45)".to_string(),
            submerged_color: "rgb(123, 199, 255)".to_string(),
            opacity: 0.6,
            population_per_marker_unit: 200_000.0,
            fixed_marker_size: 4,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: [u8; 4],
    pub port: u16,
    pub static_dir: PathBuf,
    pub web_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: [127, 0, 0, 1],
            port: 8050,
            static_dir: PathBuf::from("static"),
            web_dir: PathBuf::from("web"),
        }
    }
}

fn default_join_column() -> String {
    "city_ascii".to_string()
}

fn default_population_column() -> String {
    "population".to_string()
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)
            .with_context(|| "Failed to parse TOML configuration")?;
        ensure!(
            config.map.population_per_marker_unit > 0.0,
            "map.population_per_marker_unit must be positive, got {}",
            config.map.population_per_marker_unit
        );
        Ok(config)
    }
}
