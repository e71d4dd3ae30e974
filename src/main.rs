pub mod types;
pub mod config;
pub mod error;
pub mod data;
pub mod filter;
pub mod render;
pub mod info;
pub mod lookup;
pub mod server;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the interactive sea-level map
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Render a single map figure as JSON
    Render {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
        /// Target year
        #[arg(short, long)]
        year: i32,
        /// Sea level rise in metres per year (defaults to the configured slider value)
        #[arg(short, long)]
        rate: Option<f64>,
        /// Write to this file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Serve { config } => {
            info!(?config, "Serving map");
            let app_config = config::AppConfig::load_from_file(config)?;

            let table = data::load_data(&app_config.input)
                .context("Failed to load city data")?;

            server::start_server(app_config, table).await?;
        }
        Commands::Render { config, year, rate, output } => {
            let app_config = config::AppConfig::load_from_file(config)?;
            let writer: Box<dyn Write> = match output {
                Some(path) => Box::new(
                    File::create(path).with_context(|| format!("Failed to create {:?}", path))?,
                ),
                None => Box::new(io::stdout()),
            };
            render_figure(&app_config, *year, *rate, writer)?;
        }
    }

    Ok(())
}

/// Load the data once and write the map figure for one year/rate as JSON.
fn render_figure<W: Write>(
    app_config: &config::AppConfig,
    year: i32,
    rate: Option<f64>,
    mut writer: W,
) -> anyhow::Result<()> {
    let table = data::load_data(&app_config.input)
        .context("Failed to load city data")?;

    let rate = rate.unwrap_or(app_config.model.rate_default);
    let query = filter::SeaLevelQuery::new(year, app_config.model.base_year, rate);
    let split = filter::partition(&table, &query, app_config.model.threshold_mode);
    info!(
        above = split.above.len(),
        submerged = split.submerged.len(),
        "Sea level {:.2}m in {}",
        split.sea_level,
        year
    );

    let figure = render::render_map(&split, &query, &app_config.map);
    serde_json::to_writer_pretty(&mut writer, &figure)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_for(dir: &tempfile::TempDir) -> config::AppConfig {
        let cities = dir.path().join("cities.csv");
        std::fs::write(&cities, "A,10.0,20.0,50\nB,11.0,21.0,150\n").unwrap();
        let toml = format!("[input]\ncities_csv = {:?}\n", cities.to_str().unwrap());
        config::AppConfig::from_toml_str(&toml).unwrap()
    }

    #[test]
    fn render_writes_figure_json() {
        let dir = tempfile::tempdir().unwrap();
        let app_config = config_for(&dir);
        let mut out = Vec::new();

        render_figure(&app_config, 2269, Some(0.5), &mut out).unwrap();

        let figure: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(figure["sea_level"], 125.0);
        assert_eq!(figure["layers"][0]["points"][0]["label"], "B");
        assert_eq!(figure["layers"][1]["points"][0]["label"], "A");
        assert_eq!(figure["layers"][1]["points"][0]["size"], 4);
    }

    #[test]
    fn render_defaults_to_configured_rate() {
        let dir = tempfile::tempdir().unwrap();
        let app_config = config_for(&dir);
        let mut out = Vec::new();

        // 0.063 m/y over 1000 years
        render_figure(&app_config, 3019, None, &mut out).unwrap();

        let figure: serde_json::Value = serde_json::from_slice(&out).unwrap();
        let sea_level = figure["sea_level"].as_f64().unwrap();
        assert!((sea_level - 63.0).abs() < 1e-9);
        assert_eq!(figure["layers"][1]["points"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn render_fails_without_city_file() {
        let dir = tempfile::tempdir().unwrap();
        let toml = format!(
            "[input]\ncities_csv = {:?}\n",
            dir.path().join("missing.csv").to_str().unwrap()
        );
        let app_config = config::AppConfig::from_toml_str(&toml).unwrap();
        let mut out = Vec::new();

        assert!(render_figure(&app_config, 2100, Some(1.0), &mut out).is_err());
        assert!(out.is_empty());
    }
}
