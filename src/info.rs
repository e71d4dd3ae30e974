//! Markdown text panels shown next to the map.

use crate::error::MissingSelectionError;
use crate::filter::{is_submerged, Partition, SeaLevelQuery, ThresholdMode};
use crate::types::Selection;

pub fn city_info(
    selection: Option<&Selection>,
    query: &SeaLevelQuery,
    mode: ThresholdMode,
) -> Result<String, MissingSelectionError> {
    let point = selection.ok_or(MissingSelectionError)?;

    let sea_level = match mode {
        ThresholdMode::Exact => query.sea_level(),
        // whole metres per year only
        ThresholdMode::Legacy => SeaLevelQuery {
            rate_per_year: query.rate_per_year.trunc(),
            ..*query
        }
        .sea_level(),
    };
    let status = if is_submerged(point.elevation, sea_level) {
        "Submerged"
    } else {
        "Safe"
    };

    Ok(format!(
        "**City: {}** \n\nLongitude: {:.6} \n\nLatitude: {:.6} \n\nStatus in {}: {}\n",
        point.label, point.longitude, point.latitude, query.reference_year, status
    ))
}

pub fn rate_text(rate: f64) -> String {
    format!("Rate of sea level rise: {} m/y", rate)
}

pub fn affected_text(partition: &Partition<'_>) -> String {
    match partition.population_affected() {
        Some(total) => format!("**Population affected**: {:.0}", total),
        None => format!("**Cities affected**: {}", partition.submerged.len()),
    }
}
