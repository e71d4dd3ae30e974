use crate::types::{City, WorkingTable};
use geo::{HaversineDistance, Point};
use rstar::primitives::GeomWithData;
use rstar::RTree;

type CityPoint = GeomWithData<[f64; 2], usize>;

/// Nearest-city index over `[lon, lat]`, used to resolve raw map clicks.
pub struct CityIndex {
    tree: RTree<CityPoint>,
}

impl CityIndex {
    pub fn build(table: &WorkingTable) -> Self {
        let points = table
            .cities()
            .iter()
            .enumerate()
            .map(|(i, c)| CityPoint::new([c.longitude, c.latitude], i))
            .collect();
        Self {
            tree: RTree::bulk_load(points),
        }
    }

    /// Nearest city in planar degrees, with its great-circle distance in metres.
    pub fn nearest<'a>(&self, table: &'a WorkingTable, lat: f64, lon: f64) -> Option<(&'a City, f64)> {
        // rstar cannot order NaN distances
        if !lat.is_finite() || !lon.is_finite() {
            return None;
        }
        let hit = self.tree.nearest_neighbor(&[lon, lat])?;
        let city = table.cities().get(hit.data)?;
        let distance = Point::new(lon, lat).haversine_distance(&Point::new(city.longitude, city.latitude));
        Some((city, distance))
    }
}
