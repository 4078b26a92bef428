use geo::{MultiPolygon, Polygon};

use crate::error::{CoverageError, Result};

/// An administrative boundary with its display name.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub name: String,
    pub geometry: MultiPolygon<f64>,
}

impl Region {
    pub fn new(name: impl Into<String>, geometry: MultiPolygon<f64>) -> Self {
        Self {
            name: name.into(),
            geometry,
        }
    }

    pub fn from_polygon(name: impl Into<String>, polygon: Polygon<f64>) -> Self {
        Self::new(name, MultiPolygon::new(vec![polygon]))
    }
}

/// Ordered, immutable list of regions. Overlap vectors are indexed by
/// position in this list.
#[derive(Debug, Clone, Default)]
pub struct RegionStore {
    regions: Vec<Region>,
}

impl RegionStore {
    pub fn new(regions: Vec<Region>) -> Self {
        Self { regions }
    }

    /// Pairs geometries with names read from a separate attribute table.
    /// Both lists must come from the same ordered source.
    pub fn from_parts(geometries: Vec<MultiPolygon<f64>>, names: Vec<String>) -> Result<Self> {
        if geometries.len() != names.len() {
            return Err(CoverageError::MisalignedRegions {
                geometries: geometries.len(),
                names: names.len(),
            });
        }
        let regions = geometries
            .into_iter()
            .zip(names)
            .map(|(geometry, name)| Region { name, geometry })
            .collect();
        Ok(Self { regions })
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Region> {
        self.regions.iter()
    }

    pub fn as_slice(&self) -> &[Region] {
        &self.regions
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.regions.iter().map(|r| r.name.as_str())
    }
}

impl<'a> IntoIterator for &'a RegionStore {
    type Item = &'a Region;
    type IntoIter = std::slice::Iter<'a, Region>;

    fn into_iter(self) -> Self::IntoIter {
        self.regions.iter()
    }
}
