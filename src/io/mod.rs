use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use geo::{LineString, MultiPolygon, Polygon};
use serde::Deserialize;

use crate::config::ScanConfig;
use crate::regions::{Region, RegionStore};
use crate::scan::OverlapCountMatrix;
use crate::terrain::{ElevationRaster, GeoTransform};

/// Already-decoded inputs: one raster and the ordered region list.
pub struct Scene {
    pub raster: ElevationRaster,
    pub regions: RegionStore,
}

#[derive(Deserialize)]
struct SceneFile {
    raster: RasterRecord,
    regions: Vec<RegionRecord>,
}

#[derive(Deserialize)]
struct RasterRecord {
    rows: usize,
    cols: usize,
    transform: GeoTransform,
    data: Vec<f64>,
}

/// `polygons[k][0]` is the exterior ring of polygon k, the rest are holes.
#[derive(Deserialize)]
struct RegionRecord {
    name: String,
    polygons: Vec<Vec<Vec<[f64; 2]>>>,
}

impl RegionRecord {
    fn into_region(self) -> Result<Region> {
        let polygons = self
            .polygons
            .into_iter()
            .map(|rings| {
                let mut rings = rings.into_iter().map(LineString::from);
                let Some(exterior) = rings.next() else {
                    bail!("region {:?} has a polygon without rings", self.name);
                };
                Ok(Polygon::new(exterior, rings.collect()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Region::new(self.name, MultiPolygon::new(polygons)))
    }
}

pub fn load_config(path: &Path) -> Result<ScanConfig> {
    let file = File::open(path).with_context(|| format!("Failed to open config {:?}", path))?;
    let config: ScanConfig = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse config {:?}", path))?;
    config.validate()?;
    Ok(config)
}

pub fn load_scene(path: &Path) -> Result<Scene> {
    let file = File::open(path).with_context(|| format!("Failed to open scene {:?}", path))?;
    read_scene(BufReader::new(file)).with_context(|| format!("Failed to load scene {:?}", path))
}

pub fn read_scene<R: Read>(reader: R) -> Result<Scene> {
    let scene: SceneFile = serde_json::from_reader(reader)?;
    let RasterRecord { rows, cols, transform, data } = scene.raster;
    let raster = ElevationRaster::new(rows, cols, data, transform)?;
    let regions = scene
        .regions
        .into_iter()
        .map(RegionRecord::into_region)
        .collect::<Result<Vec<_>>>()?;
    Ok(Scene {
        raster,
        regions: RegionStore::new(regions),
    })
}

/// One CSV line per grid row, no header.
pub fn write_matrix_csv<W: Write>(matrix: &OverlapCountMatrix, writer: W) -> Result<()> {
    let mut out = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    for i in 0..matrix.rows {
        out.write_record(matrix.row(i).iter().map(|count| count.to_string()))?;
    }
    out.flush()?;
    Ok(())
}
