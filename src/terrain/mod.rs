use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::coord::Coordinate;
use crate::error::{CoverageError, Result};

/// Height returned for lookups that miss the raster or hit a sample at or
/// below sea level. SRTM-style rasters store 0 over water and negative
/// sentinels for voids; a small positive height keeps the buffer radius
/// non-zero along coastlines.
pub const FALLBACK_ELEVATION_M: f64 = 2.0;

/// Anything that can answer "how high is the ground here".
pub trait ElevationProvider {
    fn elevation(&self, at: Coordinate) -> f64;
}

/// Which raster dimension each index is checked against before lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundsPolicy {
    /// Row and column are both checked against the row count.
    #[default]
    RowExtent,
    /// Row against rows, column against columns.
    PerAxis,
}

/// Affine georeferencing, GDAL coefficient order:
/// `lon = c + col * a + row * b`, `lat = f + col * d + row * e`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub c: f64,
    pub a: f64,
    pub b: f64,
    pub f: f64,
    pub d: f64,
    pub e: f64,
}

impl GeoTransform {
    /// North-up raster whose top-left corner sits at (`west`, `north`).
    /// `pixel_height` is positive; rows grow southwards.
    pub fn north_up(west: f64, north: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            c: west,
            a: pixel_width,
            b: 0.0,
            f: north,
            d: 0.0,
            e: -pixel_height,
        }
    }

    /// Coordinate of the top-left corner of cell (`row`, `col`).
    pub fn forward(&self, row: f64, col: f64) -> Coordinate {
        Coordinate {
            longitude: self.c + col * self.a + row * self.b,
            latitude: self.f + col * self.d + row * self.e,
        }
    }

    /// (row, col) of the cell containing `at`. Takes (lon, lat), returns
    /// storage order. `None` for a singular transform or non-finite input.
    pub fn index(&self, at: Coordinate) -> Option<(i64, i64)> {
        let det = self.a * self.e - self.b * self.d;
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let dx = at.longitude - self.c;
        let dy = at.latitude - self.f;
        let col = (self.e * dx - self.b * dy) / det;
        let row = (self.a * dy - self.d * dx) / det;
        if !col.is_finite() || !row.is_finite() {
            return None;
        }
        Some((row.floor() as i64, col.floor() as i64))
    }
}

/// Immutable row-major height grid.
#[derive(Debug, Clone)]
pub struct ElevationRaster {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
    transform: GeoTransform,
}

impl ElevationRaster {
    pub fn new(rows: usize, cols: usize, data: Vec<f64>, transform: GeoTransform) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(CoverageError::DataUnavailable(format!(
                "raster has no samples ({rows}x{cols})"
            )));
        }
        if data.len() != rows * cols {
            return Err(CoverageError::DataUnavailable(format!(
                "raster declares {rows}x{cols} but holds {} samples",
                data.len()
            )));
        }
        Ok(Self { rows, cols, data, transform })
    }

    /// Raster filled by `f(row, col)`.
    pub fn from_fn(
        rows: usize,
        cols: usize,
        transform: GeoTransform,
        f: impl Fn(usize, usize) -> f64,
    ) -> Result<Self> {
        let data = (0..rows)
            .flat_map(|row| (0..cols).map(move |col| (row, col)))
            .map(|(row, col)| f(row, col))
            .collect();
        Self::new(rows, cols, data, transform)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    #[inline(always)]
    pub fn get_height(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.rows && col < self.cols {
            Some(self.data[row * self.cols + col])
        } else {
            None
        }
    }
}

/// Samples an [`ElevationRaster`] with the boundary fallback applied.
#[derive(Debug, Clone)]
pub struct ElevationSampler {
    raster: ElevationRaster,
    fallback: f64,
    policy: BoundsPolicy,
}

impl ElevationSampler {
    pub fn new(raster: ElevationRaster) -> Self {
        Self {
            raster,
            fallback: FALLBACK_ELEVATION_M,
            policy: BoundsPolicy::default(),
        }
    }

    pub fn with_fallback(mut self, fallback: f64) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_policy(mut self, policy: BoundsPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn raster(&self) -> &ElevationRaster {
        &self.raster
    }

    pub fn fallback(&self) -> f64 {
        self.fallback
    }

    /// Storage indices for `at`, or `None` when the bounds policy rejects them.
    pub fn cell_index(&self, at: Coordinate) -> Option<(usize, usize)> {
        let (row, col) = self.raster.transform.index(at)?;
        if row < 0 || col < 0 {
            return None;
        }
        let (row, col) = (row as usize, col as usize);
        let col_limit = match self.policy {
            BoundsPolicy::RowExtent => self.raster.rows,
            BoundsPolicy::PerAxis => self.raster.cols,
        };
        if row >= self.raster.rows || col >= col_limit {
            return None;
        }
        Some((row, col))
    }
}

impl ElevationProvider for ElevationSampler {
    fn elevation(&self, at: Coordinate) -> f64 {
        // A column inside the row extent but past the last column (tall
        // rasters under RowExtent) still misses; get_height catches it.
        let sample = self
            .cell_index(at)
            .and_then(|(row, col)| self.raster.get_height(row, col));
        match sample {
            Some(h) if h > 0.0 => h,
            Some(_) => self.fallback,
            None => {
                trace!(lon = at.longitude, lat = at.latitude, "elevation lookup outside raster");
                self.fallback
            }
        }
    }
}
