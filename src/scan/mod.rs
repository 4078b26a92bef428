use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::time::Instant;

use itertools::iproduct;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::ScanConfig;
use crate::coord::{BoundingBox, Coordinate};
use crate::coverage::OverlapDetector;
use crate::error::{CoverageError, Result};
use crate::regions::RegionStore;
use crate::terrain::ElevationProvider;

/// The two axes of an N×N lattice. Cell (i, j) sits at
/// (`axis_a[i]`, `axis_b[j]`) as (longitude, latitude).
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub axis_a: Vec<f64>,
    pub axis_b: Vec<f64>,
}

impl Grid {
    pub fn new(bbox: &BoundingBox, resolution: usize) -> Self {
        Self {
            axis_a: bbox.axis_a(resolution),
            axis_b: bbox.axis_b(resolution),
        }
    }

    pub fn point(&self, i: usize, j: usize) -> Coordinate {
        Coordinate::new(self.axis_a[i], self.axis_b[j])
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.axis_a.len(), self.axis_b.len())
    }
}

/// Row-major overlap counts, indexed like the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverlapCountMatrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<u32>,
}

impl OverlapCountMatrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0; rows * cols],
        }
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> u32 {
        self.data[i * self.cols + j]
    }

    pub fn row(&self, i: usize) -> &[u32] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn max(&self) -> Option<u32> {
        self.data.iter().copied().max()
    }

    /// Every cell holding the maximum, in row-major order.
    pub fn argmax_cells(&self) -> Vec<(usize, usize)> {
        let Some(max) = self.max() else {
            return Vec::new();
        };
        iproduct!(0..self.rows, 0..self.cols)
            .filter(|&(i, j)| self.get(i, j) == max)
            .collect()
    }
}

pub fn argmax_cells(matrix: &OverlapCountMatrix) -> Vec<(usize, usize)> {
    matrix.argmax_cells()
}

/// Cooperative progress reporting and cancellation, checked between rows.
#[derive(Debug, Clone, Default)]
pub struct ScanControl {
    /// Incremented once per finished row.
    pub progress: Option<Arc<AtomicU32>>,
    pub cancel: Option<Arc<AtomicBool>>,
}

impl ScanControl {
    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|c| c.load(Ordering::Relaxed))
    }

    fn row_done(&self) {
        if let Some(p) = &self.progress {
            p.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestCell {
    pub row: usize,
    pub col: usize,
    pub location: Coordinate,
    pub regions: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ScanReport {
    pub grid: Grid,
    pub matrix: OverlapCountMatrix,
    pub max_count: u32,
    pub best: Vec<BestCell>,
}

/// Drives the overlap detector over every cell of a grid.
pub struct GridScanner<'a, E: ElevationProvider + Sync + ?Sized> {
    detector: OverlapDetector<'a, E>,
    regions: &'a RegionStore,
    config: ScanConfig,
}

impl<'a, E: ElevationProvider + Sync + ?Sized> GridScanner<'a, E> {
    pub fn new(elevation: &'a E, regions: &'a RegionStore, config: ScanConfig) -> Result<Self> {
        config.validate()?;
        if regions.is_empty() {
            return Err(CoverageError::DataUnavailable("region store is empty".into()));
        }
        let detector =
            OverlapDetector::new(elevation, config.buffer_model(), config.overlap_threshold);
        Ok(Self {
            detector,
            regions,
            config,
        })
    }

    pub fn detector(&self) -> &OverlapDetector<'a, E> {
        &self.detector
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn grid(&self) -> Grid {
        Grid::new(&self.config.bounding_box, self.config.resolution)
    }

    /// Count matrix over `bbox` at the configured resolution.
    pub fn scan(&self, bbox: &BoundingBox) -> Result<OverlapCountMatrix> {
        let grid = Grid::new(bbox, self.config.resolution);
        self.scan_grid(&grid, &ScanControl::default())
    }

    pub fn scan_grid(&self, grid: &Grid, control: &ScanControl) -> Result<OverlapCountMatrix> {
        let (rows, cols) = grid.shape();
        let start = Instant::now();
        info!(
            rows,
            cols,
            regions = self.regions.len(),
            parallel = self.config.parallel,
            "starting grid scan"
        );

        let completed = AtomicUsize::new(0);
        let scan_row = |i: usize| -> Result<Vec<u32>> {
            if control.is_cancelled() {
                return Err(CoverageError::Cancelled {
                    completed_rows: completed.load(Ordering::Relaxed),
                    total_rows: rows,
                });
            }
            let counts: Vec<u32> = (0..cols)
                .map(|j| self.detector.overlap_count(grid.point(i, j), self.regions))
                .collect();
            completed.fetch_add(1, Ordering::Relaxed);
            control.row_done();
            debug!(row = i, max = counts.iter().max().copied().unwrap_or(0), "row scanned");
            Ok(counts)
        };

        let row_counts: Vec<Vec<u32>> = if self.config.parallel {
            (0..rows).into_par_iter().map(scan_row).collect::<Result<_>>()?
        } else {
            (0..rows).map(scan_row).collect::<Result<_>>()?
        };

        let matrix = OverlapCountMatrix {
            rows,
            cols,
            data: row_counts.into_iter().flatten().collect(),
        };
        info!(max = matrix.max().unwrap_or(0), elapsed = ?start.elapsed(), "grid scan finished");
        Ok(matrix)
    }

    /// Scans the configured box and reports the best cells with region names.
    pub fn run(&self, control: &ScanControl) -> Result<ScanReport> {
        let grid = self.grid();
        let matrix = self.scan_grid(&grid, control)?;
        Ok(self.report(grid, matrix))
    }

    pub fn report(&self, grid: Grid, matrix: OverlapCountMatrix) -> ScanReport {
        let best = matrix
            .argmax_cells()
            .into_iter()
            .map(|(row, col)| {
                let location = grid.point(row, col);
                let regions = self
                    .detector
                    .overlapping_names(location, self.regions)
                    .into_iter()
                    .map(str::to_owned)
                    .collect();
                BestCell { row, col, location, regions }
            })
            .collect();
        ScanReport {
            max_count: matrix.max().unwrap_or(0),
            grid,
            matrix,
            best,
        }
    }
}
