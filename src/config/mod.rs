use serde::{Deserialize, Serialize};

use crate::coord::{BoundingBox, Coordinate, KM_PER_DEGREE};
use crate::coverage::DEFAULT_OVERLAP_THRESHOLD;
use crate::error::{CoverageError, Result};
use crate::physics::buffer::{BufferModel, DEFAULT_BUFFER_SCALE, DEFAULT_DISK_SEGMENTS};
use crate::terrain::{BoundsPolicy, ElevationRaster, ElevationSampler, FALLBACK_ELEVATION_M};

/// Every tunable of a scan. Missing JSON fields take the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// `[a_start, a_end, b_start, b_end]`; axis A is longitude, axis B latitude.
    pub bounding_box: BoundingBox,
    /// Points per axis.
    pub resolution: usize,
    pub buffer_scale: f64,
    pub km_per_degree: f64,
    pub overlap_threshold: f64,
    pub fallback_elevation: f64,
    pub disk_segments: usize,
    pub bounds_policy: BoundsPolicy,
    /// Scan rows on the rayon pool.
    pub parallel: bool,
    pub probes: Vec<Probe>,
}

/// A named location reported on its own after the scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Probe {
    pub name: String,
    #[serde(flatten)]
    pub location: Coordinate,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            bounding_box: BoundingBox::new(-10.75, -5.2, 51.2, 55.5),
            resolution: 50,
            buffer_scale: DEFAULT_BUFFER_SCALE,
            km_per_degree: KM_PER_DEGREE,
            overlap_threshold: DEFAULT_OVERLAP_THRESHOLD,
            fallback_elevation: FALLBACK_ELEVATION_M,
            disk_segments: DEFAULT_DISK_SEGMENTS,
            bounds_policy: BoundsPolicy::default(),
            parallel: true,
            probes: Vec::new(),
        }
    }
}

impl ScanConfig {
    pub fn buffer_model(&self) -> BufferModel {
        BufferModel {
            scale: self.buffer_scale,
            km_per_degree: self.km_per_degree,
            segments: self.disk_segments,
        }
    }

    /// Sampler over `raster` with the configured fallback height and bounds policy.
    pub fn sampler(&self, raster: ElevationRaster) -> ElevationSampler {
        ElevationSampler::new(raster)
            .with_fallback(self.fallback_elevation)
            .with_policy(self.bounds_policy)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| -> Result<()> { Err(CoverageError::InvalidConfig(msg)) };
        if self.resolution == 0 {
            return invalid("resolution must be at least 1".into());
        }
        if !self.bounding_box.is_finite() {
            return invalid(format!("bounding box {:?} is not finite", self.bounding_box.0));
        }
        if !(self.km_per_degree.is_finite() && self.km_per_degree > 0.0) {
            return invalid(format!("km_per_degree must be positive, got {}", self.km_per_degree));
        }
        if !(self.buffer_scale.is_finite() && self.buffer_scale >= 0.0) {
            return invalid(format!("buffer_scale must be non-negative, got {}", self.buffer_scale));
        }
        if !(self.overlap_threshold.is_finite() && self.overlap_threshold >= 0.0) {
            return invalid(format!(
                "overlap_threshold must be non-negative, got {}",
                self.overlap_threshold
            ));
        }
        if !(self.fallback_elevation.is_finite() && self.fallback_elevation >= 0.0) {
            return invalid(format!(
                "fallback_elevation must be non-negative, got {}",
                self.fallback_elevation
            ));
        }
        if self.disk_segments < 3 {
            return invalid(format!("disk_segments must be at least 3, got {}", self.disk_segments));
        }
        Ok(())
    }
}
