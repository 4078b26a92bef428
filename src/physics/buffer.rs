use std::f64::consts::PI;

use geo::{LineString, Polygon};

use crate::coord::{Coordinate, KM_PER_DEGREE};

/// Empirical spread factor applied to the square root of the height.
pub const DEFAULT_BUFFER_SCALE: f64 = 3.57;

/// 16 segments per quadrant.
pub const DEFAULT_DISK_SEGMENTS: usize = 64;

/// Elevation-to-radius heuristic: `scale * sqrt(height) / km_per_degree`.
///
/// The square root is a fixed rule of thumb for "higher ground reaches
/// further", not a horizon computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BufferModel {
    pub scale: f64,
    pub km_per_degree: f64,
    pub segments: usize,
}

impl Default for BufferModel {
    fn default() -> Self {
        Self {
            scale: DEFAULT_BUFFER_SCALE,
            km_per_degree: KM_PER_DEGREE,
            segments: DEFAULT_DISK_SEGMENTS,
        }
    }
}

impl BufferModel {
    /// Radius in degrees. Negative heights are treated as 0.
    pub fn buffer_radius_degrees(&self, height: f64) -> f64 {
        let km = self.scale * height.max(0.0).sqrt();
        km * (1.0 / self.km_per_degree)
    }

    /// Closed ring approximating the disk around `center`.
    pub fn disk(&self, center: Coordinate, height: f64) -> Polygon<f64> {
        disk_polygon(center, self.buffer_radius_degrees(height), self.segments)
    }
}

pub fn disk_polygon(center: Coordinate, radius: f64, segments: usize) -> Polygon<f64> {
    let n = segments.max(3);
    let mut coords = Vec::with_capacity(n + 1);
    for i in 0..n {
        let angle = 2.0 * PI * i as f64 / n as f64;
        coords.push((
            center.longitude + radius * angle.cos(),
            center.latitude + radius * angle.sin(),
        ));
    }
    coords.push(coords[0]);

    Polygon::new(LineString::from(coords), vec![])
}
