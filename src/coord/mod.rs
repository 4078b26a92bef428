use serde::{Deserialize, Serialize};

/// Approximate kilometres per degree of latitude.
pub const KM_PER_DEGREE: f64 = 110.5;

/// A geographic position in decimal degrees, (longitude, latitude) order.
///
/// No range validation: a coordinate may lie outside the raster or
/// every region.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinate {
    pub longitude: f64,
    pub latitude: f64,
}

impl Coordinate {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self { longitude, latitude }
    }
}

/// Four-element extent. Axis A is built from `[0..=1]`, axis B from `[2..=3]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoundingBox(pub [f64; 4]);

impl BoundingBox {
    pub fn new(a_start: f64, a_end: f64, b_start: f64, b_end: f64) -> Self {
        Self([a_start, a_end, b_start, b_end])
    }

    pub fn axis_a(&self, n: usize) -> Vec<f64> {
        linspace(self.0[0], self.0[1], n)
    }

    pub fn axis_b(&self, n: usize) -> Vec<f64> {
        linspace(self.0[2], self.0[3], n)
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }
}

/// `n` evenly spaced values from `start` to `end`, both included.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            // Pin the last value to `end` so rounding never drops the endpoint.
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}
