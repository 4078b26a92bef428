use thiserror::Error;

/// Errors raised by the coverage library.
///
/// Out-of-range raster lookups are not errors; they fall back to a
/// fixed elevation inside the sampler.
#[derive(Debug, Error)]
pub enum CoverageError {
    /// An input collaborator (raster or region store) is absent or unusable.
    #[error("data unavailable: {0}")]
    DataUnavailable(String),

    /// Region geometries and names were supplied with different lengths.
    #[error("region geometries ({geometries}) and names ({names}) are misaligned")]
    MisalignedRegions { geometries: usize, names: usize },

    #[error("invalid scan configuration: {0}")]
    InvalidConfig(String),

    /// The scan was cancelled between rows.
    #[error("scan cancelled after {completed_rows} of {total_rows} rows")]
    Cancelled {
        completed_rows: usize,
        total_rows: usize,
    },
}

pub type Result<T> = std::result::Result<T, CoverageError>;
