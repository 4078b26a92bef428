pub mod coord;
pub mod error;
pub mod io;
pub mod terrain;
pub mod physics;
pub mod regions;
pub mod coverage;
pub mod scan;
pub mod config;

pub use error::{CoverageError, Result};
