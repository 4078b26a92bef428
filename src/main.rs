use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;

use overlap_coverage::config::ScanConfig;
use overlap_coverage::io::{load_config, load_scene, write_matrix_csv};
use overlap_coverage::scan::{GridScanner, ScanControl};
use overlap_coverage::terrain::ElevationProvider;

/// Count, for every point of a grid, how many regions an elevation-scaled
/// disk around it overlaps.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// JSON scene with the elevation raster and the ordered regions
    #[arg(long)]
    scene: PathBuf,

    /// JSON scan configuration (defaults are used when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the count matrix as CSV here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Override the configured points per axis
    #[arg(long)]
    resolution: Option<usize>,

    /// Scan rows on the current thread only
    #[arg(long)]
    sequential: bool,

    /// Verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbosity: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(match args.verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        })
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default tracing subscriber failed")?;

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ScanConfig::default(),
    };
    if let Some(resolution) = args.resolution {
        config.resolution = resolution;
    }
    if args.sequential {
        config.parallel = false;
    }

    let scene = load_scene(&args.scene)?;
    info!(
        rows = scene.raster.rows(),
        cols = scene.raster.cols(),
        regions = scene.regions.len(),
        "scene loaded"
    );

    let sampler = config.sampler(scene.raster);
    let scanner = GridScanner::new(&sampler, &scene.regions, config.clone())?;

    let report = scanner.run(&ScanControl::default())?;
    info!(max = report.max_count, cells = report.best.len(), "maximum overlap");
    for best in &report.best {
        info!(
            row = best.row,
            col = best.col,
            lon = best.location.longitude,
            lat = best.location.latitude,
            regions = ?best.regions,
            "best cell"
        );
    }
    if report.max_count == 0 {
        warn!("no grid point overlaps any region above the threshold");
    }

    let detector = scanner.detector();
    for probe in &config.probes {
        let height = sampler.elevation(probe.location);
        info!(
            probe = %probe.name,
            height,
            radius_deg = detector.model().buffer_radius_degrees(height),
            regions = ?detector.overlapping_names(probe.location, &scene.regions),
            "probe"
        );
    }

    match &args.output {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
            write_matrix_csv(&report.matrix, BufWriter::new(file))?;
        }
        None => write_matrix_csv(&report.matrix, std::io::stdout().lock())?,
    }
    Ok(())
}
