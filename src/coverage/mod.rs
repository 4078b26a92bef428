use geo::{Area, BooleanOps, BoundingRect, Intersects, MultiPolygon, Polygon};
use tracing::trace;

use crate::coord::Coordinate;
use crate::physics::buffer::BufferModel;
use crate::regions::{Region, RegionStore};
use crate::terrain::ElevationProvider;

/// Minimum intersection area, in square degrees, for a region to count.
pub const DEFAULT_OVERLAP_THRESHOLD: f64 = 0.05;

/// Tests an elevation-scaled disk at a point against every region.
pub struct OverlapDetector<'a, E: ElevationProvider + ?Sized> {
    elevation: &'a E,
    model: BufferModel,
    threshold: f64,
}

impl<'a, E: ElevationProvider + ?Sized> OverlapDetector<'a, E> {
    pub fn new(elevation: &'a E, model: BufferModel, threshold: f64) -> Self {
        Self {
            elevation,
            model,
            threshold,
        }
    }

    pub fn model(&self) -> &BufferModel {
        &self.model
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Strict: an area equal to the threshold is not an overlap.
    #[inline]
    pub fn is_overlap(&self, area: f64) -> bool {
        area > self.threshold
    }

    /// Buffer disk at `point`, sized by the elevation at `point` itself.
    pub fn disk_at(&self, point: Coordinate) -> Polygon<f64> {
        let height = self.elevation.elevation(point);
        self.model.disk(point, height)
    }

    /// Area of disk ∩ region for each region, in region order.
    pub fn intersection_areas(&self, point: Coordinate, regions: &RegionStore) -> Vec<f64> {
        let disk = MultiPolygon::new(vec![self.disk_at(point)]);
        let Some(disk_rect) = disk.bounding_rect() else {
            return vec![0.0; regions.len()];
        };
        if disk.unsigned_area() == 0.0 {
            return vec![0.0; regions.len()];
        }
        regions
            .iter()
            .map(|region| intersection_area(&disk, disk_rect, region))
            .collect()
    }

    /// One flag per region, aligned with `regions`.
    pub fn overlaps(&self, point: Coordinate, regions: &RegionStore) -> Vec<bool> {
        self.intersection_areas(point, regions)
            .into_iter()
            .map(|area| self.is_overlap(area))
            .collect()
    }

    pub fn overlap_count(&self, point: Coordinate, regions: &RegionStore) -> u32 {
        self.overlaps(point, regions).into_iter().filter(|&o| o).count() as u32
    }

    /// Names of the regions the disk at `point` overlaps.
    pub fn overlapping_names<'r>(
        &self,
        point: Coordinate,
        regions: &'r RegionStore,
    ) -> Vec<&'r str> {
        let flags = self.overlaps(point, regions);
        regions
            .iter()
            .zip(flags)
            .filter(|(_, overlapping)| *overlapping)
            .map(|(region, _)| region.name.as_str())
            .collect()
    }
}

fn intersection_area(disk: &MultiPolygon<f64>, disk_rect: geo::Rect<f64>, region: &Region) -> f64 {
    match region.geometry.bounding_rect() {
        Some(rect) if rect.intersects(&disk_rect) => {}
        _ => return 0.0,
    }
    let area = region.geometry.intersection(disk).unsigned_area();
    trace!(region = %region.name, area, "disk intersection");
    area
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;
    use std::f64::consts::PI;

    struct FlatTerrain(f64);

    impl ElevationProvider for FlatTerrain {
        fn elevation(&self, _at: Coordinate) -> f64 {
            self.0
        }
    }

    fn rect(name: &str, x0: f64, y0: f64, x1: f64, y1: f64) -> Region {
        Region::from_polygon(
            name,
            polygon![(x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1)],
        )
    }

    // Height giving a 0.2 degree radius: disk area ~0.126 sq deg.
    fn height_for_radius(r: f64) -> f64 {
        let model = BufferModel::default();
        (r * model.km_per_degree / model.scale).powi(2)
    }

    #[test]
    fn test_vector_aligned_with_regions() {
        let terrain = FlatTerrain(height_for_radius(0.2));
        let detector =
            OverlapDetector::new(&terrain, BufferModel::default(), DEFAULT_OVERLAP_THRESHOLD);
        let regions = RegionStore::new(vec![
            rect("west", -1.0, -1.0, 0.0, 1.0),
            rect("far", 10.0, 10.0, 11.0, 11.0),
            rect("east", 0.0, -1.0, 1.0, 1.0),
        ]);
        let point = Coordinate::new(0.0, 0.0);
        let flags = detector.overlaps(point, &regions);
        assert_eq!(flags, vec![true, false, true]);
        assert_eq!(detector.overlap_count(point, &regions), 2);
        assert_eq!(detector.overlapping_names(point, &regions), vec!["west", "east"]);
    }

    #[test]
    fn test_disk_fully_inside_region_matches_disk_area() {
        let r = 0.2;
        let terrain = FlatTerrain(height_for_radius(r));
        let detector =
            OverlapDetector::new(&terrain, BufferModel::default(), DEFAULT_OVERLAP_THRESHOLD);
        let regions = RegionStore::new(vec![rect("all", -5.0, -5.0, 5.0, 5.0)]);
        let areas = detector.intersection_areas(Coordinate::new(0.5, 0.5), &regions);
        assert!((areas[0] - PI * r * r).abs() / (PI * r * r) < 0.01);
    }

    #[test]
    fn test_threshold_is_strict() {
        let terrain = FlatTerrain(height_for_radius(0.2));
        let regions = RegionStore::new(vec![rect("all", -5.0, -5.0, 5.0, 5.0)]);
        let point = Coordinate::new(0.0, 0.0);
        let unfiltered = OverlapDetector::new(&terrain, BufferModel::default(), 0.0);
        let area = unfiltered.intersection_areas(point, &regions)[0];

        let at_threshold = OverlapDetector::new(&terrain, BufferModel::default(), area);
        assert_eq!(at_threshold.overlaps(point, &regions), vec![false]);

        let below = OverlapDetector::new(&terrain, BufferModel::default(), area * (1.0 - 1e-9));
        assert_eq!(below.overlaps(point, &regions), vec![true]);

        assert!(!unfiltered.is_overlap(0.0));
        assert_eq!(at_threshold.threshold(), area);
    }

    #[test]
    fn test_grazing_overlap_is_ignored() {
        let terrain = FlatTerrain(height_for_radius(0.2));
        let detector =
            OverlapDetector::new(&terrain, BufferModel::default(), DEFAULT_OVERLAP_THRESHOLD);
        // Region edge 0.15 degrees from the center: a thin sliver of the disk.
        let regions = RegionStore::new(vec![rect("edge", 0.15, -1.0, 2.0, 1.0)]);
        let point = Coordinate::new(0.0, 0.0);
        let area = detector.intersection_areas(point, &regions)[0];
        assert!(area > 0.0);
        assert_eq!(detector.overlaps(point, &regions), vec![false]);
    }

    #[test]
    fn test_degenerate_region_never_overlaps() {
        let terrain = FlatTerrain(height_for_radius(0.5));
        let detector =
            OverlapDetector::new(&terrain, BufferModel::default(), DEFAULT_OVERLAP_THRESHOLD);
        let regions = RegionStore::new(vec![
            rect("flat", 0.0, 0.0, 1.0, 0.0),
            Region::new("empty", MultiPolygon::new(vec![])),
        ]);
        assert_eq!(detector.overlaps(Coordinate::new(0.5, 0.0), &regions), vec![false, false]);
    }

    #[test]
    fn test_zero_height_disk_has_no_area() {
        let terrain = FlatTerrain(0.0);
        let detector = OverlapDetector::new(&terrain, BufferModel::default(), 0.0);
        let regions = RegionStore::new(vec![rect("all", -5.0, -5.0, 5.0, 5.0)]);
        assert_eq!(detector.overlaps(Coordinate::new(0.0, 0.0), &regions), vec![false]);
    }

    #[test]
    fn test_overlaps_is_idempotent() {
        let terrain = FlatTerrain(height_for_radius(0.3));
        let detector =
            OverlapDetector::new(&terrain, BufferModel::default(), DEFAULT_OVERLAP_THRESHOLD);
        let regions = RegionStore::new(vec![
            rect("a", -1.0, -1.0, 0.1, 1.0),
            rect("b", 0.1, -1.0, 1.0, 1.0),
        ]);
        let point = Coordinate::new(0.0, 0.2);
        assert_eq!(detector.overlaps(point, &regions), detector.overlaps(point, &regions));
    }
}
