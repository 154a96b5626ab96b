use std::collections::BTreeMap;

use crate::pointcloud::point::{Color, Point, PointCloud};

pub trait PointCloudDecimator {
    fn decimate(&self, points: &[Point]) -> Vec<Point>;
}

/// Replaces the members of every occupied voxel by their mean.
///
/// Voxels are emitted in ascending key order. Means are clamped to the
/// member extent so a second pass with the same size returns the same points.
pub struct VoxelDecimator {
    pub voxel_size: f64,
}

impl PointCloudDecimator for VoxelDecimator {
    fn decimate(&self, points: &[Point]) -> Vec<Point> {
        let voxel_size = self.voxel_size;
        let mut cells: BTreeMap<(i64, i64, i64), Vec<&Point>> = BTreeMap::new();

        for point in points {
            let index = self.get_voxel_index(point, voxel_size);
            cells.entry(index).or_default().push(point);
        }

        log::debug!("  Number of cells: {}", cells.len());

        cells
            .into_values()
            .map(|cell_points| self.average(&cell_points))
            .collect()
    }
}

impl VoxelDecimator {
    pub fn new(voxel_size: f64) -> Self {
        Self { voxel_size }
    }

    fn get_voxel_index(&self, point: &Point, voxel_size: f64) -> (i64, i64, i64) {
        let x_idx = (point.x / voxel_size).floor() as i64;
        let y_idx = (point.y / voxel_size).floor() as i64;
        let z_idx = (point.z / voxel_size).floor() as i64;
        (x_idx, y_idx, z_idx)
    }

    fn average(&self, cell_points: &[&Point]) -> Point {
        let count = cell_points.len() as f64;
        let mut sum = [0.0; 3];
        let mut min = [f64::MAX; 3];
        let mut max = [f64::MIN; 3];

        for point in cell_points {
            for (axis, value) in point.position().into_iter().enumerate() {
                sum[axis] += value;
                min[axis] = min[axis].min(value);
                max[axis] = max[axis].max(value);
            }
        }

        let mean = |axis: usize| (sum[axis] / count).clamp(min[axis], max[axis]);

        let colors: Vec<Color> = cell_points.iter().filter_map(|p| p.color).collect();
        let color = if colors.is_empty() {
            None
        } else {
            let n = colors.len() as f64;
            let channel = |f: fn(&Color) -> u16| {
                (colors.iter().map(|c| f(c) as f64).sum::<f64>() / n).round() as u16
            };
            Some(Color {
                r: channel(|c| c.r),
                g: channel(|c| c.g),
                b: channel(|c| c.b),
            })
        };

        Point {
            color,
            ..Point::new(mean(0), mean(1), mean(2))
        }
    }
}

/// Downsamples a cloud into one mean point per occupied voxel of `size` mm.
///
/// A non-positive or non-finite size leaves the points untouched.
pub fn voxel_downsample(cloud: &PointCloud, size: f64) -> PointCloud {
    if !(size.is_finite() && size > 0.0) {
        log::warn!("voxel size {} ignored, cloud {} left as is", size, cloud.id());
        return cloud.derive("voxel", cloud.points().to_vec());
    }

    let decimator = VoxelDecimator::new(size);
    let points = decimator.decimate(cloud.points());
    log::debug!(
        "voxel downsample {}: {} -> {} points",
        cloud.id(),
        cloud.len(),
        points.len()
    );
    cloud.derive("voxel", points)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn cloud(points: Vec<Point>) -> PointCloud {
        PointCloud::new("test", points, "unit", HashMap::new())
    }

    fn scattered() -> Vec<Point> {
        (0..500)
            .map(|i| {
                let i = i as f64;
                Point::new((i * 37.3) % 997.0, (i * 11.9) % 503.0, (i * 71.1) % 211.0 - 100.0)
            })
            .collect()
    }

    #[test]
    fn averages_members_of_a_voxel() {
        let points = vec![
            Point::new(0.0, 0.0, 0.0).with_color(Color { r: 0, g: 10, b: 20 }),
            Point::new(10.0, 20.0, 30.0).with_color(Color { r: 10, g: 20, b: 40 }),
            Point::new(150.0, 0.0, 0.0),
        ];
        let decimated = voxel_downsample(&cloud(points), 100.0);

        assert_eq!(decimated.len(), 2);
        assert_eq!(decimated.points()[0].position(), [5.0, 10.0, 15.0]);
        assert_eq!(
            decimated.points()[0].color,
            Some(Color { r: 5, g: 15, b: 30 })
        );
        assert_eq!(decimated.points()[1].position(), [150.0, 0.0, 0.0]);
        assert_eq!(decimated.points()[1].color, None);
    }

    #[test]
    fn output_is_ordered_by_voxel_key() {
        let points = vec![
            Point::new(500.0, 0.0, 0.0),
            Point::new(-500.0, 0.0, 0.0),
            Point::new(0.0, 0.0, 0.0),
        ];
        let decimated = voxel_downsample(&cloud(points), 100.0);
        let xs: Vec<f64> = decimated.points().iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![-500.0, 0.0, 500.0]);
    }

    #[test]
    fn downsampling_is_idempotent() {
        let once = voxel_downsample(&cloud(scattered()), 50.0);
        let twice = voxel_downsample(&once, 50.0);

        assert!(once.len() < 500);
        assert_eq!(once.points(), twice.points());
        assert_eq!(once.bounds(), twice.bounds());
    }

    #[test]
    fn bounds_contain_every_output_point() {
        let decimated = voxel_downsample(&cloud(scattered()), 80.0);
        assert!(decimated
            .iter()
            .all(|(x, y, z, _)| decimated.bounds().contains([x, y, z])));
    }

    #[test]
    fn invalid_size_leaves_points_untouched() {
        let input = cloud(scattered());
        let output = voxel_downsample(&input, 0.0);
        assert_eq!(output.points(), input.points());
    }
}
