use serde::{Deserialize, Serialize};

const MM3_PER_M3: f64 = 1.0e9;

// Axis-aligned box in millimetres. An empty input produces the zero box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingVolume {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl BoundingVolume {
    pub fn new(min: [f64; 3], max: [f64; 3]) -> Self {
        Self { min, max }
    }

    pub fn from_positions<I>(positions: I) -> Self
    where
        I: IntoIterator<Item = [f64; 3]>,
    {
        let mut bounding_volume = BoundingVolume {
            min: [f64::MAX, f64::MAX, f64::MAX],
            max: [f64::MIN, f64::MIN, f64::MIN],
        };
        let mut seen = false;

        for position in positions {
            for axis in 0..3 {
                bounding_volume.min[axis] = bounding_volume.min[axis].min(position[axis]);
                bounding_volume.max[axis] = bounding_volume.max[axis].max(position[axis]);
            }
            seen = true;
        }

        if seen {
            bounding_volume
        } else {
            BoundingVolume::default()
        }
    }

    pub fn dimensions(&self) -> [f64; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }

    pub fn center(&self) -> [f64; 3] {
        [
            (self.min[0] + self.max[0]) / 2.0,
            (self.min[1] + self.max[1]) / 2.0,
            (self.min[2] + self.max[2]) / 2.0,
        ]
    }

    /// Volume in cubic metres; zero for degenerate boxes.
    pub fn volume_m3(&self) -> f64 {
        let [dx, dy, dz] = self.dimensions();
        let volume = dx * dy * dz;
        if volume > 0.0 {
            volume / MM3_PER_M3
        } else {
            0.0
        }
    }

    /// Footprint area on the XY plane in mm².
    pub fn xy_area(&self) -> f64 {
        let [dx, dy, _] = self.dimensions();
        (dx * dy).max(0.0)
    }

    pub fn xy_overlap_area(&self, other: &BoundingVolume) -> f64 {
        let overlap_x = self.max[0].min(other.max[0]) - self.min[0].max(other.min[0]);
        let overlap_y = self.max[1].min(other.max[1]) - self.min[1].max(other.min[1]);
        if overlap_x <= 0.0 || overlap_y <= 0.0 {
            return 0.0;
        }
        overlap_x * overlap_y
    }

    pub fn contains(&self, position: [f64; 3]) -> bool {
        (0..3).all(|axis| position[axis] >= self.min[axis] && position[axis] <= self.max[axis])
    }

    /// Closed-interval overlap on all three axes; touching boxes overlap.
    pub fn overlaps(&self, other: &BoundingVolume) -> bool {
        (0..3).all(|axis| self.min[axis] <= other.max[axis] && other.min[axis] <= self.max[axis])
    }

    pub fn intersection(&self, other: &BoundingVolume) -> Option<BoundingVolume> {
        if !self.overlaps(other) {
            return None;
        }
        let mut min = [0.0; 3];
        let mut max = [0.0; 3];
        for axis in 0..3 {
            min[axis] = self.min[axis].max(other.min[axis]);
            max[axis] = self.max[axis].min(other.max[axis]);
        }
        Some(BoundingVolume { min, max })
    }

    pub fn union(&self, other: &BoundingVolume) -> BoundingVolume {
        let mut min = [0.0; 3];
        let mut max = [0.0; 3];
        for axis in 0..3 {
            min[axis] = self.min[axis].min(other.min[axis]);
            max[axis] = self.max[axis].max(other.max[axis]);
        }
        BoundingVolume { min, max }
    }

    pub fn expanded(&self, lateral: f64, vertical: f64) -> BoundingVolume {
        BoundingVolume {
            min: [
                self.min[0] - lateral,
                self.min[1] - lateral,
                self.min[2] - vertical,
            ],
            max: [
                self.max[0] + lateral,
                self.max[1] + lateral,
                self.max[2] + vertical,
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_positions_give_zero_box() {
        let bounds = BoundingVolume::from_positions(std::iter::empty());
        assert_eq!(bounds, BoundingVolume::default());
        assert_eq!(bounds.volume_m3(), 0.0);
    }

    #[test]
    fn volume_is_reported_in_cubic_metres() {
        let bounds = BoundingVolume::new([0.0, 0.0, 0.0], [1000.0, 2000.0, 500.0]);
        assert_eq!(bounds.volume_m3(), 1.0);
    }

    #[test]
    fn touching_boxes_overlap() {
        let a = BoundingVolume::new([0.0, 0.0, 0.0], [10.0, 10.0, 10.0]);
        let b = BoundingVolume::new([10.0, 0.0, 0.0], [20.0, 10.0, 10.0]);
        let c = BoundingVolume::new([10.5, 0.0, 0.0], [20.0, 10.0, 10.0]);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        assert_eq!(
            a.intersection(&b),
            Some(BoundingVolume::new([10.0, 0.0, 0.0], [10.0, 10.0, 10.0]))
        );
    }

    #[test]
    fn xy_overlap_ignores_height() {
        let a = BoundingVolume::new([0.0, 0.0, 0.0], [100.0, 100.0, 0.0]);
        let b = BoundingVolume::new([50.0, 50.0, 900.0], [150.0, 150.0, 900.0]);
        assert_eq!(a.xy_overlap_area(&b), 2500.0);
        assert_eq!(a.xy_area(), 10000.0);
    }
}
