use nalgebra::Vector3;
use pcd_core::pointcloud::point::Point;
use serde::{Deserialize, Serialize};

/// Cross products shorter than this come from (near) collinear samples.
pub const DEGENERATE_CROSS_NORM: f64 = 1e-4;

/// Plane `a*x + b*y + c*z + d = 0` with a unit normal `(a, b, c)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub normal: [f64; 3],
    pub d: f64,
}

impl Plane {
    pub fn from_points(p1: &Point, p2: &Point, p3: &Point) -> Option<Plane> {
        let p1 = to_vector(p1);
        let normal = (to_vector(p2) - p1).cross(&(to_vector(p3) - p1));
        let norm = normal.norm();
        if norm < DEGENERATE_CROSS_NORM {
            return None;
        }
        let unit = normal / norm;
        Some(Plane {
            normal: [unit.x, unit.y, unit.z],
            d: -unit.dot(&p1),
        })
    }

    pub fn normal_vector(&self) -> Vector3<f64> {
        Vector3::from(self.normal)
    }

    pub fn distance(&self, point: &Point) -> f64 {
        (self.normal_vector().dot(&to_vector(point)) + self.d).abs()
    }

    /// |c|: 1 for a horizontal plane, 0 for a vertical one.
    pub fn vertical_component(&self) -> f64 {
        self.normal[2].abs()
    }

    /// Same plane with the normal flipped to point up (c >= 0).
    pub fn facing_up(self) -> Plane {
        if self.normal[2] < 0.0 {
            Plane {
                normal: [-self.normal[0], -self.normal[1], -self.normal[2]],
                d: -self.d,
            }
        } else {
            self
        }
    }

    /// Height of the plane above (x, y); `None` for vertical planes.
    pub fn height_at(&self, x: f64, y: f64) -> Option<f64> {
        let [a, b, c] = self.normal;
        if c.abs() < 1e-9 {
            return None;
        }
        Some(-(a * x + b * y + self.d) / c)
    }
}

fn to_vector(point: &Point) -> Vector3<f64> {
    Vector3::new(point.x, point.y, point.z)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn fits_plane_through_three_points() {
        let plane = Plane::from_points(
            &Point::new(0.0, 0.0, 100.0),
            &Point::new(1000.0, 0.0, 100.0),
            &Point::new(0.0, 1000.0, 100.0),
        )
        .unwrap();

        assert_relative_eq!(plane.vertical_component(), 1.0);
        assert_relative_eq!(plane.distance(&Point::new(500.0, 500.0, 150.0)), 50.0);
        assert_relative_eq!(plane.facing_up().height_at(10.0, 20.0).unwrap(), 100.0);
    }

    #[test]
    fn collinear_points_are_degenerate() {
        let plane = Plane::from_points(
            &Point::new(0.0, 0.0, 0.0),
            &Point::new(1.0, 1.0, 1.0),
            &Point::new(2.0, 2.0, 2.0),
        );
        assert!(plane.is_none());
    }

    #[test]
    fn facing_up_flips_downward_normal() {
        let plane = Plane {
            normal: [0.0, 0.0, -1.0],
            d: 100.0,
        };
        let up = plane.facing_up();
        assert_eq!(up.normal, [0.0, 0.0, 1.0]);
        assert_relative_eq!(up.distance(&Point::new(0.0, 0.0, 100.0)), 0.0);
    }
}
