use pcd_detector::{DetectedSurface, SurfaceType};

use crate::{
    config::AttachmentConfig,
    model::{AttachmentMethod, AttachmentPoint, AttachmentType},
};

const UP: [f64; 3] = [0.0, 0.0, 1.0];

/// Grid positions from `min` to `max` inclusive. Empty for a bad step.
fn steps(min: f64, max: f64, spacing: f64) -> Vec<f64> {
    if spacing.is_nan() || spacing <= 0.0 || max < min {
        return Vec::new();
    }
    let count = ((max - min) / spacing).floor() as usize;
    (0..=count).map(|i| min + i as f64 * spacing).collect()
}

fn floor_points(surface: &DetectedSurface, config: &AttachmentConfig) -> Vec<AttachmentPoint> {
    let bounds = &surface.bounds;
    let xs = steps(bounds.min[0], bounds.max[0], config.floor_spacing);
    let ys = steps(bounds.min[1], bounds.max[1], config.floor_spacing);

    let mut points = Vec::with_capacity(xs.len() * ys.len());
    for &x in &xs {
        for &y in &ys {
            let z = surface
                .plane
                .height_at(x, y)
                .unwrap_or(bounds.min[2])
                .clamp(bounds.min[2], bounds.max[2]);
            points.push(AttachmentPoint {
                id: format!("attach:{}:{}", surface.id, points.len()),
                position: [x, y, z],
                normal: UP,
                surface_id: surface.id.clone(),
                attachment_type: AttachmentType::FloorAnchor,
                load_capacity_kn: config.floor_capacity_kn,
                methods: vec![
                    AttachmentMethod::ExpansionAnchor,
                    AttachmentMethod::ChemicalAnchor,
                ],
                clearance: config.floor_envelope,
                confidence: surface.confidence * config.floor_confidence_scale,
            });
        }
    }
    points
}

// Rows run along the longer horizontal side of the wall's box; the other
// horizontal coordinate is read off the wall plane.
fn wall_points(surface: &DetectedSurface, config: &AttachmentConfig) -> Vec<AttachmentPoint> {
    let bounds = &surface.bounds;
    let [dx, dy, _] = bounds.dimensions();
    let [a, b, c] = surface.plane.normal;
    let d = surface.plane.d;
    let (along, across) = if dx >= dy { (0, 1) } else { (1, 0) };
    let across_coefficient = if along == 0 { b } else { a };
    let along_coefficient = if along == 0 { a } else { b };

    let runs = steps(
        bounds.min[along],
        bounds.max[along],
        config.wall_horizontal_spacing,
    );
    let rows = steps(
        bounds.min[2] + config.wall_base_offset,
        bounds.max[2],
        config.wall_vertical_spacing,
    );

    let mut points = Vec::with_capacity(runs.len() * rows.len());
    for &t in &runs {
        for &z in &rows {
            let offset = if across_coefficient.abs() > 1e-9 {
                -(along_coefficient * t + c * z + d) / across_coefficient
            } else {
                bounds.center()[across]
            };
            let mut position = [0.0, 0.0, z];
            position[along] = t;
            position[across] = offset.clamp(bounds.min[across], bounds.max[across]);

            points.push(AttachmentPoint {
                id: format!("attach:{}:{}", surface.id, points.len()),
                position,
                normal: surface.plane.normal,
                surface_id: surface.id.clone(),
                attachment_type: AttachmentType::WallMount,
                load_capacity_kn: config.wall_capacity_kn,
                methods: vec![AttachmentMethod::ExpansionAnchor, AttachmentMethod::ThroughBolt],
                clearance: config.wall_envelope,
                confidence: surface.confidence * config.wall_confidence_scale,
            });
        }
    }
    points
}

/// Candidate mounting points on floors and walls. Other surface types get none.
pub fn generate_attachment_points(
    surfaces: &[DetectedSurface],
    config: &AttachmentConfig,
) -> Vec<AttachmentPoint> {
    surfaces
        .iter()
        .flat_map(|surface| match surface.surface_type {
            SurfaceType::Floor => floor_points(surface, config),
            SurfaceType::Wall => wall_points(surface, config),
            SurfaceType::Ceiling
            | SurfaceType::Ramp
            | SurfaceType::Stairs
            | SurfaceType::Irregular => Vec::new(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use pcd_core::pointcloud::bounds::BoundingVolume;
    use pcd_detector::Plane;

    use super::*;

    fn surface(
        surface_type: SurfaceType,
        plane: Plane,
        min: [f64; 3],
        max: [f64; 3],
    ) -> DetectedSurface {
        DetectedSurface {
            id: format!("surface:room:{}", surface_type),
            surface_type,
            plane,
            bounds: BoundingVolume::new(min, max),
            area: 0.0,
            sources: Vec::new(),
            confidence: 0.5,
        }
    }

    #[test]
    fn floor_grid_every_metre() {
        let floor = surface(
            SurfaceType::Floor,
            Plane {
                normal: [0.0, 0.0, 1.0],
                d: -100.0,
            },
            [0.0, 0.0, 100.0],
            [2500.0, 1000.0, 100.0],
        );
        let points = generate_attachment_points(&[floor], &AttachmentConfig::default());

        // x: 0, 1000, 2000; y: 0, 1000
        assert_eq!(points.len(), 6);
        assert!(points.iter().all(|p| p.position[2] == 100.0));
        assert!(points.iter().all(|p| p.normal == UP));
        assert!(points.iter().all(|p| p.load_capacity_kn == 50.0));
        assert_relative_eq!(points[0].confidence, 0.45, epsilon = 1e-12);
        assert_eq!(points[5].position, [2000.0, 1000.0, 100.0]);
        assert_eq!(points[0].surface_id, "surface:room:floor");
    }

    #[test]
    fn wall_grid_starts_above_the_base() {
        let wall = surface(
            SurfaceType::Wall,
            Plane {
                normal: [1.0, 0.0, 0.0],
                d: -300.0,
            },
            [300.0, 0.0, 0.0],
            [300.0, 2000.0, 1600.0],
        );
        let points = generate_attachment_points(&[wall], &AttachmentConfig::default());

        // y: 0, 1000, 2000; z: 500, 1000, 1500
        assert_eq!(points.len(), 9);
        assert!(points.iter().all(|p| p.position[0] == 300.0));
        assert!(points.iter().all(|p| p.position[2] >= 500.0));
        assert!(points.iter().all(|p| p.normal == [1.0, 0.0, 0.0]));
        assert!(points.iter().all(|p| p.attachment_type == AttachmentType::WallMount));
        assert_relative_eq!(points[0].confidence, 0.4, epsilon = 1e-12);
    }

    #[test]
    fn low_walls_and_ceilings_get_nothing() {
        let wall = surface(
            SurfaceType::Wall,
            Plane {
                normal: [0.0, 1.0, 0.0],
                d: 0.0,
            },
            [0.0, 0.0, 0.0],
            [3000.0, 0.0, 400.0],
        );
        let ceiling = surface(
            SurfaceType::Ceiling,
            Plane {
                normal: [0.0, 0.0, 1.0],
                d: -3000.0,
            },
            [0.0, 0.0, 3000.0],
            [3000.0, 3000.0, 3000.0],
        );
        let points = generate_attachment_points(&[wall, ceiling], &AttachmentConfig::default());
        assert!(points.is_empty());
    }
}
