use pcd_core::pointcloud::bounds::BoundingVolume;
use pcd_detector::SurfaceType;
use serde::{Deserialize, Serialize};

use crate::model::{ClearancePriority, EnvironmentModel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintType {
    KeepClear,
    Obstruction,
    Opening,
    MountingPoint,
    Boundary,
}

/// A fact about the environment phrased for downstream design rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineeringConstraint {
    pub constraint_type: ConstraintType,
    pub description: String,
    pub location: BoundingVolume,
    pub confidence: f64,
    /// Id of the model element the constraint was read from.
    pub provenance: String,
}

pub fn extract_constraints(model: &EnvironmentModel) -> Vec<EngineeringConstraint> {
    let mut constraints = Vec::new();

    for zone in &model.clearance_zones {
        let confidence = match zone.priority {
            ClearancePriority::Required => 1.0,
            ClearancePriority::Preferred => 0.8,
            ClearancePriority::Optional => 0.5,
        };
        constraints.push(EngineeringConstraint {
            constraint_type: ConstraintType::KeepClear,
            description: format!("{} zone: {}", zone.zone_type, zone.description),
            location: zone.bounds,
            confidence,
            provenance: zone.id.clone(),
        });
    }

    for obstacle in &model.obstacles {
        let [w, d, h] = [obstacle.width, obstacle.depth, obstacle.height];
        constraints.push(EngineeringConstraint {
            constraint_type: ConstraintType::Obstruction,
            description: format!("{} of {:.0} x {:.0} x {:.0} mm", obstacle.obstacle_type, w, d, h),
            location: obstacle.bounds,
            confidence: obstacle.confidence,
            provenance: obstacle.id.clone(),
        });
    }

    for opening in &model.openings {
        constraints.push(EngineeringConstraint {
            constraint_type: ConstraintType::Opening,
            description: format!(
                "{} of {:.0} x {:.0} mm",
                opening.opening_type, opening.width, opening.height
            ),
            location: opening.bounds,
            confidence: opening.confidence,
            provenance: opening.id.clone(),
        });
    }

    for point in &model.attachment_points {
        constraints.push(EngineeringConstraint {
            constraint_type: ConstraintType::MountingPoint,
            description: format!("mounting point rated {:.0} kN", point.load_capacity_kn),
            location: BoundingVolume::new(point.position, point.position),
            confidence: point.confidence,
            provenance: point.id.clone(),
        });
    }

    for wall in model.surfaces_of_type(SurfaceType::Wall) {
        constraints.push(EngineeringConstraint {
            constraint_type: ConstraintType::Boundary,
            description: format!("wall of {:.1} m²", wall.area / 1.0e6),
            location: wall.bounds,
            confidence: wall.confidence,
            provenance: wall.id.clone(),
        });
    }

    constraints
}

#[cfg(test)]
mod tests {
    use pcd_detector::{DetectedSurface, Plane};

    use super::*;
    use crate::model::{ClearanceZone, ProcessingMetadata, ZoneType};

    #[test]
    fn walls_and_zones_become_constraints() {
        let bounds = BoundingVolume::new([0.0, 0.0, 0.0], [0.0, 4000.0, 3000.0]);
        let model = EnvironmentModel {
            bounds,
            surfaces: vec![DetectedSurface {
                id: "surface:room:wall-0".to_string(),
                surface_type: SurfaceType::Wall,
                plane: Plane {
                    normal: [1.0, 0.0, 0.0],
                    d: 0.0,
                },
                bounds,
                area: 1.2e7,
                sources: Vec::new(),
                confidence: 0.4,
            }],
            obstacles: Vec::new(),
            openings: Vec::new(),
            edges: Vec::new(),
            attachment_points: Vec::new(),
            clearance_zones: vec![ClearanceZone {
                id: "clearance:egress:door".to_string(),
                zone_type: ZoneType::Egress,
                bounds,
                priority: ClearancePriority::Required,
                description: "keep clear".to_string(),
            }],
            sources: Vec::new(),
            metadata: ProcessingMetadata::default(),
        };

        let constraints = extract_constraints(&model);
        assert_eq!(constraints.len(), 2);
        assert_eq!(constraints[0].constraint_type, ConstraintType::KeepClear);
        assert_eq!(constraints[0].confidence, 1.0);
        assert_eq!(constraints[0].description, "egress zone: keep clear");
        assert_eq!(constraints[1].constraint_type, ConstraintType::Boundary);
        assert_eq!(constraints[1].description, "wall of 12.0 m²");
        assert_eq!(constraints[1].provenance, "surface:room:wall-0");
    }
}
