use pcd_core::pointcloud::bounds::BoundingVolume;
use pcd_detector::{DetectedObstacle, ObstacleType};

use crate::{
    config::ClearanceConfig,
    image::{DetectedOpening, OpeningType},
    model::{ClearancePriority, ClearanceZone, ZoneType},
};

// The door plane is taken to be the opening box's y centre.
fn egress_zone(door: &DetectedOpening, config: &ClearanceConfig) -> ClearanceZone {
    let [_, plane_y, _] = door.bounds.center();
    let half_depth = config.egress_depth / 2.0;
    ClearanceZone {
        id: format!("clearance:egress:{}", door.id),
        zone_type: ZoneType::Egress,
        bounds: BoundingVolume::new(
            [
                door.bounds.min[0] - config.egress_side_margin,
                plane_y - half_depth,
                door.bounds.min[2],
            ],
            [
                door.bounds.max[0] + config.egress_side_margin,
                plane_y + half_depth,
                door.bounds.max[2],
            ],
        ),
        priority: ClearancePriority::Required,
        description: format!("keep egress through {} clear", door.id),
    }
}

fn equipment_zone(obstacle: &DetectedObstacle, config: &ClearanceConfig) -> ClearanceZone {
    ClearanceZone {
        id: format!("clearance:equipment:{}", obstacle.id),
        zone_type: ZoneType::Equipment,
        bounds: obstacle.bounds.expanded(
            config.equipment_lateral_margin,
            config.equipment_vertical_margin,
        ),
        priority: ClearancePriority::Preferred,
        description: format!("service access around {}", obstacle.id),
    }
}

/// Egress zones in front of doors followed by access zones around equipment.
pub fn derive_clearance_zones(
    openings: &[DetectedOpening],
    obstacles: &[DetectedObstacle],
    config: &ClearanceConfig,
) -> Vec<ClearanceZone> {
    let doors = openings
        .iter()
        .filter(|opening| opening.opening_type == OpeningType::Door)
        .map(|door| egress_zone(door, config));
    let equipment = obstacles
        .iter()
        .filter(|obstacle| obstacle.obstacle_type == ObstacleType::Equipment)
        .map(|obstacle| equipment_zone(obstacle, config));

    doors.chain(equipment).collect()
}

#[cfg(test)]
mod tests {
    use pcd_detector::CloudIndices;

    use super::*;

    fn opening(opening_type: OpeningType) -> DetectedOpening {
        DetectedOpening {
            id: format!("opening:cam:{}", opening_type),
            opening_type,
            bounds: BoundingVolume::new([200.0, 0.0, 0.0], [1100.0, 0.0, 2100.0]),
            width: 900.0,
            height: 2100.0,
            confidence: 0.72,
            source_image: "cam".to_string(),
        }
    }

    fn obstacle(obstacle_type: ObstacleType) -> DetectedObstacle {
        DetectedObstacle {
            id: "obstacle:room:0".to_string(),
            obstacle_type,
            bounds: BoundingVolume::new([1000.0, 1000.0, 0.0], [2000.0, 2000.0, 1000.0]),
            centroid: [1500.0, 1500.0, 500.0],
            width: 1000.0,
            depth: 1000.0,
            height: 1000.0,
            source: CloudIndices {
                cloud_id: "room".to_string(),
                indices: Vec::new(),
            },
            confidence: 0.6,
        }
    }

    #[test]
    fn door_gets_required_egress_zone() {
        let zones = derive_clearance_zones(
            &[opening(OpeningType::Door), opening(OpeningType::Window)],
            &[],
            &ClearanceConfig::default(),
        );

        assert_eq!(zones.len(), 1);
        let zone = &zones[0];
        assert_eq!(zone.zone_type, ZoneType::Egress);
        assert_eq!(zone.priority, ClearancePriority::Required);
        assert_eq!(zone.bounds.min, [-300.0, -1000.0, 0.0]);
        assert_eq!(zone.bounds.max, [1600.0, 1000.0, 2100.0]);
        // width + 1000 across, 2000 deep
        assert_eq!(zone.bounds.dimensions(), [1900.0, 2000.0, 2100.0]);
    }

    #[test]
    fn equipment_gets_preferred_margin_zone() {
        let zones = derive_clearance_zones(
            &[],
            &[obstacle(ObstacleType::Equipment), obstacle(ObstacleType::Column)],
            &ClearanceConfig::default(),
        );

        assert_eq!(zones.len(), 1);
        let zone = &zones[0];
        assert_eq!(zone.zone_type, ZoneType::Equipment);
        assert_eq!(zone.priority, ClearancePriority::Preferred);
        assert_eq!(zone.bounds.min, [250.0, 250.0, -500.0]);
        assert_eq!(zone.bounds.max, [2750.0, 2750.0, 1500.0]);
    }
}
