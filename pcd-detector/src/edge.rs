use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::surface::{DetectedSurface, SurfaceType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    WallFloor,
    WallWall,
    WallCeiling,
    Curb,
}

impl EdgeType {
    /// Seam kind for a pair of surface types, in either order.
    pub fn between(a: SurfaceType, b: SurfaceType) -> Self {
        use SurfaceType::*;
        match (a, b) {
            (Wall, Floor) | (Floor, Wall) => EdgeType::WallFloor,
            (Wall, Wall) => EdgeType::WallWall,
            (Wall, Ceiling) | (Ceiling, Wall) => EdgeType::WallCeiling,
            _ => EdgeType::Curb,
        }
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EdgeType::WallFloor => "wall-floor",
            EdgeType::WallWall => "wall-wall",
            EdgeType::WallCeiling => "wall-ceiling",
            EdgeType::Curb => "curb",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedEdge {
    pub id: String,
    pub edge_type: EdgeType,
    pub start: [f64; 3],
    pub end: [f64; 3],
    pub length: f64,
    pub confidence: f64,
    /// Ids of the two surfaces meeting here.
    pub surfaces: (String, String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeConfig {
    /// Keep seams between surface pairs that are not wall-floor, wall-wall
    /// or wall-ceiling.
    pub include_curbs: bool,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            include_curbs: true,
        }
    }
}

impl EdgeConfig {
    pub fn with_include_curbs(mut self, include_curbs: bool) -> Self {
        self.include_curbs = include_curbs;
        self
    }
}

/// Approximates the seam between every pair of surfaces whose boxes touch.
///
/// The seam runs between the two opposite corners of the box intersection,
/// so it is only as good as the axis-aligned bounds it comes from.
pub fn detect_edges(surfaces: &[DetectedSurface], config: &EdgeConfig) -> Vec<DetectedEdge> {
    let edges: Vec<DetectedEdge> = surfaces
        .iter()
        .tuple_combinations()
        .filter_map(|(a, b)| {
            let overlap = a.bounds.intersection(&b.bounds)?;
            let edge_type = EdgeType::between(a.surface_type, b.surface_type);
            if edge_type == EdgeType::Curb && !config.include_curbs {
                return None;
            }

            let start = overlap.min;
            let end = overlap.max;
            let length = ((end[0] - start[0]).powi(2)
                + (end[1] - start[1]).powi(2)
                + (end[2] - start[2]).powi(2))
            .sqrt();

            Some(DetectedEdge {
                id: format!("edge:{}+{}", a.id, b.id),
                edge_type,
                start,
                end,
                length,
                confidence: a.confidence.min(b.confidence),
                surfaces: (a.id.clone(), b.id.clone()),
            })
        })
        .collect();

    log::debug!(
        "edges: {} seams among {} surfaces",
        edges.len(),
        surfaces.len()
    );

    edges
}
