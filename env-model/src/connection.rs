//! Feasibility of connecting pairs of attachment points.
//!
//! Every pair inside the distance window is tested against the obstacle
//! boxes and given a ranked list of ways to get from one end to the other.
//! Pairs are scored by whether the path is usable plus the feasibility of
//! their best suggestion, and only the best few are returned.

use std::cmp::Ordering;
use std::fmt;

use itertools::Itertools;
use pcd_core::pointcloud::bounds::BoundingVolume;
use serde::{Deserialize, Serialize};

use crate::model::{AttachmentPoint, EnvironmentModel};

/// Direction components smaller than this are treated as parallel to the slab.
const PARALLEL_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub min_distance: f64,
    pub max_distance: f64,
    /// When false, obstructed pairs still count as having a clear path.
    pub require_clear_path: bool,
    pub max_results: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            min_distance: 500.0,
            max_distance: 20000.0,
            require_clear_path: false,
            max_results: 20,
        }
    }
}

impl ConnectionConfig {
    pub fn with_max_distance(mut self, max_distance: f64) -> Self {
        self.max_distance = max_distance;
        self
    }

    pub fn with_require_clear_path(mut self, require_clear_path: bool) -> Self {
        self.require_clear_path = require_clear_path;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMethod {
    Walkway,
    Ramp,
    Stairs,
    Ladder,
    StairsWithLandings,
}

impl fmt::Display for AccessMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AccessMethod::Walkway => "walkway",
            AccessMethod::Ramp => "ramp",
            AccessMethod::Stairs => "stairs",
            AccessMethod::Ladder => "ladder",
            AccessMethod::StairsWithLandings => "stairs with landings",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessSuggestion {
    pub method: AccessMethod,
    pub feasibility: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionOpportunity {
    pub from: String,
    pub to: String,
    pub distance: f64,
    /// `to.z - from.z`, mm.
    pub elevation_change: f64,
    pub clear_path: bool,
    pub blocking_obstacles: Vec<String>,
    /// Highest feasibility first; ranking scores the opportunity by its
    /// first entry.
    pub suggestions: Vec<AccessSuggestion>,
}

impl ConnectionOpportunity {
    pub fn best_feasibility(&self) -> f64 {
        self.suggestions
            .first()
            .map_or(0.0, |suggestion| suggestion.feasibility)
    }

    fn score(&self) -> f64 {
        let clear = if self.clear_path { 1.0 } else { 0.0 };
        clear + self.best_feasibility()
    }
}

/// Slab test of the segment `start..=end` against `bounds`.
pub fn segment_intersects_aabb(start: [f64; 3], end: [f64; 3], bounds: &BoundingVolume) -> bool {
    let mut t_min: f64 = 0.0;
    let mut t_max: f64 = 1.0;

    for axis in 0..3 {
        let direction = end[axis] - start[axis];
        if direction.abs() < PARALLEL_EPSILON {
            if start[axis] < bounds.min[axis] || start[axis] > bounds.max[axis] {
                return false;
            }
            continue;
        }

        let t1 = (bounds.min[axis] - start[axis]) / direction;
        let t2 = (bounds.max[axis] - start[axis]) / direction;
        t_min = t_min.max(t1.min(t2));
        t_max = t_max.min(t1.max(t2));
        if t_min > t_max {
            return false;
        }
    }

    true
}

/// Ways to cover a horizontal run with a height change, best first.
pub fn suggest_access_methods(
    horizontal_distance: f64,
    elevation_change: f64,
    obstructed: bool,
) -> Vec<AccessSuggestion> {
    let rise = elevation_change.abs();
    if rise < 50.0 {
        let feasibility = if obstructed { 0.5 } else { 0.9 };
        return vec![AccessSuggestion {
            method: AccessMethod::Walkway,
            feasibility,
        }];
    }

    let slope = if horizontal_distance > 0.0 {
        rise / horizontal_distance
    } else {
        f64::INFINITY
    };

    let mut suggestions = Vec::new();
    if slope < 0.1 && rise < 750.0 {
        suggestions.push(AccessSuggestion {
            method: AccessMethod::Ramp,
            feasibility: 0.85,
        });
    }
    if rise > 300.0 && rise < 5000.0 {
        suggestions.push(AccessSuggestion {
            method: AccessMethod::Stairs,
            feasibility: 0.9,
        });
    }
    if rise >= 3000.0 {
        suggestions.push(AccessSuggestion {
            method: AccessMethod::Ladder,
            feasibility: 0.7,
        });
    }
    if rise > 4000.0 {
        suggestions.push(AccessSuggestion {
            method: AccessMethod::StairsWithLandings,
            feasibility: 0.8,
        });
    }

    // Stable, so equal feasibilities keep rule order.
    suggestions.sort_by(|a, b| {
        b.feasibility
            .partial_cmp(&a.feasibility)
            .unwrap_or(Ordering::Equal)
    });
    suggestions
}

fn analyze_pair(
    from: &AttachmentPoint,
    to: &AttachmentPoint,
    model: &EnvironmentModel,
    config: &ConnectionConfig,
) -> Option<ConnectionOpportunity> {
    let delta: Vec<f64> = (0..3).map(|axis| to.position[axis] - from.position[axis]).collect();
    let distance = delta.iter().map(|d| d * d).sum::<f64>().sqrt();
    if distance < config.min_distance || distance > config.max_distance {
        return None;
    }

    let blocking_obstacles: Vec<String> = model
        .obstacles
        .iter()
        .filter(|obstacle| segment_intersects_aabb(from.position, to.position, &obstacle.bounds))
        .map(|obstacle| obstacle.id.clone())
        .collect();
    let obstructed = !blocking_obstacles.is_empty();

    let horizontal_distance = delta[0].hypot(delta[1]);
    let suggestions = suggest_access_methods(horizontal_distance, delta[2], obstructed);

    Some(ConnectionOpportunity {
        from: from.id.clone(),
        to: to.id.clone(),
        distance,
        elevation_change: delta[2],
        clear_path: !obstructed || !config.require_clear_path,
        blocking_obstacles,
        suggestions,
    })
}

/// Best-scoring connections between the model's attachment points.
pub fn find_connection_opportunities(
    model: &EnvironmentModel,
    config: &ConnectionConfig,
) -> Vec<ConnectionOpportunity> {
    let mut opportunities: Vec<ConnectionOpportunity> = model
        .attachment_points
        .iter()
        .tuple_combinations()
        .filter_map(|(from, to)| analyze_pair(from, to, model, config))
        .collect();

    let candidates = opportunities.len();
    opportunities.sort_by(|a, b| b.score().partial_cmp(&a.score()).unwrap_or(Ordering::Equal));
    opportunities.truncate(config.max_results);

    log::debug!(
        "connections: kept {} of {} candidate pairs",
        opportunities.len(),
        candidates
    );

    opportunities
}
