use std::collections::HashMap;

use rayon::prelude::*;

use crate::pointcloud::point::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// Points at exactly `radius` are neighbours.
    Inclusive,
    /// Only points strictly closer than `radius` are neighbours.
    Exclusive,
}

/// Uniform hash grid over a subset of points for radius queries.
///
/// Queries return the same index set a brute-force scan would, sorted
/// ascending, so callers stay independent of bucket layout.
pub struct SpatialGrid {
    cell_size: f64,
    cells: HashMap<(i64, i64, i64), Vec<usize>>,
    positions: HashMap<usize, [f64; 3]>,
}

impl SpatialGrid {
    pub fn new<I>(entries: I, cell_size: f64) -> Self
    where
        I: IntoIterator<Item = (usize, [f64; 3])>,
    {
        let cell_size = if cell_size > 0.0 && cell_size.is_finite() {
            cell_size
        } else {
            1.0
        };
        let mut cells: HashMap<(i64, i64, i64), Vec<usize>> = HashMap::new();
        let mut positions = HashMap::new();

        for (index, position) in entries {
            cells
                .entry(cell_key(position, cell_size))
                .or_default()
                .push(index);
            positions.insert(index, position);
        }

        SpatialGrid {
            cell_size,
            cells,
            positions,
        }
    }

    pub fn from_points(points: &[Point], cell_size: f64) -> Self {
        Self::new(
            points.iter().enumerate().map(|(i, p)| (i, p.position())),
            cell_size,
        )
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn within(&self, center: [f64; 3], radius: f64, boundary: Boundary) -> Vec<usize> {
        if radius.is_nan() || radius < 0.0 {
            return Vec::new();
        }
        let reach = (radius / self.cell_size).ceil() as i64;
        let (cx, cy, cz) = cell_key(center, self.cell_size);
        let radius_squared = radius * radius;

        let mut found = Vec::new();
        for x in cx.saturating_sub(reach)..=cx.saturating_add(reach) {
            for y in cy.saturating_sub(reach)..=cy.saturating_add(reach) {
                for z in cz.saturating_sub(reach)..=cz.saturating_add(reach) {
                    let Some(indices) = self.cells.get(&(x, y, z)) else {
                        continue;
                    };
                    for &index in indices {
                        let position = self.positions[&index];
                        let distance_squared = squared_distance(position, center);
                        let hit = match boundary {
                            Boundary::Inclusive => distance_squared <= radius_squared,
                            Boundary::Exclusive => distance_squared < radius_squared,
                        };
                        if hit {
                            found.push(index);
                        }
                    }
                }
            }
        }

        found.sort_unstable();
        found
    }

    /// Squared distances from `center` to its `k` nearest entries, ascending.
    ///
    /// Cells are visited in rings of growing Chebyshev distance until the
    /// `k`-th candidate is provably closer than anything unvisited. When the
    /// rings grow past the number of occupied cells the remaining cells are
    /// scanned directly, so isolated far points stay cheap.
    pub fn nearest(&self, center: [f64; 3], k: usize, exclude: Option<usize>) -> Vec<f64> {
        if k == 0 || self.is_empty() {
            return Vec::new();
        }
        let origin = cell_key(center, self.cell_size);
        let excluded = exclude.is_some_and(|i| self.positions.contains_key(&i));
        let available = self.len() - usize::from(excluded);

        let mut found: Vec<f64> = Vec::new();
        let mut visited_cells = 0usize;
        let mut ring: i64 = 0;
        loop {
            for key in ring_cells(origin, ring) {
                visited_cells += 1;
                self.collect_cell(&key, center, exclude, &mut found);
            }
            if found.len() == available {
                break;
            }
            // Anything outside the visited rings is at least this far away.
            let cleared = ring as f64 * self.cell_size;
            if found.len() >= k {
                found.select_nth_unstable_by(k - 1, f64::total_cmp);
                if found[k - 1] <= cleared * cleared {
                    break;
                }
            }
            if visited_cells > self.cells.len().saturating_mul(8) || ring == i64::MAX {
                for key in self.cells.keys() {
                    if chebyshev(*key, origin) > i128::from(ring) {
                        self.collect_cell(key, center, exclude, &mut found);
                    }
                }
                break;
            }
            ring += 1;
        }

        found.sort_unstable_by(f64::total_cmp);
        found.truncate(k);
        found
    }

    fn collect_cell(
        &self,
        key: &(i64, i64, i64),
        center: [f64; 3],
        exclude: Option<usize>,
        found: &mut Vec<f64>,
    ) {
        let Some(indices) = self.cells.get(key) else {
            return;
        };
        for &index in indices {
            if Some(index) != exclude {
                found.push(squared_distance(self.positions[&index], center));
            }
        }
    }
}

// Cells at exactly Chebyshev distance `ring` from `origin`. Keys that would
// leave the i64 range are skipped.
fn ring_cells(origin: (i64, i64, i64), ring: i64) -> Vec<(i64, i64, i64)> {
    let offset = |base: i64, delta: i64| base.checked_add(delta);
    let mut keys = Vec::new();
    for dx in -ring..=ring {
        for dy in -ring..=ring {
            let on_side = dx.abs() == ring || dy.abs() == ring;
            let dzs: Vec<i64> = if on_side {
                (-ring..=ring).collect()
            } else {
                vec![-ring, ring]
            };
            for dz in dzs {
                if let (Some(x), Some(y), Some(z)) = (
                    offset(origin.0, dx),
                    offset(origin.1, dy),
                    offset(origin.2, dz),
                ) {
                    keys.push((x, y, z));
                }
            }
        }
    }
    keys
}

fn chebyshev(a: (i64, i64, i64), b: (i64, i64, i64)) -> i128 {
    let d = |p: i64, q: i64| (i128::from(p) - i128::from(q)).abs();
    d(a.0, b.0).max(d(a.1, b.1)).max(d(a.2, b.2))
}

fn cell_key(position: [f64; 3], cell_size: f64) -> (i64, i64, i64) {
    (
        (position[0] / cell_size).floor() as i64,
        (position[1] / cell_size).floor() as i64,
        (position[2] / cell_size).floor() as i64,
    )
}

fn squared_distance(a: [f64; 3], b: [f64; 3]) -> f64 {
    (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)
}

/// Mean distance from every point to its `k` nearest neighbours (self excluded).
///
/// Neighbour counts are capped at `len - 1`.
pub fn mean_knn_distances(points: &[Point], k: usize) -> Vec<f64> {
    let k = k.min(points.len().saturating_sub(1));
    if k == 0 {
        return vec![0.0; points.len()];
    }

    let grid = SpatialGrid::from_points(points, knn_cell_size(points, k));
    points
        .par_iter()
        .enumerate()
        .map(|(i, point)| {
            let distances = grid.nearest(point.position(), k, Some(i));
            let sum: f64 = distances.iter().map(|d| d.sqrt()).sum();
            sum / k as f64
        })
        .collect()
}

// Cell edge expected to hold about `k` points, sized from the 2nd to 98th
// percentile extent on each axis so a few stray points do not inflate it.
fn knn_cell_size(points: &[Point], k: usize) -> f64 {
    let trim = points.len() / 50;
    let mut spans = Vec::with_capacity(3);
    for axis in 0..3 {
        let mut values: Vec<f64> = points.iter().map(|p| p.position()[axis]).collect();
        let low = *values.select_nth_unstable_by(trim, f64::total_cmp).1;
        let high_idx = values.len() - 1 - trim;
        let high = *values
            .select_nth_unstable_by(high_idx, f64::total_cmp)
            .1;
        let span = high - low;
        if span > 0.0 {
            spans.push(span);
        }
    }
    if spans.is_empty() {
        return 1.0;
    }

    let per_point = spans.iter().product::<f64>() / points.len() as f64;
    let cell = (per_point * k as f64).powf(1.0 / spans.len() as f64);
    if cell.is_finite() && cell > 0.0 {
        cell
    } else {
        1.0
    }
}
