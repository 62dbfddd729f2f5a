//! Droplet-based hydraulic erosion.
//!
//! Each droplet starts at a random cell, follows the bilinear slope with some
//! inertia, picks up sediment while running downhill and drops it when it
//! slows down or has to climb.

use glam::DVec2;
use rand::Rng;

use crate::grid::Grid;

/// Steps a droplet lives before evaporating.
const DROPLET_LIFETIME: usize = 30;
/// Lower bound on sediment capacity so droplets on flats still deposit.
const MIN_CAPACITY: f64 = 0.01;
/// Fraction of excess sediment dropped per step.
const DEPOSIT_SPEED: f64 = 0.3;
/// Fraction of free capacity filled per step.
const ERODE_SPEED: f64 = 0.3;
/// Water kept after each step.
const EVAPORATION_KEEP: f64 = 0.95;

/// Erosion parameters, taken from the generation options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErosionOptions {
    pub iterations: u32,
    /// Share of the previous direction kept each step, in `[0, 1)`.
    pub inertia: f64,
    /// Brush radius in cells.
    pub radius: u8,
    pub capacity_factor: f64,
    /// Height scale used to normalise speed gains.
    pub max_terrain_height: f32,
}

/// Totals gathered over one erosion run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ErosionStats {
    pub droplets: u32,
    pub eroded: f64,
    pub deposited: f64,
}

/// One cell of an erosion brush, relative to the droplet cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrushPoint {
    pub dx: i32,
    pub dy: i32,
    pub weight: f64,
}

/// Cells within `radius` of the origin, weighted by `radius - distance`.
///
/// Weights sum to one.
#[must_use]
pub fn brush(radius: u8) -> Vec<BrushPoint> {
    let r = i32::from(radius);
    let mut points = Vec::with_capacity(((2 * r + 1) * (2 * r + 1)) as usize);
    for dy in -r..=r {
        for dx in -r..=r {
            let distance = f64::from(dx * dx + dy * dy).sqrt();
            let weight = f64::from(radius) - distance;
            if weight > 0.0 {
                points.push(BrushPoint { dx, dy, weight });
            }
        }
    }
    normalize_weights(&mut points);
    points
}

fn normalize_weights(points: &mut [BrushPoint]) {
    let total: f64 = points.iter().map(|p| p.weight).sum();
    if total > 0.0 {
        for p in points.iter_mut() {
            p.weight /= total;
        }
    }
}

/// Bilinear height and gradient at a fractional position.
///
/// The caller guarantees `pos` lies in `[0, w - 2]²`.
fn height_and_gradient(heightmap: &Grid<f32>, pos: DVec2) -> (f64, DVec2) {
    let x = pos.x as usize;
    let y = pos.y as usize;
    let u = pos.x - x as f64;
    let v = pos.y - y as f64;

    let at = |x: usize, y: usize| f64::from(heightmap.get(x, y).copied().unwrap_or_default());
    let h00 = at(x, y);
    let h10 = at(x + 1, y);
    let h01 = at(x, y + 1);
    let h11 = at(x + 1, y + 1);

    let gradient = DVec2::new(
        (h10 - h00) * (1.0 - v) + (h11 - h01) * v,
        (h01 - h00) * (1.0 - u) + (h11 - h10) * u,
    );
    let height = h00 * (1.0 - u) * (1.0 - v) + h10 * u * (1.0 - v) + h01 * (1.0 - u) * v + h11 * u * v;
    (height, gradient)
}

/// Spread `amount` over the four corners of the cell containing `pos`.
fn deposit(heightmap: &mut Grid<f32>, pos: DVec2, amount: f64) {
    let x = pos.x as usize;
    let y = pos.y as usize;
    let u = pos.x - x as f64;
    let v = pos.y - y as f64;
    let corners = [
        (x, y, (1.0 - u) * (1.0 - v)),
        (x + 1, y, u * (1.0 - v)),
        (x, y + 1, (1.0 - u) * v),
        (x + 1, y + 1, u * v),
    ];
    for (cx, cy, share) in corners {
        if let Some(h) = heightmap.get_mut(cx, cy) {
            *h += (amount * share) as f32;
        }
    }
}

/// Remove up to `amount` around `(x, y)` with `brush`; returns what was removed.
fn erode_at(heightmap: &mut Grid<f32>, brush: &[BrushPoint], x: usize, y: usize, amount: f64) -> f64 {
    let mut in_bounds: Vec<(usize, usize, f64)> = brush
        .iter()
        .filter_map(|p| {
            let px = usize::try_from(x as i64 + i64::from(p.dx)).ok()?;
            let py = usize::try_from(y as i64 + i64::from(p.dy)).ok()?;
            heightmap.get(px, py).map(|_| (px, py, p.weight))
        })
        .collect();

    // Renormalise so brushes clipped by the border still remove `amount`.
    let total: f64 = in_bounds.iter().map(|(_, _, w)| w).sum();
    if total <= 0.0 {
        return 0.0;
    }
    for point in &mut in_bounds {
        point.2 /= total;
    }

    let mut removed = 0.0;
    for (px, py, weight) in in_bounds {
        if let Some(h) = heightmap.get_mut(px, py) {
            let delta = amount * weight;
            *h -= delta as f32;
            removed += delta;
        }
    }
    removed
}

/// Run `options.iterations` droplets over `heightmap`.
pub fn erode(heightmap: &mut Grid<f32>, options: &ErosionOptions, rng: &mut impl Rng) -> ErosionStats {
    let mut stats = ErosionStats::default();
    let width = heightmap.width().min(heightmap.height());
    if width < 3 || options.iterations == 0 {
        return stats;
    }

    let brush = brush(options.radius);
    let max_index = (width - 2) as f64;
    let height_scale = f64::from(options.max_terrain_height.max(f32::EPSILON));

    tracing::info!(
        iterations = options.iterations,
        width,
        "starting erosion"
    );

    for iteration in 0..options.iterations {
        if (iteration + 1) % 50_000 == 0 {
            tracing::debug!("{} droplets done", iteration + 1);
        }

        let mut pos = DVec2::new(
            rng.random_range(0.0..max_index),
            rng.random_range(0.0..max_index),
        );
        let mut direction = DVec2::ZERO;
        let mut water = 1.0_f64;
        let mut sediment = 0.0_f64;
        let mut speed = 1.0_f64;

        for _ in 0..DROPLET_LIFETIME {
            let cell_x = pos.x as usize;
            let cell_y = pos.y as usize;
            let (height, gradient) = height_and_gradient(heightmap, pos);

            direction = direction * options.inertia - gradient * (1.0 - options.inertia);
            let Some(step) = direction.try_normalize() else {
                break;
            };
            direction = step;

            let old_pos = pos;
            pos += direction;
            if pos.x < 0.0 || pos.y < 0.0 || pos.x > max_index || pos.y > max_index {
                break;
            }

            let (new_height, _) = height_and_gradient(heightmap, pos);
            let delta = new_height - height;
            let capacity = (-delta * speed * water * options.capacity_factor).max(MIN_CAPACITY);

            if delta > 0.0 || sediment > capacity {
                let amount = if delta > 0.0 {
                    delta.min(sediment)
                } else {
                    (sediment - capacity) * DEPOSIT_SPEED
                };
                sediment -= amount;
                deposit(heightmap, old_pos, amount);
                stats.deposited += amount;
            } else {
                let amount = ((capacity - sediment) * ERODE_SPEED).min(-delta);
                let removed = erode_at(heightmap, &brush, cell_x, cell_y, amount);
                sediment += removed;
                stats.eroded += removed;
            }

            speed = (speed * speed + delta.abs() / height_scale).sqrt();
            water *= EVAPORATION_KEEP;
        }

        stats.droplets += 1;
    }

    tracing::info!(
        droplets = stats.droplets,
        eroded = stats.eroded,
        deposited = stats.deposited,
        "erosion done"
    );
    stats
}
