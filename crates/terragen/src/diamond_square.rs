//! Template-guided diamond-square terrain synthesis.
//!
//! A low resolution template pins the coarse shape of the terrain; the
//! diamond-square midpoint displacement fills in the detail. Once the
//! subdivision reaches the exported resolution, the coarse samples are eroded
//! and the remaining levels only interpolate.

use rand::Rng;

use crate::erosion::{self, ErosionOptions, ErosionStats};
use crate::error::{Error, Result};
use crate::grid::Grid;
use crate::rng::signed_unit;

/// Parameters for one diamond-square run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiamondSquareOptions {
    /// The full grid has side `2^terrain_power_of_two + 1`.
    pub terrain_power_of_two: u32,
    /// The reduced grid keeps every `2^reduction_power_of_two`-th sample.
    pub reduction_power_of_two: u32,
    /// Noise amplitude.
    pub irregularity: f32,
    pub max_terrain_height: f32,
    pub erosion: ErosionOptions,
}

/// Output of the terrain synthesis.
#[derive(Debug, Clone)]
pub struct Terrain {
    /// Full resolution heights.
    pub full: Grid<f32>,
    /// Every `2^r`-th sample of `full`; this is what gets exported.
    pub reduced: Grid<f32>,
    pub erosion: ErosionStats,
}

/// Power of two `t` such that `side == 2^t + 1`.
#[must_use]
pub fn power_of_two_plus_one(side: usize) -> Option<u32> {
    let inner = side.checked_sub(1)?;
    inner.is_power_of_two().then(|| inner.trailing_zeros())
}

/// Displacement for a point set at half-step `id`.
fn displacement(rng: &mut impl Rng, width: usize, id: usize, irregularity: f32, max_height: f32) -> f32 {
    if irregularity == 0.0 {
        return 0.0;
    }
    signed_unit(rng) * irregularity * id as f32 * max_height / width as f32
}

/// Generate a terrain, optionally guided by `template`.
pub fn generate(
    template: Option<&Grid<f32>>,
    options: &DiamondSquareOptions,
    rng: &mut impl Rng,
) -> Result<Terrain> {
    let n = options.terrain_power_of_two;
    let width = (1_usize << n) + 1;
    let reduced_step = 1_usize << options.reduction_power_of_two;

    let mut output = Grid::new(width, width, 0.0_f32);
    let mut levels_to_skip = 0;

    if let Some(template) = template {
        let t = power_of_two_plus_one(template.width())
            .filter(|_| template.width() == template.height())
            .ok_or(Error::InvalidTemplate {
                width: template.width() as u32,
                height: template.height() as u32,
            })?;
        if t > n {
            return Err(Error::TemplateTooLarge {
                template: t,
                terrain: n,
            });
        }
        let step = 1_usize << (n - t);
        for ty in 0..template.height() {
            for tx in 0..template.width() {
                if let (Some(value), Some(cell)) =
                    (template.get(tx, ty), output.get_mut(tx * step, ty * step))
                {
                    *cell = *value;
                }
            }
        }
        levels_to_skip = t;
        tracing::debug!(template_power = t, step, "placed template samples");
    }

    let mut irregularity = options.irregularity;
    let mut erosion_stats = ErosionStats::default();
    let mut eroded = false;
    let mut i = width - 1;

    while i > 1 {
        let id = i / 2;

        if levels_to_skip == 0 {
            diamond_step(&mut output, i, irregularity, options.max_terrain_height, rng);
            square_step(&mut output, i, irregularity, options.max_terrain_height, rng);
        } else {
            levels_to_skip -= 1;
        }

        i = id;

        if i == reduced_step {
            let mut reduced = output.downsample(reduced_step);
            erosion_stats = erosion::erode(&mut reduced, &options.erosion, rng);
            output.write_strided(&reduced, reduced_step);
            irregularity = 0.0;
            eroded = true;
        }
    }

    // Reached only when the reduced level is not below the full one.
    if !eroded {
        erosion_stats = erosion::erode(&mut output, &options.erosion, rng);
    }

    let reduced = output.downsample(reduced_step);
    tracing::info!(
        width,
        reduced_width = reduced.width(),
        "diamond-square done"
    );

    Ok(Terrain {
        full: output,
        reduced,
        erosion: erosion_stats,
    })
}

/// Set every square centre from its four diagonal corners.
fn diamond_step(grid: &mut Grid<f32>, i: usize, irregularity: f32, max_height: f32, rng: &mut impl Rng) {
    let w = grid.width();
    let id = i / 2;
    for y in (id..w).step_by(i) {
        for x in (id..w).step_by(i) {
            let corners = [
                (x - id, y - id),
                (x - id, y + id),
                (x + id, y + id),
                (x + id, y - id),
            ];
            let sum: f32 = corners
                .iter()
                .filter_map(|&(cx, cy)| grid.get(cx, cy))
                .sum();
            let noise = displacement(rng, w, id, irregularity, max_height);
            if let Some(cell) = grid.get_mut(x, y) {
                *cell = sum / 4.0 + noise;
            }
        }
    }
}

/// Set every diamond centre from its in-bounds axis neighbours.
fn square_step(grid: &mut Grid<f32>, i: usize, irregularity: f32, max_height: f32, rng: &mut impl Rng) {
    let w = grid.width();
    let id = i / 2;
    let mut offset = 0;
    for x in (0..w).step_by(id) {
        offset = if offset == 0 { id } else { 0 };
        for y in (offset..w).step_by(i) {
            let mut sum = 0.0;
            let mut n = 0_u32;
            if x >= id {
                sum += grid.get(x - id, y).copied().unwrap_or_default();
                n += 1;
            }
            if x + id < w {
                sum += grid.get(x + id, y).copied().unwrap_or_default();
                n += 1;
            }
            if y >= id {
                sum += grid.get(x, y - id).copied().unwrap_or_default();
                n += 1;
            }
            if y + id < w {
                sum += grid.get(x, y + id).copied().unwrap_or_default();
                n += 1;
            }
            let noise = displacement(rng, w, id, irregularity, max_height);
            if let Some(cell) = grid.get_mut(x, y) {
                *cell = sum / n.max(1) as f32 + noise;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::seeded;

    fn options(n: u32, r: u32, irregularity: f32) -> DiamondSquareOptions {
        DiamondSquareOptions {
            terrain_power_of_two: n,
            reduction_power_of_two: r,
            irregularity,
            max_terrain_height: 100.0,
            erosion: ErosionOptions {
                iterations: 0,
                inertia: 0.3,
                radius: 2,
                capacity_factor: 4.0,
                max_terrain_height: 100.0,
            },
        }
    }

    #[test]
    fn test_power_of_two_plus_one() {
        assert_eq!(power_of_two_plus_one(1), None);
        assert_eq!(power_of_two_plus_one(2), Some(0));
        assert_eq!(power_of_two_plus_one(3), Some(1));
        assert_eq!(power_of_two_plus_one(65), Some(6));
        assert_eq!(power_of_two_plus_one(64), None);
        assert_eq!(power_of_two_plus_one(0), None);
    }

    #[test]
    fn test_output_dimensions() {
        let terrain = generate(None, &options(6, 2, 0.5), &mut seeded(1)).unwrap();
        assert_eq!(terrain.full.width(), 65);
        assert_eq!(terrain.reduced.width(), 17);
        assert_eq!(terrain.reduced.get(16, 16), terrain.full.get(64, 64));
    }

    #[test]
    fn test_flat_template_without_noise_stays_flat() {
        let template = Grid::new(5, 5, 42.0_f32);
        let terrain = generate(Some(&template), &options(5, 1, 0.0), &mut seeded(1)).unwrap();
        assert!(terrain
            .full
            .as_slice()
            .iter()
            .all(|h| (*h - 42.0).abs() < 1e-4));
    }

    #[test]
    fn test_template_samples_are_preserved() {
        let template = Grid::from_fn(3, 3, |x, y| (x * 10 + y) as f32);
        let terrain = generate(Some(&template), &options(4, 1, 0.8), &mut seeded(5)).unwrap();
        for ty in 0..3 {
            for tx in 0..3 {
                assert_eq!(
                    terrain.full.get(tx * 8, ty * 8),
                    template.get(tx, ty),
                    "template sample ({tx}, {ty})"
                );
            }
        }
    }

    #[test]
    fn test_noise_stops_after_reduction_level() {
        // The template covers every level above the reduced resolution, so
        // nothing left is random and the seed must not matter.
        let template = Grid::from_fn(3, 3, |x, y| (x * 7 + y * 3) as f32);
        let opts = options(5, 4, 0.9);
        let a = generate(Some(&template), &opts, &mut seeded(1)).unwrap();
        let b = generate(Some(&template), &opts, &mut seeded(2)).unwrap();
        assert_eq!(a.full, b.full);
    }

    #[test]
    fn test_invalid_template_rejected() {
        let template = Grid::new(4, 4, 0.0_f32);
        let result = generate(Some(&template), &options(5, 1, 0.5), &mut seeded(1));
        assert!(matches!(result, Err(Error::InvalidTemplate { .. })));

        let template = Grid::new(65, 65, 0.0_f32);
        let result = generate(Some(&template), &options(5, 1, 0.5), &mut seeded(1));
        assert!(matches!(
            result,
            Err(Error::TemplateTooLarge {
                template: 6,
                terrain: 5
            })
        ));
    }

    #[test]
    fn test_same_seed_same_terrain() {
        let a = generate(None, &options(5, 2, 0.7), &mut seeded(99)).unwrap();
        let b = generate(None, &options(5, 2, 0.7), &mut seeded(99)).unwrap();
        let c = generate(None, &options(5, 2, 0.7), &mut seeded(100)).unwrap();
        assert_eq!(a.full, b.full);
        assert_ne!(a.full, c.full);
    }
}
