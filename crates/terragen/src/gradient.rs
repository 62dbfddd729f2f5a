//! Slope estimation used to pick terrain materials.

use crate::grid::Grid;

/// Distance between probed samples.
const PROBE_STEP: usize = 30;
/// Furthest probe from the centre sample.
const PROBE_REACH: i64 = 60;

/// Normalised slope map of `heightmap`.
///
/// Each cell holds the mean absolute height difference to the samples on a
/// `PROBE_STEP` lattice within `PROBE_REACH` (clipped to the grid), scaled by
/// the grid width over `PROBE_REACH · ref_height`. The result is divided by
/// its maximum so the steepest cell is `1`; a flat map stays all zero.
#[must_use]
pub fn gradient_map(heightmap: &Grid<f32>, ref_height: f32) -> Grid<f32> {
    let width = heightmap.width();
    let scale = width as f32 / (PROBE_REACH as f32 * ref_height);
    let offsets: Vec<i64> = (-PROBE_REACH..=PROBE_REACH)
        .step_by(PROBE_STEP)
        .collect();

    let mut output = Grid::from_fn(heightmap.width(), heightmap.height(), |x, y| {
        let Some(&h) = heightmap.get(x, y) else {
            return 0.0;
        };
        let mut sum = 0.0;
        let mut count = 0_u32;
        for &dy in &offsets {
            for &dx in &offsets {
                if let Some(&other) = heightmap.get_signed(x as i64 + dx, y as i64 + dy) {
                    sum += (other - h).abs();
                    count += 1;
                }
            }
        }
        sum / count.max(1) as f32 * scale
    });

    let max = output.min_max().map_or(0.0, |(_, hi)| hi);
    if max > 0.0 {
        for value in output.as_mut_slice() {
            *value /= max;
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_map_is_zero() {
        let flat = Grid::new(65, 65, 10.0_f32);
        let gradient = gradient_map(&flat, 100.0);
        assert!(gradient.as_slice().iter().all(|g| *g == 0.0));
    }

    #[test]
    fn test_normalised_to_one() {
        let hill = Grid::from_fn(129, 129, |x, y| {
            let dx = x as f32 - 64.0;
            let dy = y as f32 - 64.0;
            (-(dx * dx + dy * dy) / 800.0).exp() * 50.0
        });
        let gradient = gradient_map(&hill, 50.0);
        let (lo, hi) = gradient.min_max().unwrap();
        assert!(lo >= 0.0);
        assert!((hi - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_steeper_region_has_higher_gradient() {
        // Gentle ramp on the left half, steep ramp on the right half.
        let terrain = Grid::from_fn(257, 257, |x, _| {
            if x < 128 {
                x as f32 * 0.1
            } else {
                12.8 + (x - 128) as f32 * 2.0
            }
        });
        let gradient = gradient_map(&terrain, 100.0);
        let gentle = gradient.get(40, 128).copied().unwrap();
        let steep = gradient.get(216, 128).copied().unwrap();
        assert!(steep > gentle * 5.0, "steep {steep} gentle {gentle}");
    }
}
