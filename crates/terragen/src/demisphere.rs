//! Height profile of the sky demisphere.

use crate::grid::Grid;

/// Side of the exported demisphere heightmap.
pub const DEMISPHERE_HEIGHTMAP_WIDTH: usize = 128;

/// Heights of a half sphere inscribed in a `width × width` grid.
///
/// The radius is `width / 2 - 1` and the centre sits at `(radius + 1,
/// radius + 1)`; cells outside the disc are zero.
#[must_use]
pub fn demisphere_heightmap(width: usize) -> Grid<f32> {
    let radius = (width / 2).saturating_sub(1);
    let radius_squared = (radius * radius) as f32;
    let center = (radius + 1) as f32;

    Grid::from_fn(width, width, |x, y| {
        let dx = x as f32 - center;
        let dy = y as f32 - center;
        let distance_squared = (dx * dx + dy * dy).min(radius_squared);
        (radius_squared - distance_squared).sqrt()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peak_at_center() {
        let dome = demisphere_heightmap(DEMISPHERE_HEIGHTMAP_WIDTH);
        let radius = (DEMISPHERE_HEIGHTMAP_WIDTH / 2 - 1) as f32;
        let (lo, hi) = dome.min_max().unwrap();
        assert!(lo.abs() < 1e-6);
        assert!((hi - radius).abs() < 1e-4);
        assert_eq!(dome.get(64, 64).copied(), Some(hi));
    }

    #[test]
    fn test_sphere_profile() {
        let dome = demisphere_heightmap(32);
        // radius 15, centre (16, 16): h² + d² = r².
        let h = dome.get(16 + 9, 16).copied().unwrap();
        assert!((h - 12.0).abs() < 1e-4);
        // Corners lie outside the disc.
        assert!(dome.get(0, 0).copied().unwrap().abs() < 1e-6);
    }
}
