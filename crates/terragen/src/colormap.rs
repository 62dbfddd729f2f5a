//! Three-channel floating point colour maps.

use crate::grid::Grid;

/// An RGB image stored as one [`Grid`] per channel.
///
/// Channels are nominally in `[0, 1]` but intermediate stages may overshoot;
/// clamping happens on export.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMap {
    r: Grid<f32>,
    g: Grid<f32>,
    b: Grid<f32>,
}

impl ColorMap {
    /// Create a black colour map.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, [0.0; 3])
    }

    /// Create a colour map filled with a single colour.
    #[must_use]
    pub fn filled(width: usize, height: usize, color: [f32; 3]) -> Self {
        Self {
            r: Grid::new(width, height, color[0]),
            g: Grid::new(width, height, color[1]),
            b: Grid::new(width, height, color[2]),
        }
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.r.width()
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.r.height()
    }

    /// Colour at `(x, y)`, or `None` outside the map.
    #[must_use]
    pub fn pixel(&self, x: usize, y: usize) -> Option<[f32; 3]> {
        Some([*self.r.get(x, y)?, *self.g.get(x, y)?, *self.b.get(x, y)?])
    }

    /// Overwrite the colour at `(x, y)`. Returns `false` outside the map.
    pub fn set_pixel(&mut self, x: usize, y: usize, color: [f32; 3]) -> bool {
        self.update_pixel(x, y, |_| color)
    }

    /// Add `delta` to every channel of `(x, y)`. Returns `false` outside the map.
    pub fn add_to_pixel(&mut self, x: usize, y: usize, delta: [f32; 3]) -> bool {
        self.update_pixel(x, y, |c| [c[0] + delta[0], c[1] + delta[1], c[2] + delta[2]])
    }

    /// Replace the colour at `(x, y)` with `f(old)`. Returns `false` outside the map.
    pub fn update_pixel(&mut self, x: usize, y: usize, f: impl FnOnce([f32; 3]) -> [f32; 3]) -> bool {
        let (Some(r), Some(g), Some(b)) = (
            self.r.get_mut(x, y),
            self.g.get_mut(x, y),
            self.b.get_mut(x, y),
        ) else {
            return false;
        };
        let [nr, ng, nb] = f([*r, *g, *b]);
        *r = nr;
        *g = ng;
        *b = nb;
        true
    }
}
