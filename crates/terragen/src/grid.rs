//! Dense two-dimensional sample grids.
//!
//! All generator stages work on [`Grid`], a row-major array addressed by
//! `(x, y)` with `x` the column and `y` the row.

use crate::error::{Error, Result};

/// Row-major two-dimensional array.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    data: Vec<T>,
    width: usize,
    height: usize,
}

impl<T: Clone> Grid<T> {
    /// Create a grid filled with `value`.
    #[must_use]
    pub fn new(width: usize, height: usize, value: T) -> Self {
        Self {
            data: vec![value; width * height],
            width,
            height,
        }
    }

    /// Keep every `stride`-th sample in both directions, starting at `(0, 0)`.
    #[must_use]
    pub fn downsample(&self, stride: usize) -> Self {
        let stride = stride.max(1);
        let width = self.width.div_ceil(stride);
        let height = self.height.div_ceil(stride);
        let mut data = Vec::with_capacity(width * height);
        for y in (0..self.height).step_by(stride) {
            for x in (0..self.width).step_by(stride) {
                data.push(self.data[y * self.width + x].clone());
            }
        }
        Self {
            data,
            width,
            height,
        }
    }

    /// Write `reduced` back onto every `stride`-th sample (inverse of [`Grid::downsample`]).
    pub fn write_strided(&mut self, reduced: &Grid<T>, stride: usize) {
        let stride = stride.max(1);
        for (ry, y) in (0..self.height).step_by(stride).enumerate() {
            for (rx, x) in (0..self.width).step_by(stride).enumerate() {
                if let Some(value) = reduced.get(rx, ry) {
                    self.data[y * self.width + x] = value.clone();
                }
            }
        }
    }
}

impl<T> Grid<T> {
    /// Wrap an existing buffer.
    pub fn from_vec(data: Vec<T>, width: usize, height: usize) -> Result<Self> {
        if data.len() != width * height {
            return Err(Error::DimensionMismatch {
                expected: width * height,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Build a grid by evaluating `f(x, y)` for every cell.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            data,
            width,
            height,
        }
    }

    /// Sample at `(x, y)`, or `None` outside the grid.
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x)
    }

    /// Mutable sample at `(x, y)`, or `None` outside the grid.
    pub fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get_mut(y * self.width + x)
    }

    /// Sample at signed coordinates; negative coordinates are out of bounds.
    #[must_use]
    pub fn get_signed(&self, x: i64, y: i64) -> Option<&T> {
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        self.get(x, y)
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}

impl Grid<f32> {
    /// Minimum and maximum sample, or `None` for an empty grid.
    #[must_use]
    pub fn min_max(&self) -> Option<(f32, f32)> {
        let mut iter = self.data.iter().copied();
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }

    /// Bilinear sample at fractional coordinates, clamped to the grid.
    #[must_use]
    pub fn sample_bilinear(&self, x: f32, y: f32) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        let max_x = (self.width - 1) as f32;
        let max_y = (self.height - 1) as f32;
        let x = x.clamp(0.0, max_x);
        let y = y.clamp(0.0, max_y);

        let x0 = x.floor() as usize;
        let y0 = y.floor() as usize;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);

        let at = |x: usize, y: usize| self.data[y * self.width + x];
        bilinear(
            x - x0 as f32,
            y - y0 as f32,
            at(x0, y0),
            at(x0, y1),
            at(x1, y0),
            at(x1, y1),
        )
    }
}

/// Bilinear interpolation between four corner values.
///
/// `v01` is the value at `(0, 1)`, i.e. one step along `ty`.
#[must_use]
pub fn bilinear(tx: f32, ty: f32, v00: f32, v01: f32, v10: f32, v11: f32) -> f32 {
    let top = v00 + (v10 - v00) * tx;
    let bottom = v01 + (v11 - v01) * tx;
    top + (bottom - top) * ty
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_get_out_of_bounds() {
        let grid = Grid::new(3, 2, 1.0_f32);
        assert_eq!(grid.get(2, 1), Some(&1.0));
        assert_eq!(grid.get(3, 0), None);
        assert_eq!(grid.get(0, 2), None);
        assert_eq!(grid.get_signed(-1, 0), None);
    }

    #[test]
    fn test_from_vec_length_mismatch() {
        let result = Grid::from_vec(vec![0.0_f32; 5], 2, 3);
        assert!(matches!(
            result,
            Err(Error::DimensionMismatch {
                expected: 6,
                actual: 5
            })
        ));
    }

    #[test]
    fn test_row_major_layout() {
        let grid = Grid::from_fn(3, 2, |x, y| (y * 10 + x) as f32);
        assert_eq!(grid.as_slice(), &[0.0, 1.0, 2.0, 10.0, 11.0, 12.0]);
    }

    #[test]
    fn test_downsample_and_write_back() {
        let grid = Grid::from_fn(5, 5, |x, y| (y * 5 + x) as f32);
        let reduced = grid.downsample(2);
        assert_eq!((reduced.width(), reduced.height()), (3, 3));
        assert_eq!(reduced.get(1, 1), Some(&12.0));
        assert_eq!(reduced.get(2, 2), Some(&24.0));

        let mut target = Grid::new(5, 5, 0.0_f32);
        target.write_strided(&reduced, 2);
        assert_eq!(target.get(4, 4), Some(&24.0));
        assert_eq!(target.get(1, 1), Some(&0.0));
    }

    #[test]
    fn test_min_max() {
        let grid = Grid::from_vec(vec![3.0, -1.0, 7.5, 0.0], 2, 2).unwrap();
        assert_eq!(grid.min_max(), Some((-1.0, 7.5)));
        assert_eq!(Grid::<f32>::new(0, 0, 0.0).min_max(), None);
    }

    #[test]
    fn test_bilinear_corners_and_center() {
        assert!((bilinear(0.0, 0.0, 1.0, 2.0, 3.0, 4.0) - 1.0).abs() < 1e-6);
        assert!((bilinear(0.0, 1.0, 1.0, 2.0, 3.0, 4.0) - 2.0).abs() < 1e-6);
        assert!((bilinear(1.0, 0.0, 1.0, 2.0, 3.0, 4.0) - 3.0).abs() < 1e-6);
        assert!((bilinear(0.5, 0.5, 1.0, 2.0, 3.0, 4.0) - 2.5).abs() < 1e-6);
    }

    #[test]
    fn test_sample_bilinear_clamps() {
        let grid = Grid::from_fn(2, 2, |x, _| x as f32);
        assert!((grid.sample_bilinear(-5.0, 0.0)).abs() < 1e-6);
        assert!((grid.sample_bilinear(10.0, 10.0) - 1.0).abs() < 1e-6);
        assert!((grid.sample_bilinear(0.25, 0.5) - 0.25).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn bilinear_stays_within_corner_range(
            tx in 0.0_f32..=1.0,
            ty in 0.0_f32..=1.0,
            corners in prop::array::uniform4(-1000.0_f32..1000.0),
        ) {
            let [a, b, c, d] = corners;
            let v = bilinear(tx, ty, a, b, c, d);
            let lo = a.min(b).min(c).min(d);
            let hi = a.max(b).max(c).max(d);
            prop_assert!(v >= lo - 1e-2 && v <= hi + 1e-2);
        }

        #[test]
        fn downsample_write_back_roundtrips_on_strided_samples(
            n in 1_u32..5,
            stride_pow in 0_u32..3,
        ) {
            let side = 2_usize.pow(n + stride_pow) + 1;
            let stride = 2_usize.pow(stride_pow);
            let grid = Grid::from_fn(side, side, |x, y| (x * 31 + y * 7) as f32);
            let reduced = grid.downsample(stride);
            let mut copy = Grid::new(side, side, -1.0_f32);
            copy.write_strided(&reduced, stride);
            for y in (0..side).step_by(stride) {
                for x in (0..side).step_by(stride) {
                    prop_assert_eq!(copy.get(x, y), grid.get(x, y));
                }
            }
        }
    }
}
