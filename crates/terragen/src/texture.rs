//! Terrain colormap: material coloration, grain and cast shadows.

use std::f32::consts::{FRAC_PI_2, PI};

use rand::Rng;

use crate::colormap::ColorMap;
use crate::error::{Error, Result};
use crate::grid::Grid;
use crate::rng::signed;

const DARK_ROCK: [f32; 3] = [87.0 / 255.0, 93.0 / 255.0, 98.0 / 255.0];
const ROCK: [f32; 3] = [185.0 / 255.0, 180.0 / 255.0, 171.0 / 255.0];
const VEGETATION: [f32; 3] = [97.0 / 255.0, 109.0 / 255.0, 74.0 / 255.0];

/// Noise added to the slope before picking materials.
const GRADIENT_NOISE: f32 = 0.1;
/// Per-pixel brightness noise.
const GRAIN: f32 = 0.01;
/// Base amplitude of the dark rock noise.
const DARK_ROCK_NOISE: f32 = 0.2;
/// Darkening of a fully unlit, directly exposed cell.
const EXPOSURE_DARKENING: f32 = 0.6;

/// Direction shadows are cast towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShadowDirection {
    #[default]
    PositiveX,
    PositiveY,
    NegativeX,
    NegativeY,
}

impl TryFrom<u8> for ShadowDirection {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::PositiveX),
            1 => Ok(Self::PositiveY),
            2 => Ok(Self::NegativeX),
            3 => Ok(Self::NegativeY),
            other => Err(Error::invalid(
                "shadow_direction",
                format!("expected 0..=3, got {other}"),
            )),
        }
    }
}

impl ShadowDirection {
    /// Grid cell of step `along` on scan line `line`.
    fn cell(self, along: usize, line: usize, width: usize) -> (usize, usize) {
        match self {
            Self::PositiveX => (along, line),
            Self::PositiveY => (line, along),
            Self::NegativeX => (width - 1 - along, line),
            Self::NegativeY => (line, width - 1 - along),
        }
    }
}

/// Parameters of the terrain texture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureOptions {
    /// Stride between the full heightmap and the gradient map.
    pub scale_divisor: usize,
    /// Height used to normalise slopes and banding.
    pub ref_height: f32,
    /// Sun elevation in radians.
    pub sun_angle: f32,
    pub shadow_direction: ShadowDirection,
}

/// Periodic variation of the dark rock amount with altitude.
#[must_use]
pub fn banding(scaled_height: f32) -> f32 {
    let s = scaled_height * PI;
    ((50.0 * s).sin() + (30.0 * s + 1.0).sin() + (20.0 * s + 2.0).sin()) / 30.0
}

/// Colour the full resolution terrain.
///
/// `gradient` is the slope map of the reduced heightmap, one sample every
/// `options.scale_divisor` cells of `full`.
pub fn terrain_colormap(
    full: &Grid<f32>,
    gradient: &Grid<f32>,
    options: &TextureOptions,
    rng: &mut impl Rng,
) -> ColorMap {
    let mut colormap = ColorMap::new(full.width(), full.height());
    add_environment_coloration(&mut colormap, full, gradient, options, rng);
    add_grain(&mut colormap, rng);

    let exposure = shadow_exposure(
        full,
        options.ref_height,
        options.sun_angle,
        options.shadow_direction,
    );
    for y in 0..full.height() {
        for x in 0..full.width() {
            let light = exposure.get(x, y).copied().unwrap_or(1.0).clamp(0.0, 1.0);
            colormap.update_pixel(x, y, |c| c.map(|channel| channel * light));
        }
    }
    colormap
}

fn add_environment_coloration(
    colormap: &mut ColorMap,
    full: &Grid<f32>,
    gradient: &Grid<f32>,
    options: &TextureOptions,
    rng: &mut impl Rng,
) {
    let divisor = options.scale_divisor.max(1) as f32;
    let mut gradient_total = 0.0_f64;

    for y in 0..full.height() {
        for x in 0..full.width() {
            let Some(&height) = full.get(x, y) else {
                continue;
            };
            let scaled_height = height / options.ref_height;

            let mut slope = gradient.sample_bilinear(x as f32 / divisor, y as f32 / divisor);
            slope = (slope + signed(rng, GRADIENT_NOISE)) * 2.0;
            gradient_total += f64::from(slope);

            let mut rock = slope.round();
            let vegetation = (1.0 - slope).round();
            let dark_rock = signed(rng, DARK_ROCK_NOISE + banding(scaled_height)).abs();
            rock -= dark_rock;

            let amounts = [dark_rock, rock, vegetation].map(|a| a.clamp(0.0, 1.0));
            let color: [f32; 3] = std::array::from_fn(|c| {
                DARK_ROCK[c] * amounts[0] + ROCK[c] * amounts[1] + VEGETATION[c] * amounts[2]
            });
            colormap.set_pixel(x, y, color);
        }
    }

    let cells = (full.width() * full.height()).max(1);
    tracing::debug!(mean_gradient = gradient_total / cells as f64, "environment coloration");
}

fn add_grain(colormap: &mut ColorMap, rng: &mut impl Rng) {
    for y in 0..colormap.height() {
        for x in 0..colormap.width() {
            let noise = signed(rng, GRAIN);
            colormap.add_to_pixel(x, y, [noise; 3]);
        }
    }
}

/// Exposure of a directly lit cell given the slope towards a neighbour.
fn exposure_of(slope: f32, sun_angle: f32) -> f32 {
    (slope.atan().abs() + sun_angle).sin().abs()
}

/// Light received by every cell of a square heightmap, before clamping.
///
/// Each scan line runs along `direction` with a horizon that starts below
/// everything and sinks by `|tan(angle mod π/2)| · ref_height / w` per cell.
/// Cells at or above the horizon raise it and are lit according to their
/// local slopes; cells below it are in shadow, darker the deeper they sit.
#[must_use]
pub fn shadow_exposure(
    heightmap: &Grid<f32>,
    ref_height: f32,
    sun_angle: f32,
    direction: ShadowDirection,
) -> Grid<f32> {
    let width = heightmap.width().min(heightmap.height());
    let mut exposure = Grid::new(heightmap.width(), heightmap.height(), 1.0_f32);
    if width == 0 {
        return exposure;
    }

    let sink = (sun_angle % FRAC_PI_2).tan().abs() * ref_height / width as f32;
    let slope_scale = ref_height / width as f32;
    let mut horizon = vec![f32::NEG_INFINITY; width];

    for along in 0..width {
        for (line, line_horizon) in horizon.iter_mut().enumerate() {
            let (x, y) = direction.cell(along, line, width);
            let Some(&height) = heightmap.get(x, y) else {
                continue;
            };

            let light = if height >= *line_horizon {
                *line_horizon = height;
                let mut sum = 0.0;
                let mut count = 0_u32;
                for step in [-1_i64, 1] {
                    let neighbour = along as i64 + step;
                    if neighbour < 0 || neighbour >= width as i64 {
                        continue;
                    }
                    let (nx, ny) = direction.cell(neighbour as usize, line, width);
                    if let Some(&other) = heightmap.get(nx, ny) {
                        let slope = (other - height) * step as f32 * slope_scale;
                        sum += exposure_of(slope, sun_angle);
                        count += 1;
                    }
                }
                let mean = if count == 0 { 1.0 } else { sum / count as f32 };
                1.0 - (1.0 - mean) * EXPOSURE_DARKENING
            } else {
                1.0 - ((height - *line_horizon).abs() / ref_height * 0.1 + EXPOSURE_DARKENING)
            };

            if let Some(cell) = exposure.get_mut(x, y) {
                *cell = light;
            }
            *line_horizon -= sink;
        }
    }
    exposure
}
