//! Sky demisphere colouring from a small spectral scattering model.
//!
//! Sunlight is modelled as a handful of spectral bands. Travelling through the
//! atmosphere, each band loses a share to scattering that grows with path
//! length and wavelength; the scattered part colours the sky, the transmitted
//! part colours the sun. Sky pixels pick a wavelength from the scattered
//! spectrum according to their angle to the sun, then a colour from smoothed
//! band-to-colour curves.

use std::f32::consts::{FRAC_PI_2, PI};

use serde::{Deserialize, Serialize};

use crate::colormap::ColorMap;

/// Samples per lookup curve.
const CURVE_LENGTH: usize = 1000;
/// Smoothing passes for the wavelength curve.
const WAVELENGTH_SMOOTHING: usize = 30;
/// Smoothing passes for the colour curves.
const COLOR_SMOOTHING: usize = 50;
/// Exponent shaping the sun disc falloff.
const SUN_FALLOFF: i32 = 250;

/// Side of the exported sky colormap (`80 · 8 · 2 + 1`).
pub const SKY_COLORMAP_WIDTH: usize = 80 * 8 * 2 + 1;

/// One spectral band of a light source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralBand {
    /// Relative wavelength; larger scatters more.
    pub wavelength: f32,
    pub color: [f32; 3],
    /// Share of the light carried by this band.
    pub share: f32,
}

/// A light source described by spectral bands, ordered by decreasing wavelength.
#[derive(Debug, Clone, PartialEq)]
pub struct LightSpectrum {
    bands: Vec<SpectralBand>,
}

impl Default for LightSpectrum {
    fn default() -> Self {
        Self::daylight()
    }
}

impl LightSpectrum {
    /// Build a spectrum from bands.
    #[must_use]
    pub fn new(bands: Vec<SpectralBand>) -> Self {
        Self { bands }
    }

    /// Incident sunlight above the atmosphere.
    #[must_use]
    pub fn daylight() -> Self {
        let band = |wavelength, color| SpectralBand {
            wavelength,
            color,
            share: 1.0,
        };
        Self::new(vec![
            band(0.5, [0.0, 0.2, 0.75]),
            band(0.4, [0.0, 0.25, 0.25]),
            band(0.15, [0.55, 0.23, 0.05]),
            band(0.12, [0.85, 0.10, 0.15]),
        ])
    }

    #[must_use]
    pub fn bands(&self) -> &[SpectralBand] {
        &self.bands
    }

    /// Sum of band colours weighted by their shares.
    #[must_use]
    pub fn color(&self) -> [f32; 3] {
        self.bands.iter().fold([0.0; 3], |acc, band| {
            [
                acc[0] + band.color[0] * band.share,
                acc[1] + band.color[1] * band.share,
                acc[2] + band.color[2] * band.share,
            ]
        })
    }

    /// Split the spectrum after travelling `distance` through the atmosphere.
    ///
    /// Returns `(transmitted, scattered)`; for every band the two shares add
    /// up to the original share.
    #[must_use]
    pub fn scatter(&self, distance: f32) -> (LightSpectrum, LightSpectrum) {
        let mut transmitted = Vec::with_capacity(self.bands.len());
        let mut scattered = Vec::with_capacity(self.bands.len());
        for band in &self.bands {
            let rate = diffusion_rate(distance, band.wavelength);
            tracing::debug!(wavelength = band.wavelength, rate, "band scattering");
            transmitted.push(SpectralBand {
                share: band.share * (1.0 - rate),
                ..*band
            });
            scattered.push(SpectralBand {
                share: band.share * rate,
                ..*band
            });
        }
        (Self::new(transmitted), Self::new(scattered))
    }

    /// Position of `wavelength` between the shortest (0) and longest (1) band.
    fn normalize(&self, wavelength: f32) -> f32 {
        let (Some(first), Some(last)) = (self.bands.first(), self.bands.last()) else {
            return 0.0;
        };
        let span = first.wavelength - last.wavelength;
        if span == 0.0 {
            return 0.0;
        }
        (wavelength - last.wavelength) / span
    }

    /// Build the smoothed lookup curves, or `None` for an empty spectrum.
    #[must_use]
    pub fn curves(&self) -> Option<SpectrumCurves> {
        if self.bands.is_empty() {
            return None;
        }
        Some(SpectrumCurves {
            wavelengths: self.wavelength_curve(WAVELENGTH_SMOOTHING),
            colors: self.color_curves(COLOR_SMOOTHING),
            min_wavelength: self.bands[self.bands.len() - 1].wavelength,
            max_wavelength: self.bands[0].wavelength,
        })
    }

    /// Inverse cumulative distribution of the band shares.
    fn wavelength_curve(&self, smoothing: usize) -> Vec<f32> {
        let total: f32 = self.bands.iter().map(|b| b.share).sum();
        let count = self.bands.len() as f32;
        let mut cumulative = Vec::with_capacity(self.bands.len());
        let mut acc = 0.0;
        for band in &self.bands {
            acc += if total > 0.0 {
                band.share / total
            } else {
                1.0 / count
            };
            cumulative.push(acc);
        }

        let mut band = 0;
        let mut curve = Vec::with_capacity(CURVE_LENGTH);
        for i in 0..CURVE_LENGTH {
            let value = i as f32 / CURVE_LENGTH as f32;
            while band + 1 < cumulative.len() && value > cumulative[band] {
                band += 1;
            }
            curve.push(self.bands[band].wavelength);
        }
        smooth_curve(&mut curve, smoothing);
        curve
    }

    /// Per-channel colour of the nearest band along the normalised wavelength axis.
    fn color_curves(&self, smoothing: usize) -> [Vec<f32>; 3] {
        let normalized: Vec<f32> = self
            .bands
            .iter()
            .map(|b| self.normalize(b.wavelength))
            .collect();

        let mut closest = self.bands.len() - 1;
        let mut curves = [
            Vec::with_capacity(CURVE_LENGTH),
            Vec::with_capacity(CURVE_LENGTH),
            Vec::with_capacity(CURVE_LENGTH),
        ];
        for i in 0..CURVE_LENGTH {
            let value = i as f32 / CURVE_LENGTH as f32;
            while closest != 0
                && (normalized[closest] - value).abs() > (normalized[closest - 1] - value).abs()
            {
                closest -= 1;
            }
            let color = self.bands[closest].color;
            for (channel, curve) in curves.iter_mut().enumerate() {
                curve.push(color[channel]);
            }
        }
        for curve in &mut curves {
            smooth_curve(curve, smoothing);
        }
        curves
    }
}

/// Smooth a step curve by repeated neighbour averaging.
///
/// Pass `j` (from `passes` down to 1) replaces each interior sample with the
/// mean of the samples `j` away, sweeping from both ends, then pins the `j`
/// outermost samples to their nearest swept neighbour.
pub fn smooth_curve(curve: &mut [f32], passes: usize) {
    let len = curve.len();
    for j in (1..=passes).rev() {
        if 2 * j >= len {
            continue;
        }
        for i in j..(len - j) {
            let mirrored = len - 1 - i;
            curve[i] = (curve[i - j] + curve[i + j]) / 2.0;
            curve[mirrored] = (curve[mirrored - j] + curve[mirrored + j]) / 2.0;
        }
        for k in 0..j {
            curve[k] = curve[j];
            curve[len - 1 - k] = curve[len - 1 - j];
        }
    }
}

/// Average of the two curve samples around `value ∈ [0, 1]`.
fn lookup(curve: &[f32], value: f32) -> f32 {
    let last = curve.len() - 1;
    let i1 = (value.clamp(0.0, 1.0) * last as f32) as usize;
    let i2 = i1 + 1;
    if i2 > last {
        curve[last]
    } else {
        (curve[i1] + curve[i2]) / 2.0
    }
}

/// Lookup tables derived from a [`LightSpectrum`].
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumCurves {
    wavelengths: Vec<f32>,
    colors: [Vec<f32>; 3],
    min_wavelength: f32,
    max_wavelength: f32,
}

impl SpectrumCurves {
    /// Wavelength at cumulative position `value ∈ [0, 1]`.
    #[must_use]
    pub fn wavelength_at(&self, value: f32) -> f32 {
        lookup(&self.wavelengths, value)
    }

    /// Colour of a wavelength.
    #[must_use]
    pub fn color_of(&self, wavelength: f32) -> [f32; 3] {
        let span = self.max_wavelength - self.min_wavelength;
        let value = if span == 0.0 {
            0.0
        } else {
            (wavelength - self.min_wavelength) / span
        };
        [
            lookup(&self.colors[0], value),
            lookup(&self.colors[1], value),
            lookup(&self.colors[2], value),
        ]
    }
}

/// Length of the path through the atmosphere shell towards a light at
/// `elevation` radians above the horizon.
#[must_use]
pub fn travelling_distance(planet_radius: f32, atmosphere_radius: f32, elevation: f32) -> f32 {
    let (sin, cos) = elevation.sin_cos();
    let p = planet_radius;
    let a = atmosphere_radius;
    (a * a - p * p * cos * cos).max(0.0).sqrt() - p * sin
}

/// Share of a band scattered over `distance`.
#[must_use]
pub fn diffusion_rate(distance: f32, wavelength: f32) -> f32 {
    if distance < 0.0 {
        return 0.0;
    }
    1.0 - 1.0 / (distance.powi(2) * wavelength.powi(4) + 1.0)
}

/// Parameters of the sky model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyOptions {
    pub planet_radius: f32,
    pub atmosphere_radius: f32,
    /// Sun elevation in radians.
    pub sun_angle: f32,
    /// Sun disc size as a fraction of the texture width.
    pub sun_size: f32,
    pub ambient_sky_light: f32,
}

/// Light colours derived from the sky model, consumed by the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkyLighting {
    /// Colour of the transmitted sunlight, max channel at most 1.
    pub sun: [f32; 3],
    /// Colour of the scattered skylight.
    pub ambient: [f32; 3],
}

/// A generated sky texture with its matching light colours.
#[derive(Debug, Clone)]
pub struct SkyTexture {
    pub colormap: ColorMap,
    pub lighting: SkyLighting,
}

/// Sun and ambient colours for the given options.
#[must_use]
pub fn sky_lighting(options: &SkyOptions) -> (SkyLighting, LightSpectrum) {
    let distance = travelling_distance(
        options.planet_radius,
        options.atmosphere_radius,
        options.sun_angle,
    );
    let (transmitted, scattered) = LightSpectrum::daylight().scatter(distance);

    let mut sun = transmitted.color();
    let brightest = sun.iter().copied().fold(0.0_f32, f32::max);
    if brightest > 1.0 {
        for channel in &mut sun {
            *channel /= brightest;
        }
    }
    let lighting = SkyLighting {
        sun,
        ambient: scattered.color(),
    };
    (lighting, scattered)
}

/// Colour the sky demisphere texture.
#[must_use]
pub fn sky_colormap(width: usize, options: &SkyOptions) -> SkyTexture {
    let (lighting, scattered) = sky_lighting(options);
    tracing::info!(
        sun = ?lighting.sun,
        ambient = ?lighting.ambient,
        "sky lighting"
    );

    let mut colormap = ColorMap::new(width, width);
    let Some(curves) = scattered.curves() else {
        return SkyTexture { colormap, lighting };
    };

    let center = (width / 2) as i64;
    if center == 0 {
        return SkyTexture { colormap, lighting };
    }
    let radius_squared = center * center;
    let alpha = (FRAC_PI_2 - options.sun_angle).abs();

    for x in 0..width {
        for y in 0..width {
            let dx = x as i64 - center;
            let dy = y as i64 - center;
            let distance_squared = dx * dx + dy * dy;
            if distance_squared > radius_squared {
                continue;
            }

            let local_radius = ((radius_squared - dx * dx) as f32).sqrt() / center as f32;
            let sv_distance = (dy as f32 / center as f32).abs();
            let ratio = if sv_distance < 0.1 && local_radius < 0.1 {
                1.0
            } else {
                (sv_distance / local_radius).min(1.0)
            };
            let beta = ratio.acos();
            let view_angle = if dy < 0 {
                (beta - alpha).abs()
            } else {
                (PI - beta - alpha).abs()
            };
            let angle_rate = view_angle / FRAC_PI_2;

            let wavelength = curves.wavelength_at(1.0 - angle_rate);
            let base = curves.color_of(wavelength);
            let color = light_pixel(
                base,
                distance_squared as f32,
                width,
                lighting.sun,
                options,
                angle_rate,
            );
            colormap.set_pixel(x, width - 1 - y, color);
        }
    }

    SkyTexture { colormap, lighting }
}

/// Blend the sun disc and the ambient boost into a sky colour.
fn light_pixel(
    base: [f32; 3],
    distance_squared: f32,
    width: usize,
    sun_color: [f32; 3],
    options: &SkyOptions,
    angle_rate: f32,
) -> [f32; 3] {
    let distance_rate = distance_squared.sqrt() / width as f32;
    let sun_light = (1.0 - (distance_rate - options.sun_size).max(0.0)).powi(SUN_FALLOFF);
    let ambient = ((1.0 - angle_rate) / 8.0 * options.ambient_sky_light).max(0.0);
    let boost = 1.0 + ambient * 20.0;
    let sky_share = (1.0 - sun_light).max(0.0);

    std::array::from_fn(|c| (sun_light * sun_color[c] + sky_share * base[c]) * boost + sun_light * 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn options() -> SkyOptions {
        SkyOptions {
            planet_radius: 6.4,
            atmosphere_radius: 6.5,
            sun_angle: 20.0_f32.to_radians(),
            sun_size: 0.02,
            ambient_sky_light: 1.0,
        }
    }

    #[test]
    fn test_travelling_distance_extremes() {
        let zenith = travelling_distance(6.4, 6.5, FRAC_PI_2);
        assert!((zenith - 0.1).abs() < 1e-4, "zenith {zenith}");

        let horizon = travelling_distance(6.4, 6.5, 0.0);
        let expected = (6.5_f32 * 6.5 - 6.4 * 6.4).sqrt();
        assert!((horizon - expected).abs() < 1e-4, "horizon {horizon}");
    }

    #[test]
    fn test_travelling_distance_shrinks_with_elevation() {
        let mut previous = f32::INFINITY;
        for step in 0..=18 {
            let elevation = step as f32 * 5.0_f32.to_radians();
            let d = travelling_distance(6.4, 6.5, elevation);
            assert!(d <= previous + 1e-5);
            previous = d;
        }
    }

    #[test]
    fn test_diffusion_rate() {
        assert!(diffusion_rate(-1.0, 0.5).abs() < f32::EPSILON);
        assert!(diffusion_rate(0.0, 0.5).abs() < f32::EPSILON);
        let short = diffusion_rate(2.0, 0.12);
        let long = diffusion_rate(2.0, 0.5);
        assert!(long > short);
        assert!((0.0..1.0).contains(&long));
    }

    #[test]
    fn test_scatter_conserves_shares() {
        let spectrum = LightSpectrum::daylight();
        let (transmitted, scattered) = spectrum.scatter(3.0);
        for ((t, s), original) in transmitted
            .bands()
            .iter()
            .zip(scattered.bands())
            .zip(spectrum.bands())
        {
            assert!((t.share + s.share - original.share).abs() < 1e-6);
            assert_eq!(t.color, original.color);
        }
    }

    #[test]
    fn test_sun_color_is_normalised() {
        let (lighting, _) = sky_lighting(&options());
        let brightest = lighting.sun.iter().copied().fold(0.0_f32, f32::max);
        assert!(brightest <= 1.0 + 1e-6);
        assert!(lighting.ambient.iter().all(|c| *c >= 0.0));
    }

    #[test]
    fn test_curves_span_band_range() {
        let curves = LightSpectrum::daylight().curves().unwrap();
        for step in 0..=10 {
            let wl = curves.wavelength_at(step as f32 / 10.0);
            assert!((0.12 - 1e-4..=0.5 + 1e-4).contains(&wl), "wavelength {wl}");
        }
        // Longest wavelength is the blue band.
        let blue = curves.color_of(0.5);
        assert!(blue[2] > blue[0]);
    }

    #[test]
    fn test_empty_spectrum_has_no_curves() {
        assert!(LightSpectrum::new(Vec::new()).curves().is_none());
    }

    #[test]
    fn test_sky_colormap_disc() {
        let width = 65;
        let sky = sky_colormap(width, &options());
        assert_eq!(sky.colormap.width(), width);
        // Corners lie outside the disc.
        assert_eq!(sky.colormap.pixel(0, 0), Some([0.0; 3]));
        // The sun sits at the centre.
        let center = sky.colormap.pixel(32, 32).unwrap();
        assert!(center.iter().all(|c| *c >= 2.0));
        for y in 0..width {
            for x in 0..width {
                let pixel = sky.colormap.pixel(x, y).unwrap();
                assert!(pixel.iter().all(|c| c.is_finite()), "({x}, {y})");
            }
        }
    }

    #[test]
    fn test_sky_colormap_orientation() {
        let width = 65;
        let sky = sky_colormap(width, &options());
        let image = crate::image_io::encode_colormap(&sky.colormap);
        let brightness = |x: u32, y: u32| image.get_pixel(x, y).0.iter().map(|c| u32::from(*c)).sum::<u32>();

        // Mirror symmetric left to right.
        assert_eq!(image.get_pixel(12, 32), image.get_pixel(52, 32));
        assert_eq!(image.get_pixel(20, 10), image.get_pixel(44, 10));
        // The sun side is the bottom edge, the anti-sun side the top.
        assert!(brightness(32, 52) > brightness(32, 12));
    }

    proptest! {
        #[test]
        fn smoothing_stays_within_bounds(values in prop::collection::vec(-10.0_f32..10.0, 20..200), passes in 0_usize..40) {
            let lo = values.iter().copied().fold(f32::INFINITY, f32::min);
            let hi = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            let mut curve = values.clone();
            smooth_curve(&mut curve, passes);
            prop_assert!(curve.iter().all(|v| *v >= lo - 1e-4 && *v <= hi + 1e-4));
        }

        #[test]
        fn smoothing_keeps_constant_curves(value in -5.0_f32..5.0, passes in 0_usize..60) {
            let mut curve = vec![value; CURVE_LENGTH];
            smooth_curve(&mut curve, passes);
            prop_assert!(curve.iter().all(|v| (*v - value).abs() < 1e-5));
        }
    }
}
