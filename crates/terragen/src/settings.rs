//! `settings.toml` parsing and validation.
//!
//! The same file drives the generator and the viewer (which reads the terrain
//! height scale and the sun angle from it).

use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Default full terrain grid power of two (side `2^11 + 1`).
pub const DEFAULT_TERRAIN_POWER_OF_TWO: u32 = 11;
/// Default reduction between the full grid and the exported heightmap.
pub const DEFAULT_REDUCTION_POWER_OF_TWO: u32 = 4;
/// Largest supported terrain power of two.
pub const MAX_TERRAIN_POWER_OF_TWO: u32 = 14;

/// Which assets to (re)generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LaunchOptions {
    pub generate_sky_heightmap: bool,
    pub generate_sky_texture: bool,
    pub generate_terrain_heightmap: bool,
    pub generate_terrain_texture: bool,
}

/// Parameters of the generation algorithms.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GenerationOptions {
    pub seed: u64,

    /// Height of a white template pixel, and the viewer's vertical scale.
    pub max_terrain_height: f32,
    /// Diamond-square noise amplitude.
    pub irregularity: f32,

    /// Sun elevation above the horizon, in degrees.
    pub sun_angle: f32,
    pub sun_size: f32,
    pub atmosphere_radius: f32,
    pub planet_radius: f32,
    pub ambient_sky_light: f32,

    /// Direction shadows are cast towards (0: +x, 1: +y, 2: -x, 3: -y).
    pub shadow_direction: u8,

    pub number_of_erosion_iterations: u32,
    pub inertia: f64,
    pub radius: u8,
    pub capacity_factor: f64,

    #[serde(default = "default_terrain_power_of_two")]
    pub terrain_power_of_two: u32,
    #[serde(default = "default_reduction_power_of_two")]
    pub reduction_power_of_two: u32,
}

fn default_terrain_power_of_two() -> u32 {
    DEFAULT_TERRAIN_POWER_OF_TWO
}

fn default_reduction_power_of_two() -> u32 {
    DEFAULT_REDUCTION_POWER_OF_TWO
}

/// Contents of `settings.toml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    pub launch_options: LaunchOptions,
    pub generation_options: GenerationOptions,
}

impl Settings {
    /// Read, parse and validate a settings file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let settings = Self::parse(&text).map_err(|e| match e {
            Error::SettingsParse { message, .. } => Error::SettingsParse {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })?;
        tracing::debug!(?settings, "loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Parse and validate settings from TOML text.
    pub fn parse(text: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(text).map_err(|e| Error::SettingsParse {
            path: "<inline>".into(),
            message: e.to_string(),
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the generator cannot work with.
    pub fn validate(&self) -> Result<()> {
        let g = &self.generation_options;
        let reals = [
            ("max_terrain_height", f64::from(g.max_terrain_height)),
            ("irregularity", f64::from(g.irregularity)),
            ("sun_angle", f64::from(g.sun_angle)),
            ("sun_size", f64::from(g.sun_size)),
            ("atmosphere_radius", f64::from(g.atmosphere_radius)),
            ("planet_radius", f64::from(g.planet_radius)),
            ("ambient_sky_light", f64::from(g.ambient_sky_light)),
            ("inertia", g.inertia),
            ("capacity_factor", g.capacity_factor),
        ];
        if let Some((field, value)) = reals.iter().find(|(_, value)| !value.is_finite()) {
            return Err(Error::invalid(*field, format!("must be finite, got {value}")));
        }
        if g.max_terrain_height <= 0.0 {
            return Err(Error::invalid(
                "max_terrain_height",
                format!("must be positive, got {}", g.max_terrain_height),
            ));
        }
        if g.planet_radius <= 0.0 {
            return Err(Error::invalid(
                "planet_radius",
                format!("must be positive, got {}", g.planet_radius),
            ));
        }
        if g.atmosphere_radius <= g.planet_radius {
            return Err(Error::invalid(
                "atmosphere_radius",
                format!(
                    "must exceed planet_radius ({}), got {}",
                    g.planet_radius, g.atmosphere_radius
                ),
            ));
        }
        if g.shadow_direction > 3 {
            return Err(Error::invalid(
                "shadow_direction",
                format!("must be in 0..=3, got {}", g.shadow_direction),
            ));
        }
        if !(0.0..1.0).contains(&g.inertia) {
            return Err(Error::invalid(
                "inertia",
                format!("must be in [0, 1), got {}", g.inertia),
            ));
        }
        if g.radius == 0 {
            return Err(Error::invalid("radius", "must be at least 1"));
        }
        if g.terrain_power_of_two > MAX_TERRAIN_POWER_OF_TWO {
            return Err(Error::invalid(
                "terrain_power_of_two",
                format!(
                    "must be at most {MAX_TERRAIN_POWER_OF_TWO}, got {}",
                    g.terrain_power_of_two
                ),
            ));
        }
        if g.reduction_power_of_two >= g.terrain_power_of_two {
            return Err(Error::invalid(
                "reduction_power_of_two",
                format!(
                    "must be below terrain_power_of_two ({}), got {}",
                    g.terrain_power_of_two, g.reduction_power_of_two
                ),
            ));
        }
        Ok(())
    }
}

impl GenerationOptions {
    /// Side of the full terrain grid.
    #[must_use]
    pub fn terrain_width(&self) -> usize {
        (1_usize << self.terrain_power_of_two) + 1
    }

    /// Stride between the full grid and the exported heightmap.
    #[must_use]
    pub fn reduction_stride(&self) -> usize {
        1_usize << self.reduction_power_of_two
    }

    /// Side of the exported heightmap.
    #[must_use]
    pub fn reduced_width(&self) -> usize {
        (1_usize << (self.terrain_power_of_two - self.reduction_power_of_two)) + 1
    }

    /// Sun elevation in radians.
    #[must_use]
    pub fn sun_angle_radians(&self) -> f32 {
        self.sun_angle.to_radians()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const SAMPLE: &str = r"
[launch_options]
generate_sky_heightmap = true
generate_sky_texture = true
generate_terrain_heightmap = true
generate_terrain_texture = false

[generation_options]
seed = 42
max_terrain_height = 120.0
irregularity = 0.5
sun_angle = 20.0
sun_size = 0.02
atmosphere_radius = 6.5
planet_radius = 6.4
ambient_sky_light = 1.0
shadow_direction = 1
number_of_erosion_iterations = 100
inertia = 0.3
radius = 3
capacity_factor = 4.0
";

    #[test]
    fn test_parse_sample_with_defaults() {
        let settings = Settings::parse(SAMPLE).unwrap();
        assert!(!settings.launch_options.generate_terrain_texture);
        let g = &settings.generation_options;
        assert_eq!(g.seed, 42);
        assert_eq!(g.terrain_power_of_two, DEFAULT_TERRAIN_POWER_OF_TWO);
        assert_eq!(g.reduction_power_of_two, DEFAULT_REDUCTION_POWER_OF_TWO);
        assert_eq!(g.terrain_width(), 2049);
        assert_eq!(g.reduction_stride(), 16);
        assert_eq!(g.reduced_width(), 129);
        assert!((g.sun_angle_radians() - 20.0_f32.to_radians()).abs() < 1e-6);
    }

    #[test]
    fn test_missing_field_is_parse_error() {
        let text = SAMPLE.replace("seed = 42\n", "");
        assert!(matches!(
            Settings::parse(&text),
            Err(Error::SettingsParse { .. })
        ));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let cases = [
            ("max_terrain_height = 120.0", "max_terrain_height = 0.0", "max_terrain_height"),
            ("atmosphere_radius = 6.5", "atmosphere_radius = 6.0", "atmosphere_radius"),
            ("shadow_direction = 1", "shadow_direction = 4", "shadow_direction"),
            ("inertia = 0.3", "inertia = 1.0", "inertia"),
            ("radius = 3", "radius = 0", "radius"),
        ];
        for (from, to, expected) in cases {
            let text = SAMPLE.replace(from, to);
            match Settings::parse(&text) {
                Err(Error::InvalidSetting { field, .. }) => assert_eq!(field, expected),
                other => panic!("expected {expected} to be rejected, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_non_finite_values_are_rejected() {
        let cases = [
            ("planet_radius = 6.4", "planet_radius = nan", "planet_radius"),
            ("sun_angle = 20.0", "sun_angle = inf", "sun_angle"),
            ("capacity_factor = 4.0", "capacity_factor = -inf", "capacity_factor"),
            ("max_terrain_height = 120.0", "max_terrain_height = nan", "max_terrain_height"),
        ];
        for (from, to, expected) in cases {
            let text = SAMPLE.replace(from, to);
            match Settings::parse(&text) {
                Err(Error::InvalidSetting { field, .. }) => assert_eq!(field, expected),
                other => panic!("expected {expected} to be rejected, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_reduction_must_be_below_terrain_power() {
        let text = SAMPLE.replace(
            "capacity_factor = 4.0",
            "capacity_factor = 4.0\nterrain_power_of_two = 4\nreduction_power_of_two = 4",
        );
        assert!(matches!(
            Settings::parse(&text),
            Err(Error::InvalidSetting {
                field: "reduction_power_of_two",
                ..
            })
        ));
    }

    #[test]
    fn test_load_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "not = [valid").unwrap();
        match Settings::load(&path) {
            Err(Error::SettingsParse { path: p, .. }) => assert_eq!(p, path),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            Settings::load(dir.path().join("missing.toml")),
            Err(Error::Io { .. })
        ));
    }
}
