//! Runs the enabled generation stages and writes their outputs.

use std::path::{Path, PathBuf};

use crate::demisphere::{DEMISPHERE_HEIGHTMAP_WIDTH, demisphere_heightmap};
use crate::diamond_square::{self, DiamondSquareOptions};
use crate::erosion::{ErosionOptions, ErosionStats};
use crate::error::Result;
use crate::gradient::gradient_map;
use crate::grid::Grid;
use crate::image_io::{encode_colormap, encode_heightmap, save_png, write_sky_lighting};
use crate::rng::{TerrainRng, seeded};
use crate::settings::{GenerationOptions, Settings};
use crate::sky::{SKY_COLORMAP_WIDTH, SkyLighting, SkyOptions, sky_colormap};
use crate::texture::{ShadowDirection, TextureOptions, terrain_colormap};

/// Where each generated asset is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub heightmap: PathBuf,
    pub colormap: PathBuf,
    pub demisphere_heightmap: PathBuf,
    pub demisphere_colormap: PathBuf,
    pub sky_lighting: PathBuf,
}

impl OutputPaths {
    /// The standard file names under `dir`.
    #[must_use]
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            heightmap: dir.join("heightmap.png"),
            colormap: dir.join("colormap.png"),
            demisphere_heightmap: dir.join("demisphere_heightmap.png"),
            demisphere_colormap: dir.join("demisphere_colormap.png"),
            sky_lighting: dir.join("sky_lighting.json"),
        }
    }
}

/// Summary of one generator run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationReport {
    /// Files written, in order.
    pub written: Vec<PathBuf>,
    /// Present when the terrain heightmap was generated.
    pub erosion: Option<ErosionStats>,
    /// Present when the sky texture was generated.
    pub lighting: Option<SkyLighting>,
}

/// Settings plus an optional template, ready to run.
#[derive(Debug, Clone)]
pub struct Generator {
    pub settings: Settings,
    pub template: Option<Grid<f32>>,
}

impl Generator {
    #[must_use]
    pub fn new(settings: Settings, template: Option<Grid<f32>>) -> Self {
        Self { settings, template }
    }

    /// Execute the enabled stages: terrain heightmap, terrain texture, sky
    /// heightmap, sky texture.
    pub fn run(&self, paths: &OutputPaths) -> Result<GenerationReport> {
        let launch = &self.settings.launch_options;
        let options = &self.settings.generation_options;
        let mut rng = seeded(options.seed);
        let mut report = GenerationReport::default();

        if launch.generate_terrain_heightmap {
            self.terrain_stage(paths, &mut rng, &mut report)?;
        } else if launch.generate_terrain_texture {
            tracing::warn!(
                "terrain texture requested without the terrain heightmap; skipping the texture"
            );
        }

        if launch.generate_sky_heightmap {
            let _span = tracing::info_span!("sky_heightmap").entered();
            let dome = demisphere_heightmap(DEMISPHERE_HEIGHTMAP_WIDTH);
            save_png(&encode_heightmap(&dome, false).into(), &paths.demisphere_heightmap)?;
            report.written.push(paths.demisphere_heightmap.clone());
        }

        if launch.generate_sky_texture {
            let _span = tracing::info_span!("sky_texture").entered();
            let sky = sky_colormap(SKY_COLORMAP_WIDTH, &sky_options(options));
            save_png(&encode_colormap(&sky.colormap).into(), &paths.demisphere_colormap)?;
            write_sky_lighting(&paths.sky_lighting, &sky.lighting)?;
            report.written.push(paths.demisphere_colormap.clone());
            report.written.push(paths.sky_lighting.clone());
            report.lighting = Some(sky.lighting);
        }

        tracing::info!(files = report.written.len(), "generation finished");
        Ok(report)
    }

    fn terrain_stage(
        &self,
        paths: &OutputPaths,
        rng: &mut TerrainRng,
        report: &mut GenerationReport,
    ) -> Result<()> {
        let options = &self.settings.generation_options;
        let _span = tracing::info_span!("terrain").entered();

        if self.template.is_none() {
            tracing::warn!("no template given, generating an untemplated terrain");
        }
        let terrain = diamond_square::generate(
            self.template.as_ref(),
            &diamond_square_options(options),
            rng,
        )?;
        save_png(&encode_heightmap(&terrain.reduced, false).into(), &paths.heightmap)?;
        report.written.push(paths.heightmap.clone());
        report.erosion = Some(terrain.erosion);

        if self.settings.launch_options.generate_terrain_texture {
            let gradient = gradient_map(&terrain.reduced, options.max_terrain_height);
            let texture_options = TextureOptions {
                scale_divisor: options.reduction_stride(),
                ref_height: options.max_terrain_height,
                sun_angle: options.sun_angle_radians(),
                shadow_direction: ShadowDirection::try_from(options.shadow_direction)?,
            };
            let colormap = terrain_colormap(&terrain.full, &gradient, &texture_options, rng);
            save_png(&encode_colormap(&colormap).into(), &paths.colormap)?;
            report.written.push(paths.colormap.clone());
        }
        Ok(())
    }
}

fn diamond_square_options(options: &GenerationOptions) -> DiamondSquareOptions {
    DiamondSquareOptions {
        terrain_power_of_two: options.terrain_power_of_two,
        reduction_power_of_two: options.reduction_power_of_two,
        irregularity: options.irregularity,
        max_terrain_height: options.max_terrain_height,
        erosion: ErosionOptions {
            iterations: options.number_of_erosion_iterations,
            inertia: options.inertia,
            radius: options.radius,
            capacity_factor: options.capacity_factor,
            max_terrain_height: options.max_terrain_height,
        },
    }
}

fn sky_options(options: &GenerationOptions) -> SkyOptions {
    SkyOptions {
        planet_radius: options.planet_radius,
        atmosphere_radius: options.atmosphere_radius,
        sun_angle: options.sun_angle_radians(),
        sun_size: options.sun_size,
        ambient_sky_light: options.ambient_sky_light,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_io::read_sky_lighting;
    use crate::settings::tests::SAMPLE;

    fn small_settings(terrain: bool, texture: bool, sky_heightmap: bool, sky_texture: bool) -> Settings {
        let mut settings = Settings::parse(SAMPLE).unwrap();
        settings.launch_options.generate_terrain_heightmap = terrain;
        settings.launch_options.generate_terrain_texture = texture;
        settings.launch_options.generate_sky_heightmap = sky_heightmap;
        settings.launch_options.generate_sky_texture = sky_texture;
        settings.generation_options.terrain_power_of_two = 6;
        settings.generation_options.reduction_power_of_two = 2;
        settings
    }

    #[test]
    fn test_output_paths() {
        let paths = OutputPaths::in_dir("out");
        assert_eq!(paths.heightmap, Path::new("out/heightmap.png"));
        assert_eq!(paths.sky_lighting, Path::new("out/sky_lighting.json"));
    }

    #[test]
    fn test_terrain_stages() {
        let dir = tempfile::tempdir().unwrap();
        let paths = OutputPaths::in_dir(dir.path());
        let generator = Generator::new(small_settings(true, true, false, false), None);
        let report = generator.run(&paths).unwrap();

        assert_eq!(report.written, vec![paths.heightmap.clone(), paths.colormap.clone()]);
        assert_eq!(report.erosion.map(|e| e.droplets), Some(100));
        assert!(report.lighting.is_none());

        let heightmap = image::open(&paths.heightmap).unwrap();
        assert_eq!((heightmap.width(), heightmap.height()), (17, 17));
        let colormap = image::open(&paths.colormap).unwrap();
        assert_eq!((colormap.width(), colormap.height()), (65, 65));
    }

    #[test]
    fn test_texture_requires_heightmap() {
        let dir = tempfile::tempdir().unwrap();
        let paths = OutputPaths::in_dir(dir.path());
        let generator = Generator::new(small_settings(false, true, true, false), None);
        let report = generator.run(&paths).unwrap();

        assert_eq!(report.written, vec![paths.demisphere_heightmap.clone()]);
        assert!(!paths.colormap.exists());
        let dome = image::open(&paths.demisphere_heightmap).unwrap();
        assert_eq!(dome.width() as usize, DEMISPHERE_HEIGHTMAP_WIDTH);
    }

    #[test]
    fn test_sky_texture_writes_lighting() {
        let dir = tempfile::tempdir().unwrap();
        let paths = OutputPaths::in_dir(dir.path());
        let generator = Generator::new(small_settings(false, false, false, true), None);
        let report = generator.run(&paths).unwrap();

        let lighting = read_sky_lighting(&paths.sky_lighting).unwrap();
        assert_eq!(report.lighting, Some(lighting));
        let sky = image::open(&paths.demisphere_colormap).unwrap();
        assert_eq!(sky.width() as usize, SKY_COLORMAP_WIDTH);
    }

    #[test]
    fn test_templated_run_is_reproducible() {
        let template = Grid::from_fn(5, 5, |x, y| (x * 10 + y * 5) as f32);
        let a_dir = tempfile::tempdir().unwrap();
        let b_dir = tempfile::tempdir().unwrap();
        let generator = Generator::new(small_settings(true, false, false, false), Some(template));

        let a = generator.run(&OutputPaths::in_dir(a_dir.path())).unwrap();
        let b = generator.run(&OutputPaths::in_dir(b_dir.path())).unwrap();
        assert_eq!(a.erosion, b.erosion);

        let a_image = image::open(a_dir.path().join("heightmap.png")).unwrap().to_luma16();
        let b_image = image::open(b_dir.path().join("heightmap.png")).unwrap().to_luma16();
        assert_eq!(a_image, b_image);
    }
}
