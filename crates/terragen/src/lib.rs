//! Procedural terrain and sky demisphere generator.
//!
//! Produces the assets the `skyview` viewer renders:
//!
//! - `heightmap.png`: template-guided diamond-square terrain with droplet
//!   erosion, exported at a reduced resolution
//! - `colormap.png`: full resolution terrain texture with cast shadows
//! - `demisphere_heightmap.png` / `demisphere_colormap.png`: the sky dome and
//!   its colours from a small spectral scattering model
//! - `sky_lighting.json`: sun and ambient colours from the same model
//!
//! # Example
//!
//! ```ignore
//! use terragen::{Generator, OutputPaths, Settings};
//!
//! let settings = Settings::load("settings.toml")?;
//! let report = Generator::new(settings, None).run(&OutputPaths::in_dir("."))?;
//! ```

pub mod colormap;
pub mod demisphere;
pub mod diamond_square;
pub mod erosion;
mod error;
pub mod gradient;
pub mod grid;
pub mod image_io;
mod pipeline;
pub mod rng;
pub mod settings;
pub mod sky;
pub mod texture;

pub use colormap::ColorMap;
pub use error::{Error, Result};
pub use grid::Grid;
pub use pipeline::{GenerationReport, Generator, OutputPaths};
pub use settings::{GenerationOptions, LaunchOptions, Settings};
pub use sky::SkyLighting;
