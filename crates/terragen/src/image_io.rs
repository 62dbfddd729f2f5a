//! PNG import and export of grids, colour maps and the sky lighting file.

use std::fs;
use std::path::Path;

use image::{DynamicImage, ImageBuffer, Luma, Rgb};

use crate::colormap::ColorMap;
use crate::diamond_square::power_of_two_plus_one;
use crate::error::{Error, Result};
use crate::grid::Grid;
use crate::sky::SkyLighting;

/// 16-bit grayscale heightmap image.
pub type HeightmapImage = ImageBuffer<Luma<u16>, Vec<u16>>;
/// 16-bit RGB colour image.
pub type ColormapImage = ImageBuffer<Rgb<u16>, Vec<u16>>;

fn to_u16(value: f32) -> u16 {
    (value.clamp(0.0, 1.0) * f32::from(u16::MAX)).round() as u16
}

/// Encode a grid as 16-bit grayscale, stretched to the full range.
///
/// A flat grid maps to black. With `flatten`, the normalised value is passed
/// through a square root to lift the low end.
#[must_use]
pub fn encode_heightmap(grid: &Grid<f32>, flatten: bool) -> HeightmapImage {
    let (lo, hi) = grid.min_max().unwrap_or((0.0, 0.0));
    let span = hi - lo;
    ImageBuffer::from_fn(grid.width() as u32, grid.height() as u32, |x, y| {
        let value = grid.get(x as usize, y as usize).copied().unwrap_or(lo);
        let mut normalized = if span > 0.0 { (value - lo) / span } else { 0.0 };
        if flatten {
            normalized = normalized.sqrt();
        }
        Luma([to_u16(normalized)])
    })
}

/// Encode a colour map as 16-bit RGB, clamping channels to `[0, 1]`.
#[must_use]
pub fn encode_colormap(colormap: &ColorMap) -> ColormapImage {
    ImageBuffer::from_fn(colormap.width() as u32, colormap.height() as u32, |x, y| {
        let pixel = colormap.pixel(x as usize, y as usize).unwrap_or_default();
        Rgb(pixel.map(to_u16))
    })
}

/// Write an image as PNG, creating parent directories as needed.
pub fn save_png(image: &DynamicImage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    image
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|e| Error::image(path, e))?;
    tracing::info!(
        path = %path.display(),
        width = image.width(),
        height = image.height(),
        "wrote image"
    );
    Ok(())
}

/// Turn a decoded template into heights, `luma / 255 · max_height`.
pub fn template_from_image(image: &DynamicImage, max_height: f32) -> Result<Grid<f32>> {
    let luma = image.to_luma8();
    let (width, height) = luma.dimensions();
    if width != height || power_of_two_plus_one(width as usize).is_none() {
        return Err(Error::InvalidTemplate { width, height });
    }
    Ok(Grid::from_fn(width as usize, height as usize, |x, y| {
        f32::from(luma.get_pixel(x as u32, y as u32)[0]) / 255.0 * max_height
    }))
}

/// Load a template PNG; it must be square with side `2^t + 1`.
pub fn load_template(path: &Path, max_height: f32) -> Result<Grid<f32>> {
    let image = image::open(path).map_err(|e| Error::image(path, e))?;
    let template = template_from_image(&image, max_height)?;
    tracing::info!(
        path = %path.display(),
        side = template.width(),
        "loaded template"
    );
    Ok(template)
}

/// Load any PNG as heights in `[0, 1]`, from its 16-bit luma.
pub fn load_heights(path: &Path) -> Result<Grid<f32>> {
    let image = image::open(path).map_err(|e| Error::image(path, e))?;
    Ok(heights_from_image(&image))
}

/// Heights in `[0, 1]` from the 16-bit luma of `image`.
#[must_use]
pub fn heights_from_image(image: &DynamicImage) -> Grid<f32> {
    let luma = image.to_luma16();
    let (width, height) = luma.dimensions();
    Grid::from_fn(width as usize, height as usize, |x, y| {
        f32::from(luma.get_pixel(x as u32, y as u32)[0]) / f32::from(u16::MAX)
    })
}

/// Load any PNG as 8-bit RGBA, ready for upload as an sRGB texture.
pub fn load_rgba8(path: &Path) -> Result<image::RgbaImage> {
    let image = image::open(path).map_err(|e| Error::image(path, e))?;
    Ok(image.to_rgba8())
}

/// Write the sky lighting colours as pretty JSON.
pub fn write_sky_lighting(path: &Path, lighting: &SkyLighting) -> Result<()> {
    let json = serde_json::to_string_pretty(lighting).map_err(|e| Error::Json {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    fs::write(path, json).map_err(|e| Error::io(path, e))?;
    tracing::info!(path = %path.display(), "wrote sky lighting");
    Ok(())
}

/// Read a file written by [`write_sky_lighting`].
pub fn read_sky_lighting(path: &Path) -> Result<SkyLighting> {
    let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    serde_json::from_str(&text).map_err(|e| Error::Json {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
