//! Error types for the terragen crate.

use std::fmt;
use std::path::PathBuf;

/// Result type for terragen operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while generating or exporting assets.
#[derive(Debug)]
pub enum Error {
    /// Reading or writing a file failed.
    Io {
        /// The file involved.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },
    /// The settings file could not be parsed.
    SettingsParse {
        /// The settings file.
        path: PathBuf,
        /// The parser message.
        message: String,
    },
    /// A setting has a value the generator cannot work with.
    InvalidSetting {
        /// Name of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        detail: String,
    },
    /// Image decoding or encoding failed.
    Image {
        /// The image file.
        path: PathBuf,
        /// The underlying error.
        source: image::ImageError,
    },
    /// The template image does not describe a `2^t + 1` square grid.
    InvalidTemplate {
        /// Template width in pixels.
        width: u32,
        /// Template height in pixels.
        height: u32,
    },
    /// The template has more levels than the terrain grid.
    TemplateTooLarge {
        /// Template power of two.
        template: u32,
        /// Terrain power of two.
        terrain: u32,
    },
    /// A buffer did not match the requested grid dimensions.
    DimensionMismatch {
        /// Expected number of samples.
        expected: usize,
        /// Actual number of samples.
        actual: usize,
    },
    /// JSON (de)serialization failed.
    Json {
        /// The file involved.
        path: PathBuf,
        /// The parser message.
        message: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io { path, source } => {
                write!(f, "i/o error on {}: {source}", path.display())
            }
            Error::SettingsParse { path, message } => {
                write!(f, "failed to parse settings {}: {message}", path.display())
            }
            Error::InvalidSetting { field, detail } => {
                write!(f, "invalid setting `{field}`: {detail}")
            }
            Error::Image { path, source } => {
                write!(f, "image error on {}: {source}", path.display())
            }
            Error::InvalidTemplate { width, height } => {
                write!(
                    f,
                    "template must be a square of side 2^t + 1, got {width}x{height}"
                )
            }
            Error::TemplateTooLarge { template, terrain } => {
                write!(
                    f,
                    "template power of two {template} exceeds terrain power of two {terrain}"
                )
            }
            Error::DimensionMismatch { expected, actual } => {
                write!(f, "expected {expected} samples, got {actual}")
            }
            Error::Json { path, message } => {
                write!(f, "invalid json in {}: {message}", path.display())
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { source, .. } => Some(source),
            Error::Image { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn image(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
        Error::Image {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid(field: &'static str, detail: impl Into<String>) -> Self {
        Error::InvalidSetting {
            field,
            detail: detail.into(),
        }
    }
}
