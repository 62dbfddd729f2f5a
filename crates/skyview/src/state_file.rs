//! Saving and restoring the view as JSON.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::controls::ViewState;

/// On-disk form of a saved view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SavedView {
    pub camera_hpr: [f32; 3],
    pub camera_xyz: [f32; 3],
    pub sky_height: f32,
    /// Sky heading in degrees.
    pub sky_rotation: f32,
}

/// Errors from reading or writing the state file.
#[derive(Debug)]
pub enum StateFileError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl fmt::Display for StateFileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Json { path, source } => write!(f, "{}: invalid view state: {source}", path.display()),
        }
    }
}

impl std::error::Error for StateFileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
        }
    }
}

impl From<&ViewState> for SavedView {
    fn from(view: &ViewState) -> Self {
        Self {
            camera_hpr: view.camera_hpr,
            camera_xyz: view.camera_xyz,
            sky_height: view.sky_height,
            sky_rotation: view.sky_hpr[0],
        }
    }
}

impl SavedView {
    /// Overwrite the saved fields of `view`; sky pitch and roll are kept.
    pub fn apply_to(&self, view: &mut ViewState) {
        view.camera_hpr = self.camera_hpr;
        view.camera_xyz = self.camera_xyz;
        view.sky_height = self.sky_height;
        view.sky_hpr[0] = self.sky_rotation;
    }

    pub fn save(&self, path: &Path) -> Result<(), StateFileError> {
        let json = serde_json::to_string_pretty(self).map_err(|source| StateFileError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StateFileError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, json).map_err(|source| StateFileError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, StateFileError> {
        let text = fs::read_to_string(path).map_err(|source| StateFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| StateFileError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}
