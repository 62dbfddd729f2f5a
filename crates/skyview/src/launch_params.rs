//! Launch parameter parsing for the viewer.

use std::path::PathBuf;

use bevy::prelude::*;

const DEFAULT_ASSETS_DIR: &str = ".";
const DEFAULT_SETTINGS: &str = "settings.toml";
const DEFAULT_STATE_FILE: &str = "viewer_state.json";
const DEFAULT_SCREENSHOT_DIR: &str = "screenshots";
/// Fog starts this far from the camera.
const DEFAULT_FOG_START: f32 = 200.0;
/// Fog is opaque this far from the camera.
const DEFAULT_FOG_END: f32 = 2000.0;

/// Launch parameters for the viewer.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct LaunchParams {
    /// Directory holding the generated images.
    pub assets_dir: PathBuf,
    /// Generator settings, for the terrain height scale and sun angle.
    pub settings: PathBuf,
    /// Where views are saved and loaded.
    pub state_file: PathBuf,
    pub screenshot_dir: PathBuf,
    /// Session name; asked for on the terminal when absent.
    pub session: Option<String>,
    pub fog_start: f32,
    pub fog_end: f32,
}

impl Default for LaunchParams {
    fn default() -> Self {
        Self {
            assets_dir: PathBuf::from(DEFAULT_ASSETS_DIR),
            settings: PathBuf::from(DEFAULT_SETTINGS),
            state_file: PathBuf::from(DEFAULT_STATE_FILE),
            screenshot_dir: PathBuf::from(DEFAULT_SCREENSHOT_DIR),
            session: None,
            fog_start: DEFAULT_FOG_START,
            fog_end: DEFAULT_FOG_END,
        }
    }
}

mod native {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    #[command(about = "Fly over a generated terrain under its generated sky")]
    pub(super) struct CliArgs {
        /// Directory holding heightmap.png, colormap.png and the demisphere images.
        #[arg(long, default_value = DEFAULT_ASSETS_DIR)]
        assets: PathBuf,

        /// Generator settings file.
        #[arg(long, default_value = DEFAULT_SETTINGS)]
        settings: PathBuf,

        /// File used by the save and load view keys.
        #[arg(long, default_value = DEFAULT_STATE_FILE)]
        state_file: PathBuf,

        /// Directory screenshots are written to.
        #[arg(long, default_value = DEFAULT_SCREENSHOT_DIR)]
        screenshot_dir: PathBuf,

        /// Session name used in screenshot file names.
        #[arg(long)]
        session: Option<String>,

        /// Distance at which the fog starts.
        #[arg(long, default_value_t = DEFAULT_FOG_START)]
        fog_start: f32,

        /// Distance at which the fog is opaque.
        #[arg(long, default_value_t = DEFAULT_FOG_END)]
        fog_end: f32,
    }

    impl From<CliArgs> for LaunchParams {
        fn from(args: CliArgs) -> Self {
            LaunchParams {
                assets_dir: args.assets,
                settings: args.settings,
                state_file: args.state_file,
                screenshot_dir: args.screenshot_dir,
                session: args.session,
                fog_start: args.fog_start,
                fog_end: args.fog_end.max(args.fog_start),
            }
        }
    }

    pub fn parse() -> LaunchParams {
        CliArgs::parse().into()
    }
}

/// Parse launch parameters from the command line.
pub fn parse() -> LaunchParams {
    native::parse()
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::native::CliArgs;
    use super::*;

    #[test]
    fn test_defaults_match() {
        let parsed: LaunchParams = CliArgs::parse_from(["skyview"]).into();
        assert_eq!(parsed, LaunchParams::default());
    }

    #[test]
    fn test_overrides() {
        let parsed: LaunchParams = CliArgs::parse_from([
            "skyview",
            "--assets",
            "out",
            "--session",
            "dunes",
            "--fog-start",
            "50",
            "--fog-end",
            "10",
        ])
        .into();
        assert_eq!(parsed.assets_dir, PathBuf::from("out"));
        assert_eq!(parsed.session.as_deref(), Some("dunes"));
        // The far distance never ends up before the near one.
        assert!((parsed.fog_end - 50.0).abs() < f32::EPSILON);
    }
}
