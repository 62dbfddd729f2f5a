//! Interactive viewer for terrain and sky generated by `terragen`.
//!
//! Loads the heightmaps and colormaps from the assets directory, builds the
//! terrain and the two sky demispheres, and flies a camera over them.

mod controls;
mod heightfield;
mod input;
mod launch_params;
mod scene;
mod session;
mod state_file;
mod ui;

use std::io;
use std::process::ExitCode;

use bevy::prelude::*;
use controls::ViewState;
use input::InputPlugin;
use launch_params::LaunchParams;
use scene::{SceneConfig, ScenePlugin};
use session::{Session, SimpleDate, prompt_session_name};
use ui::DebugUiPlugin;

/// Plugin for the main application.
pub struct AppPlugin {
    scene: SceneConfig,
    view: ViewState,
    session: Session,
}

impl Plugin for AppPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((
            InputPlugin,
            ScenePlugin {
                config: self.scene.clone(),
                view: self.view,
                session: self.session.clone(),
            },
            DebugUiPlugin,
        ));
    }
}

/// Session name from the command line, or asked for on the terminal.
fn session_name(params: &LaunchParams) -> io::Result<String> {
    match &params.session {
        Some(name) => Ok(name.clone()),
        None => prompt_session_name(&mut io::stdin().lock(), &mut io::stdout()),
    }
}

fn main() -> ExitCode {
    {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer())
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }

    let params = launch_params::parse();

    let settings = match terragen::Settings::load(&params.settings) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let name = match session_name(&params) {
        Ok(name) => name,
        Err(e) => {
            tracing::error!("Failed to read the session name: {e}");
            return ExitCode::FAILURE;
        }
    };
    let session = Session::new(&name, SimpleDate::today());
    tracing::info!(session = session.label(), "Starting session");

    let options = &settings.generation_options;
    let plugin = AppPlugin {
        scene: SceneConfig::new(&params, options),
        view: ViewState::new(options.sun_angle),
        session,
    };

    let window = Window {
        title: "skyview".to_string(),
        resolution: (1280, 720).into(),
        position: WindowPosition::Centered(MonitorSelection::Primary),
        ..Default::default()
    };

    let exit = App::new()
        .add_plugins(
            DefaultPlugins.set(WindowPlugin {
                primary_window: Some(window),
                ..Default::default()
            }),
        )
        .insert_resource(params)
        .add_plugins(plugin)
        .run();

    if exit.is_error() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
