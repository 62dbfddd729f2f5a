//! Keyboard bindings for the viewer.
//!
//! Bindings follow an AZERTY layout: Z/Q/S/D move, K/M/O/L look around.
//! Key codes are physical positions, so the labels are the AZERTY legends of
//! those keys (Z/Q/S/D sit where QWERTY has W/A/S/D). Held actions are copied
//! into [`ControlState`] every frame; one-shot actions are handled by the
//! scene systems.

use bevy::prelude::*;
use leafwing_input_manager::{plugin::InputManagerSystem, prelude::*};

use crate::controls::ControlState;

// ============================================================================
// Actions
// ============================================================================

/// Everything the viewer reacts to.
#[derive(Actionlike, PartialEq, Eq, Hash, Clone, Copy, Debug, Reflect)]
pub enum ViewerAction {
    MoveUp,
    MoveDown,
    LookLeft,
    LookRight,
    LookUp,
    LookDown,
    MoveForward,
    MoveBackward,
    MoveLeft,
    MoveRight,
    /// Stop the sky from following the camera (B).
    DetachSky,
    /// Make the sky follow the camera again (N).
    AttachSky,
    MoveSkyUp,
    MoveSkyDown,
    TurnSkyLeft,
    TurnSkyRight,
    /// Snap the sky height to the camera height (A).
    LockSkyHeight,
    ReloadTextures,
    Screenshot,
    SaveView,
    LoadView,
}

impl ViewerAction {
    pub const ALL: [ViewerAction; 21] = [
        Self::MoveUp,
        Self::MoveDown,
        Self::LookLeft,
        Self::LookRight,
        Self::LookUp,
        Self::LookDown,
        Self::MoveForward,
        Self::MoveBackward,
        Self::MoveLeft,
        Self::MoveRight,
        Self::DetachSky,
        Self::AttachSky,
        Self::MoveSkyUp,
        Self::MoveSkyDown,
        Self::TurnSkyLeft,
        Self::TurnSkyRight,
        Self::LockSkyHeight,
        Self::ReloadTextures,
        Self::Screenshot,
        Self::SaveView,
        Self::LoadView,
    ];

    /// Human readable description, for the help panel.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::MoveUp => "move up",
            Self::MoveDown => "move down",
            Self::LookLeft => "look left",
            Self::LookRight => "look right",
            Self::LookUp => "look up",
            Self::LookDown => "look down",
            Self::MoveForward => "move forward",
            Self::MoveBackward => "move backward",
            Self::MoveLeft => "move left",
            Self::MoveRight => "move right",
            Self::DetachSky => "detach sky",
            Self::AttachSky => "attach sky",
            Self::MoveSkyUp => "raise sky",
            Self::MoveSkyDown => "lower sky",
            Self::TurnSkyLeft => "turn sky left",
            Self::TurnSkyRight => "turn sky right",
            Self::LockSkyHeight => "lock sky to camera height",
            Self::ReloadTextures => "reload textures",
            Self::Screenshot => "screenshot",
            Self::SaveView => "save view",
            Self::LoadView => "load view",
        }
    }
}

/// Key bindings, in help panel order.
pub const BINDINGS: &[(ViewerAction, KeyCode, &str)] = &[
    (ViewerAction::MoveForward, KeyCode::KeyW, "Z"),
    (ViewerAction::MoveBackward, KeyCode::KeyS, "S"),
    (ViewerAction::MoveLeft, KeyCode::KeyA, "Q"),
    (ViewerAction::MoveRight, KeyCode::KeyD, "D"),
    (ViewerAction::MoveUp, KeyCode::Space, "Space"),
    (ViewerAction::MoveDown, KeyCode::ControlLeft, "Ctrl"),
    (ViewerAction::MoveDown, KeyCode::ControlRight, "Ctrl"),
    (ViewerAction::LookLeft, KeyCode::KeyK, "K"),
    (ViewerAction::LookRight, KeyCode::Semicolon, "M"),
    (ViewerAction::LookUp, KeyCode::KeyO, "O"),
    (ViewerAction::LookDown, KeyCode::KeyL, "L"),
    (ViewerAction::DetachSky, KeyCode::KeyB, "B"),
    (ViewerAction::AttachSky, KeyCode::KeyN, "N"),
    (ViewerAction::MoveSkyUp, KeyCode::KeyT, "T"),
    (ViewerAction::MoveSkyDown, KeyCode::KeyG, "G"),
    (ViewerAction::TurnSkyLeft, KeyCode::KeyF, "F"),
    (ViewerAction::TurnSkyRight, KeyCode::KeyH, "H"),
    (ViewerAction::LockSkyHeight, KeyCode::KeyQ, "A"),
    (ViewerAction::ReloadTextures, KeyCode::KeyZ, "W"),
    (ViewerAction::Screenshot, KeyCode::KeyV, "V"),
    (ViewerAction::SaveView, KeyCode::KeyX, "X"),
    (ViewerAction::LoadView, KeyCode::KeyC, "C"),
];

/// Create the default input map.
#[must_use]
pub fn default_input_map() -> InputMap<ViewerAction> {
    BINDINGS
        .iter()
        .fold(InputMap::default(), |map, &(action, key, _)| map.with(action, key))
}

// ============================================================================
// Plugin
// ============================================================================

/// Registers the action type and mirrors held actions into [`ControlState`].
pub struct InputPlugin;

impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(InputManagerPlugin::<ViewerAction>::default())
            .init_resource::<ControlState>()
            .add_systems(
                PreUpdate,
                update_control_state.after(InputManagerSystem::Update),
            );
    }
}

/// Copy the held actions into the control flags.
fn update_control_state(
    action_query: Query<&ActionState<ViewerAction>>,
    mut controls: ResMut<ControlState>,
) {
    let Ok(action_state) = action_query.single() else {
        return;
    };
    apply_actions(action_state, &mut controls);
}

fn apply_actions(action_state: &ActionState<ViewerAction>, controls: &mut ControlState) {
    let held = |action: ViewerAction| action_state.pressed(&action);

    controls.move_up = held(ViewerAction::MoveUp);
    controls.move_down = held(ViewerAction::MoveDown);
    controls.look_left = held(ViewerAction::LookLeft);
    controls.look_right = held(ViewerAction::LookRight);
    controls.look_up = held(ViewerAction::LookUp);
    controls.look_down = held(ViewerAction::LookDown);
    controls.move_forward = held(ViewerAction::MoveForward);
    controls.move_backward = held(ViewerAction::MoveBackward);
    controls.move_left = held(ViewerAction::MoveLeft);
    controls.move_right = held(ViewerAction::MoveRight);
    controls.move_sky_up = held(ViewerAction::MoveSkyUp);
    controls.move_sky_down = held(ViewerAction::MoveSkyDown);
    controls.turn_sky_left = held(ViewerAction::TurnSkyLeft);
    controls.turn_sky_right = held(ViewerAction::TurnSkyRight);
    controls.lock_sky_height = held(ViewerAction::LockSkyHeight);

    if action_state.just_pressed(&ViewerAction::DetachSky) {
        controls.sky_detached = true;
    }
    if action_state.just_pressed(&ViewerAction::AttachSky) {
        controls.sky_detached = false;
    }
}
