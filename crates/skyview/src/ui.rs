//! Debug overlay with the view state and the key bindings.

use bevy::diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;
use bevy_egui::{EguiContexts, EguiPlugin, EguiPrimaryContextPass, egui};

use crate::controls::{ControlState, ViewState};
use crate::input::BINDINGS;
use crate::session::Session;

/// Plugin for the debug overlay.
pub struct DebugUiPlugin;

impl Plugin for DebugUiPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(EguiPlugin::default())
            .add_plugins(FrameTimeDiagnosticsPlugin::default())
            .add_systems(EguiPrimaryContextPass, debug_ui_system);
    }
}

fn format_triple(values: [f32; 3]) -> String {
    format!("{:.1}, {:.1}, {:.1}", values[0], values[1], values[2])
}

fn debug_ui_system(
    mut contexts: EguiContexts,
    diagnostics: Res<DiagnosticsStore>,
    view: Res<ViewState>,
    controls: Res<ControlState>,
    session: Res<Session>,
) -> Result {
    let ctx = contexts.ctx_mut()?;

    let fps = diagnostics
        .get(&FrameTimeDiagnosticsPlugin::FPS)
        .and_then(bevy::diagnostic::Diagnostic::smoothed)
        .unwrap_or(0.0);

    egui::Window::new("skyview")
        .default_pos([10.0, 10.0])
        .show(ctx, |ui| {
            ui.label(format!("FPS: {fps:.0}"));
            ui.label(format!("Session: {}", session.label()));
            ui.label(format!("Screenshots: {}", session.screenshots_taken()));
            ui.separator();

            ui.label(format!("Camera position: {}", format_triple(view.camera_xyz)));
            ui.label(format!("Camera hpr: {}", format_triple(view.camera_hpr)));
            ui.label(format!("Sky height: {:.1}", view.sky_height));
            ui.label(format!("Sky rotation: {:.1}", view.sky_hpr[0]));
            if controls.sky_detached {
                ui.colored_label(egui::Color32::YELLOW, "Sky detached");
            }

            ui.collapsing("Controls", |ui| {
                egui::Grid::new("bindings").striped(true).show(ui, |ui| {
                    for (action, _, label) in BINDINGS {
                        ui.label(*label);
                        ui.label(action.description());
                        ui.end_row();
                    }
                });
            });
        });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_triple() {
        assert_eq!(format_triple([1.0, -2.26, 300.04]), "1.0, -2.3, 300.0");
    }
}
