//! Per-frame integration of held keys into camera and sky state.
//!
//! State is kept in the generator's Z-up frame with heading/pitch/roll angles
//! in degrees. [`hpr_to_quat`] and [`z_up_to_y_up`] convert to Bevy's Y-up
//! frame when writing transforms.

use bevy::prelude::*;

/// Camera translation speed, world units per second.
pub const MOVE_SPEED: f32 = 100.0;
/// Camera heading speed, degrees per second.
pub const HEADING_SPEED: f32 = 60.0;
/// Camera pitch speed, degrees per second.
pub const PITCH_SPEED: f32 = 40.0;
/// Sky height speed, world units per second.
pub const SKY_HEIGHT_SPEED: f32 = 40.0;
/// Sky heading speed, degrees per second.
pub const SKY_TURN_SPEED: f32 = 60.0;

/// Which controls are currently held.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlState {
    pub move_left: bool,
    pub move_right: bool,
    pub move_forward: bool,
    pub move_backward: bool,
    pub move_up: bool,
    pub move_down: bool,
    pub look_left: bool,
    pub look_right: bool,
    pub look_up: bool,
    pub look_down: bool,
    pub move_sky_up: bool,
    pub move_sky_down: bool,
    pub turn_sky_left: bool,
    pub turn_sky_right: bool,
    pub lock_sky_height: bool,
    /// Latched: set by "detach sky", cleared by "attach sky".
    pub sky_detached: bool,
}

/// Camera and sky placement, in degrees and world units.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    pub camera_hpr: [f32; 3],
    pub camera_xyz: [f32; 3],
    pub sky_height: f32,
    pub sky_hpr: [f32; 3],
}

impl ViewState {
    /// Initial state for a sun `sun_angle` degrees above the horizon.
    #[must_use]
    pub fn new(sun_angle: f32) -> Self {
        Self {
            camera_hpr: [0.0; 3],
            camera_xyz: [0.0; 3],
            sky_height: 0.0,
            sky_hpr: [0.0, sun_angle, 0.0],
        }
    }

    /// Integrate the held controls over `dt` seconds.
    ///
    /// Within each group only the first held control applies.
    pub fn advance(&mut self, controls: &ControlState, dt: f32) {
        let [x, y, z] = &mut self.camera_xyz;
        let [heading, pitch, _] = &mut self.camera_hpr;

        if controls.move_up {
            *z += MOVE_SPEED * dt;
        } else if controls.move_down {
            *z -= MOVE_SPEED * dt;
        }

        if controls.look_left {
            *heading += HEADING_SPEED * dt;
        } else if controls.look_right {
            *heading -= HEADING_SPEED * dt;
        } else if controls.look_down {
            *pitch -= PITCH_SPEED * dt;
        } else if controls.look_up {
            *pitch += PITCH_SPEED * dt;
        }

        let (side_sin, side_cos) = heading.to_radians().sin_cos();
        let (front_sin, front_cos) = (*heading + 90.0).to_radians().sin_cos();
        let step = MOVE_SPEED * dt;
        if controls.move_forward {
            *x += front_cos * step;
            *y += front_sin * step;
        } else if controls.move_backward {
            *x -= front_cos * step;
            *y -= front_sin * step;
        } else if controls.move_right {
            *x += side_cos * step;
            *y += side_sin * step;
        } else if controls.move_left {
            *x -= side_cos * step;
            *y -= side_sin * step;
        }

        if controls.move_sky_up {
            self.sky_height += SKY_HEIGHT_SPEED * dt;
        } else if controls.move_sky_down {
            self.sky_height -= SKY_HEIGHT_SPEED * dt;
        }

        if controls.turn_sky_left {
            self.sky_hpr[0] += SKY_TURN_SPEED * dt;
        } else if controls.turn_sky_right {
            self.sky_hpr[0] -= SKY_TURN_SPEED * dt;
        }

        if controls.lock_sky_height {
            self.sky_height = self.camera_xyz[2];
        }
    }

    /// Transforms to write back onto the scene this frame.
    #[must_use]
    pub fn transforms(&self, controls: &ControlState) -> SceneTransforms {
        let [sky_h, sky_p, sky_r] = self.sky_hpr;
        let sky = (!controls.sky_detached).then(|| Placement {
            xyz: [self.camera_xyz[0], self.camera_xyz[1], self.sky_height],
            hpr: [180.0 + sky_h, sky_p + 90.0, sky_r],
        });
        SceneTransforms {
            camera: Placement {
                xyz: self.camera_xyz,
                hpr: self.camera_hpr,
            },
            light_hpr: [sky_h, 90.0 - sky_p, sky_r],
            sky,
        }
    }
}

/// Position and orientation in the Z-up frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub xyz: [f32; 3],
    pub hpr: [f32; 3],
}

impl Placement {
    /// Equivalent Bevy transform.
    #[must_use]
    pub fn to_transform(&self) -> Transform {
        Transform::from_translation(z_up_to_y_up(Vec3::from_array(self.xyz)))
            .with_rotation(hpr_to_quat(self.hpr))
    }
}

/// Output of [`ViewState::transforms`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneTransforms {
    pub camera: Placement,
    pub light_hpr: [f32; 3],
    /// `None` while the sky is detached: it stays where it was.
    pub sky: Option<Placement>,
}

/// Map a Z-up position onto Bevy's Y-up frame.
#[must_use]
pub fn z_up_to_y_up(v: Vec3) -> Vec3 {
    Vec3::new(v.x, v.z, -v.y)
}

/// Rotation for heading/pitch/roll degrees, expressed in Bevy's frame.
///
/// Heading turns about the Z-up vertical, pitch about the right axis and roll
/// about the forward axis, applied roll first. The unrotated forward (+Y in
/// the Z-up frame) is Bevy's -Z, so cameras and lights keep their usual
/// orientation.
#[must_use]
pub fn hpr_to_quat(hpr: [f32; 3]) -> Quat {
    let [h, p, r] = hpr.map(f32::to_radians);
    Quat::from_axis_angle(Vec3::Y, h)
        * Quat::from_axis_angle(Vec3::X, p)
        * Quat::from_axis_angle(Vec3::NEG_Z, r)
}
