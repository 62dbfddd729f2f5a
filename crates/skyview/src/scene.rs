//! Terrain, sky and light entities, and the per-frame view update.
//!
//! Everything is built once at startup from the generator's output directory.
//! Each frame the held controls are integrated into [`ViewState`] and the
//! resulting placements are written onto the camera, the sky root and the
//! light. One-shot actions (screenshot, save, load, reload) are handled here
//! too; their failures are logged and the viewer keeps running.

use std::fs;
use std::path::{Path, PathBuf};

use bevy::asset::RenderAssetUsages;
use bevy::light::{NotShadowCaster, NotShadowReceiver};
use bevy::pbr::{DistanceFog, FogFalloff};
use bevy::prelude::*;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use bevy::render::view::screenshot::{Screenshot, save_to_disk};
use leafwing_input_manager::prelude::ActionState;
use terragen::image_io::{load_heights, load_rgba8, read_sky_lighting};
use terragen::{GenerationOptions, Grid, OutputPaths, SkyLighting};

use crate::controls::{ControlState, ViewState, hpr_to_quat};
use crate::heightfield::HeightfieldGeometry;
use crate::input::{ViewerAction, default_input_map};
use crate::launch_params::LaunchParams;
use crate::session::Session;
use crate::state_file::SavedView;

/// Vertical scale of the sky demispheres.
pub const SKY_DOME_SCALE: f32 = 64.3;

/// Ambient brightness when lit by the sky colour.
const AMBIENT_BRIGHTNESS: f32 = 400.0;

/// Where assets live and how the scene is dressed.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct SceneConfig {
    pub assets_dir: PathBuf,
    pub state_file: PathBuf,
    pub screenshot_dir: PathBuf,
    /// Vertical scale of the terrain.
    pub max_terrain_height: f32,
    pub fog_start: f32,
    pub fog_end: f32,
}

impl SceneConfig {
    #[must_use]
    pub fn new(params: &LaunchParams, options: &GenerationOptions) -> Self {
        Self {
            assets_dir: params.assets_dir.clone(),
            state_file: params.state_file.clone(),
            screenshot_dir: params.screenshot_dir.clone(),
            max_terrain_height: options.max_terrain_height,
            fog_start: params.fog_start,
            fog_end: params.fog_end,
        }
    }

    /// Generated files on disk.
    fn files(&self) -> OutputPaths {
        OutputPaths::in_dir(&self.assets_dir)
    }

    /// Uniform scale of the sky root.
    ///
    /// The domes are drawn behind the terrain by enclosing everything the
    /// fog has not yet hidden.
    #[must_use]
    pub fn sky_scale(&self) -> f32 {
        (self.fog_end / SKY_DOME_SCALE).max(1.0)
    }
}

/// Colormap textures, kept so they can be replaced on reload.
#[derive(Resource, Debug, Default)]
pub struct SceneTextures {
    terrain: Option<Handle<Image>>,
    sky: Option<Handle<Image>>,
}

/// Decode a colormap into an sRGB texture.
///
/// The generator writes 16-bit PNGs, which would otherwise be uploaded as
/// linear `Rgba16Unorm` and render washed out.
fn load_srgb_texture(path: &Path) -> Option<Image> {
    let rgba = match load_rgba8(path) {
        Ok(rgba) => rgba,
        Err(e) => {
            tracing::warn!("No texture: {e}");
            return None;
        }
    };
    let (width, height) = rgba.dimensions();
    Some(Image::new(
        Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        rgba.into_raw(),
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::default(),
    ))
}

// ============================================================================
// Components
// ============================================================================

#[derive(Component)]
pub struct ViewerCamera;

#[derive(Component)]
pub struct TerrainMesh;

/// Parent of both sky demispheres.
#[derive(Component)]
pub struct SkyRoot;

#[derive(Component)]
pub struct SkyDome;

#[derive(Component)]
pub struct SunLight;

// ============================================================================
// Plugin
// ============================================================================

/// Builds the scene and keeps it in sync with [`ViewState`].
pub struct ScenePlugin {
    pub config: SceneConfig,
    pub view: ViewState,
    pub session: Session,
}

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.config.clone())
            .insert_resource(self.view)
            .insert_resource(self.session.clone())
            .insert_resource(ClearColor(Color::WHITE))
            .init_resource::<SceneTextures>()
            .add_systems(Startup, (setup_camera, setup_terrain, setup_sky, setup_light))
            .add_systems(
                Update,
                (handle_commands, advance_view, apply_view_transforms).chain(),
            );
    }
}

// ============================================================================
// Startup
// ============================================================================

fn setup_camera(mut commands: Commands, config: Res<SceneConfig>, view: Res<ViewState>) {
    let lighting = read_lighting(&config);
    let (_, ambient) = light_colors(lighting.as_ref());
    let transforms = view.transforms(&ControlState::default());

    commands.spawn((
        ViewerCamera,
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            near: 0.1,
            far: config.fog_end * 4.0,
            ..Default::default()
        }),
        transforms.camera.to_transform(),
        DistanceFog {
            color: Color::WHITE,
            falloff: FogFalloff::Linear {
                start: config.fog_start,
                end: config.fog_end,
            },
            ..Default::default()
        },
        AmbientLight {
            color: ambient,
            brightness: AMBIENT_BRIGHTNESS,
            ..Default::default()
        },
        default_input_map(),
    ));
}

fn setup_terrain(
    mut commands: Commands,
    config: Res<SceneConfig>,
    mut textures: ResMut<SceneTextures>,
    mut images: ResMut<Assets<Image>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let files = config.files();
    let path = files.heightmap;
    let heights = match load_heights(&path) {
        Ok(heights) => heights,
        Err(e) => {
            tracing::warn!("No terrain: {e}");
            return;
        }
    };

    let mesh = HeightfieldGeometry::from_heights(&heights, config.max_terrain_height).into_mesh();
    textures.terrain = load_srgb_texture(&files.colormap).map(|image| images.add(image));
    let material = StandardMaterial {
        base_color_texture: textures.terrain.clone(),
        perceptual_roughness: 1.0,
        ..Default::default()
    };

    commands.spawn((
        TerrainMesh,
        Mesh3d(meshes.add(mesh)),
        MeshMaterial3d(materials.add(material)),
        Transform::default(),
    ));
    tracing::info!(
        width = heights.width(),
        height = heights.height(),
        "Terrain ready"
    );
}

fn setup_sky(
    mut commands: Commands,
    config: Res<SceneConfig>,
    view: Res<ViewState>,
    mut textures: ResMut<SceneTextures>,
    mut images: ResMut<Assets<Image>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let files = config.files();
    let path = files.demisphere_heightmap;
    let heights = match load_heights(&path) {
        Ok(heights) => heights,
        Err(e) => {
            tracing::warn!("No sky: {e}");
            return;
        }
    };

    textures.sky = load_srgb_texture(&files.demisphere_colormap).map(|image| images.add(image));
    let material = materials.add(StandardMaterial {
        base_color_texture: textures.sky.clone(),
        unlit: true,
        fog_enabled: false,
        double_sided: true,
        cull_mode: None,
        ..Default::default()
    });

    let placement = view
        .transforms(&ControlState::default())
        .sky
        .map_or_else(Transform::default, |sky| sky.to_transform());

    commands
        .spawn((
            SkyRoot,
            placement.with_scale(Vec3::splat(config.sky_scale())),
            Visibility::default(),
        ))
        .with_children(|parent| {
            for geometry in dome_geometries(&heights) {
                parent.spawn((
                    SkyDome,
                    Mesh3d(meshes.add(geometry.into_mesh())),
                    MeshMaterial3d(material.clone()),
                    Transform::default(),
                    NotShadowCaster,
                    NotShadowReceiver,
                ));
            }
        });
    tracing::info!(side = heights.width(), "Sky ready");
}

fn setup_light(mut commands: Commands, config: Res<SceneConfig>, view: Res<ViewState>) {
    let lighting = read_lighting(&config);
    let (sun, _) = light_colors(lighting.as_ref());
    let light_hpr = view.transforms(&ControlState::default()).light_hpr;

    commands.spawn((
        SunLight,
        DirectionalLight {
            color: sun,
            shadows_enabled: true,
            ..Default::default()
        },
        Transform::from_rotation(light_rotation(light_hpr)),
    ));
}

fn read_lighting(config: &SceneConfig) -> Option<SkyLighting> {
    let path = config.files().sky_lighting;
    match read_sky_lighting(&path) {
        Ok(lighting) => Some(lighting),
        Err(e) => {
            tracing::debug!("Using white light: {e}");
            None
        }
    }
}

/// Sun and ambient colours, white and grey without a lighting file.
fn light_colors(lighting: Option<&SkyLighting>) -> (Color, Color) {
    lighting.map_or((Color::WHITE, Color::srgb(0.8, 0.8, 0.8)), |lighting| {
        let [r, g, b] = lighting.sun;
        let [ar, ag, ab] = lighting.ambient;
        (Color::srgb(r, g, b), Color::srgb(ar, ag, ab))
    })
}

/// The upper demisphere centred on the origin, and its mirror image below.
fn dome_geometries(heights: &Grid<f32>) -> [HeightfieldGeometry; 2] {
    let half_width = heights.width().saturating_sub(1) as f32 / 2.0;
    let half_height = heights.height().saturating_sub(1) as f32 / 2.0;
    let upper = HeightfieldGeometry::from_heights(heights, SKY_DOME_SCALE)
        .offset(Vec3::new(-half_width, -half_height, 0.0));
    let lower = upper.mirrored();
    [upper, lower]
}

/// Light orientation for a heading/pitch/roll that points at the light.
///
/// A directional light shines along its forward axis, so it is turned around.
fn light_rotation(hpr: [f32; 3]) -> Quat {
    hpr_to_quat(hpr) * Quat::from_rotation_y(std::f32::consts::PI)
}

// ============================================================================
// Per-frame systems
// ============================================================================

fn advance_view(time: Res<Time>, controls: Res<ControlState>, mut view: ResMut<ViewState>) {
    view.advance(&controls, time.delta_secs());
}

fn apply_view_transforms(
    view: Res<ViewState>,
    controls: Res<ControlState>,
    config: Res<SceneConfig>,
    mut camera_query: Query<&mut Transform, (With<ViewerCamera>, Without<SkyRoot>, Without<SunLight>)>,
    mut sky_query: Query<&mut Transform, (With<SkyRoot>, Without<ViewerCamera>, Without<SunLight>)>,
    mut light_query: Query<&mut Transform, (With<SunLight>, Without<ViewerCamera>, Without<SkyRoot>)>,
) {
    let transforms = view.transforms(&controls);

    if let Ok(mut camera) = camera_query.single_mut() {
        *camera = transforms.camera.to_transform();
    }
    if let (Some(sky), Ok(mut root)) = (transforms.sky, sky_query.single_mut()) {
        *root = sky.to_transform().with_scale(Vec3::splat(config.sky_scale()));
    }
    if let Ok(mut light) = light_query.single_mut() {
        light.rotation = light_rotation(transforms.light_hpr);
    }
}

fn handle_commands(
    mut commands: Commands,
    action_query: Query<&ActionState<ViewerAction>>,
    config: Res<SceneConfig>,
    textures: Res<SceneTextures>,
    mut images: ResMut<Assets<Image>>,
    mut session: ResMut<Session>,
    mut view: ResMut<ViewState>,
) {
    let Ok(action_state) = action_query.single() else {
        return;
    };

    if action_state.just_pressed(&ViewerAction::Screenshot) {
        take_screenshot(&mut commands, &config, &mut session);
    }

    if action_state.just_pressed(&ViewerAction::SaveView) {
        match SavedView::from(&*view).save(&config.state_file) {
            Ok(()) => tracing::info!(path = %config.state_file.display(), "View saved"),
            Err(e) => tracing::warn!("Failed to save view: {e}"),
        }
    }

    if action_state.just_pressed(&ViewerAction::LoadView) {
        match SavedView::load(&config.state_file) {
            Ok(saved) => {
                saved.apply_to(&mut view);
                tracing::info!(path = %config.state_file.display(), "View loaded");
            }
            Err(e) => tracing::warn!("Failed to load view: {e}"),
        }
    }

    if action_state.just_pressed(&ViewerAction::ReloadTextures) {
        let files = config.files();
        for (handle, path) in [
            (&textures.terrain, &files.colormap),
            (&textures.sky, &files.demisphere_colormap),
        ] {
            if let (Some(handle), Some(image)) = (handle, load_srgb_texture(path)) {
                if let Some(texture) = images.get_mut(handle).as_deref_mut() {
                    *texture = image;
                }
            }
        }
        tracing::info!("Textures reloaded");
    }
}

fn take_screenshot(commands: &mut Commands, config: &SceneConfig, session: &mut Session) {
    if let Err(e) = fs::create_dir_all(&config.screenshot_dir) {
        tracing::warn!(
            "Cannot create screenshot directory {}: {e}",
            config.screenshot_dir.display()
        );
        return;
    }
    let path = session.next_screenshot_path(&config.screenshot_dir);
    tracing::info!(path = %path.display(), "Saving screenshot");
    commands
        .spawn(Screenshot::primary_window())
        .observe(save_to_disk(path));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SceneConfig {
        SceneConfig {
            assets_dir: PathBuf::from("out"),
            state_file: PathBuf::from("viewer_state.json"),
            screenshot_dir: PathBuf::from("screenshots"),
            max_terrain_height: 120.0,
            fog_start: 100.0,
            fog_end: 643.0,
        }
    }

    #[test]
    fn test_files_live_in_assets_dir() {
        let files = config().files();
        assert_eq!(files.heightmap, PathBuf::from("out").join("heightmap.png"));
    }

    #[test]
    fn test_colormap_texture_is_srgb() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("colormap.png");
        let mut colormap = terragen::ColorMap::new(4, 2);
        colormap.set_pixel(3, 1, [1.0, 1.0, 1.0]);
        let encoded = terragen::image_io::encode_colormap(&colormap);
        terragen::image_io::save_png(&encoded.into(), &path).unwrap();

        let image = load_srgb_texture(&path).unwrap();
        assert_eq!(image.texture_descriptor.format, TextureFormat::Rgba8UnormSrgb);
        assert_eq!((image.width(), image.height()), (4, 2));

        assert!(load_srgb_texture(&dir.path().join("missing.png")).is_none());
    }

    #[test]
    fn test_sky_scale() {
        assert!((config().sky_scale() - 10.0).abs() < 1e-4);
        let near = SceneConfig {
            fog_end: 10.0,
            ..config()
        };
        assert!((near.sky_scale() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_domes_are_centred_and_mirrored() {
        let heights = Grid::new(5, 5, 1.0_f32);
        let [upper, lower] = dome_geometries(&heights);
        assert_eq!(upper.positions[0], Vec3::new(-2.0, 2.0, SKY_DOME_SCALE));
        assert_eq!(lower.positions[0], Vec3::new(2.0, 2.0, -SKY_DOME_SCALE));
    }

    #[test]
    fn test_light_colors() {
        let (sun, _) = light_colors(None);
        assert_eq!(sun, Color::WHITE);

        let lighting = SkyLighting {
            sun: [1.0, 0.5, 0.25],
            ambient: [0.1, 0.2, 0.3],
        };
        let (sun, ambient) = light_colors(Some(&lighting));
        assert_eq!(sun, Color::srgb(1.0, 0.5, 0.25));
        assert_eq!(ambient, Color::srgb(0.1, 0.2, 0.3));
    }

    #[test]
    fn test_light_shines_away_from_its_direction() {
        let hpr = [30.0, 45.0, 0.0];
        let towards_light = hpr_to_quat(hpr) * Vec3::NEG_Z;
        let shining = light_rotation(hpr) * Vec3::NEG_Z;
        assert!((shining + towards_light).length() < 1e-4);
    }
}
