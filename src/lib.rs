//! # Fred
//!
//! **A small real-time 3D renderer with a live-editing overlay.**
//!
//! Load OBJ/STL meshes, textures and WGSL shaders, place them in a scene, and
//! tweak every transform from an egui overlay while it runs. The scene renders
//! into an offscreen target shown in a resizable `Viewport` window, or straight
//! onto the window.
//!
//! ## Quick Start
//!
//! ```no_run
//! use fred::*;
//!
//! fn main() -> fred::Result<()> {
//!     run(|ctx| {
//!         let model = ctx.mesh_from_geometry(&RawGeometry::cube(), "cube");
//!         let texture = ctx.texture_or_default("textures/crate.png");
//!         let shader = ctx.load_shader("shaders/basic.vert.wgsl", "shaders/basic.frag.wgsl")?;
//!         let asset = ctx.create_asset(model, texture.clone(), texture, shader);
//!         let cube = ctx.scene_mut().add_asset(asset);
//!
//!         let mut camera = Camera::new(Vec3::new(3.0, 2.0, 3.0));
//!         camera.look_at(Vec3::ZERO);
//!         ctx.scene_mut().add_camera(camera);
//!
//!         Ok(move |frame: &mut Frame| {
//!             let dt = frame.delta_time();
//!             if let Some(asset) = frame.scene.asset_mut(cube) {
//!                 asset.transform.rotation *= Quat::from_rotation_y(dt);
//!             }
//!         })
//!     })
//! }
//! ```

mod app;
mod asset;
mod camera;
mod error;
mod geometry;
mod gpu;
mod input;
mod logging;
mod mesh;
mod obj;
mod render_target;
mod renderer;
mod scene;
mod shader;
mod texture;
mod time;
pub mod ui;

pub use app::{AppConfig, Frame, SetupContext, run, run_with_config};
pub use asset::{Asset, AssetUniforms};
pub use camera::Camera;
pub use error::{FredError, Result};
pub use geometry::{RawGeometry, load_model, parse_stl};
pub use gpu::GpuContext;
pub use input::Input;
pub use logging::{LoggingConfig, init_logging};
pub use mesh::{Model, Transform, Vertex3d, quat_from_euler, quat_to_euler};
pub use obj::parse_obj;
pub use render_target::{RenderTarget, ViewportMode};
pub use renderer::SceneRenderer;
pub use scene::{AssetId, CameraId, Light, RenderCallback, Scene};
pub use shader::{DEPTH_FORMAT, FRAGMENT_ENTRY, SceneLayout, Shader, VERTEX_ENTRY};
pub use texture::Texture;
pub use time::FrameClock;

// Re-export glam math types for convenience
pub use glam::{EulerRot, Mat4, Quat, Vec2, Vec3, Vec4};

// Re-export commonly used winit types for convenience
pub use winit::event::MouseButton;
pub use winit::keyboard::KeyCode;

pub use egui;
