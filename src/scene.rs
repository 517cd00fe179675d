//! Flat scene: a list of assets, a list of cameras and one point light.

use glam::Vec3;

use crate::asset::Asset;
use crate::camera::Camera;
use crate::time::FrameClock;

/// Handle returned by [`Scene::add_asset`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AssetId(pub usize);

/// Handle returned by [`Scene::add_camera`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CameraId(pub usize);

/// Point light shared by every lit shader.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Light {
    pub position: Vec3,
    pub color: Vec3,
    pub power: f32,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            position: Vec3::new(4.0, 4.0, 4.0),
            color: Vec3::ONE,
            power: 50.0,
        }
    }
}

/// Called once per frame after the asset inspectors, before the UI is drawn.
pub type RenderCallback = Box<dyn FnMut(&egui::Context, &mut Scene, &FrameClock)>;

/// Everything drawn in a frame.
///
/// Assets draw in insertion order. The view comes from the active camera, which
/// is the first camera added unless [`Scene::set_active_camera`] picks another.
#[derive(Default)]
pub struct Scene {
    assets: Vec<Asset>,
    cameras: Vec<Camera>,
    active_camera: usize,
    pub light: Light,
    render_callback: Option<RenderCallback>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_asset(&mut self, asset: Asset) -> AssetId {
        self.assets.push(asset);
        AssetId(self.assets.len() - 1)
    }

    pub fn asset(&self, id: AssetId) -> Option<&Asset> {
        self.assets.get(id.0)
    }

    pub fn asset_mut(&mut self, id: AssetId) -> Option<&mut Asset> {
        self.assets.get_mut(id.0)
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn assets_mut(&mut self) -> &mut [Asset] {
        &mut self.assets
    }

    pub fn add_camera(&mut self, camera: Camera) -> CameraId {
        self.cameras.push(camera);
        CameraId(self.cameras.len() - 1)
    }

    pub fn camera(&self, id: CameraId) -> Option<&Camera> {
        self.cameras.get(id.0)
    }

    pub fn camera_mut(&mut self, id: CameraId) -> Option<&mut Camera> {
        self.cameras.get_mut(id.0)
    }

    pub fn cameras(&self) -> &[Camera] {
        &self.cameras
    }

    pub fn active_camera_id(&self) -> CameraId {
        CameraId(self.active_camera)
    }

    /// `None` until a camera has been added.
    pub fn active_camera(&self) -> Option<&Camera> {
        self.cameras.get(self.active_camera)
    }

    pub fn active_camera_mut(&mut self) -> Option<&mut Camera> {
        self.cameras.get_mut(self.active_camera)
    }

    /// Switches the view to `id`. Unknown ids are logged and ignored.
    pub fn set_active_camera(&mut self, id: CameraId) -> bool {
        if id.0 < self.cameras.len() {
            self.active_camera = id.0;
            true
        } else {
            log::warn!(
                "camera {} does not exist ({} cameras)",
                id.0,
                self.cameras.len()
            );
            false
        }
    }

    pub fn set_render_callback<F>(&mut self, callback: F)
    where
        F: FnMut(&egui::Context, &mut Scene, &FrameClock) + 'static,
    {
        self.render_callback = Some(Box::new(callback));
    }

    pub fn clear_render_callback(&mut self) {
        self.render_callback = None;
    }

    pub fn has_render_callback(&self) -> bool {
        self.render_callback.is_some()
    }

    /// Runs the callback with full access to the scene.
    ///
    /// The callback is taken out while it runs. If it installs a replacement,
    /// the replacement wins.
    pub(crate) fn run_render_callback(&mut self, ctx: &egui::Context, clock: &FrameClock) {
        if let Some(mut callback) = self.render_callback.take() {
            callback(ctx, self, clock);
            if self.render_callback.is_none() {
                self.render_callback = Some(callback);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn run_one_pass(scene: &mut Scene) {
        let ctx = egui::Context::default();
        let clock = FrameClock::new();
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            scene.run_render_callback(ctx, &clock);
        });
    }

    #[test]
    fn first_camera_is_active() {
        let mut scene = Scene::new();
        assert!(scene.active_camera().is_none());

        let a = scene.add_camera(Camera::new(Vec3::X));
        let b = scene.add_camera(Camera::new(Vec3::Y));
        assert_eq!(a, CameraId(0));
        assert_eq!(b, CameraId(1));
        assert_eq!(scene.active_camera().map(|c| c.position), Some(Vec3::X));
    }

    #[test]
    fn switching_cameras() {
        let mut scene = Scene::new();
        scene.add_camera(Camera::new(Vec3::X));
        let b = scene.add_camera(Camera::new(Vec3::Y));

        assert!(scene.set_active_camera(b));
        assert_eq!(scene.active_camera_id(), b);
        assert_eq!(scene.active_camera().map(|c| c.position), Some(Vec3::Y));

        assert!(!scene.set_active_camera(CameraId(7)));
        assert_eq!(scene.active_camera_id(), b);
    }

    #[test]
    fn default_light() {
        let light = Scene::new().light;
        assert_eq!(light.position, Vec3::splat(4.0));
        assert_eq!(light.color, Vec3::ONE);
        assert_eq!(light.power, 50.0);
    }

    #[test]
    fn callback_can_edit_the_scene_and_persists() {
        let mut scene = Scene::new();
        scene.add_camera(Camera::default());
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        scene.set_render_callback(move |_, scene, _| {
            counter.set(counter.get() + 1);
            if let Some(camera) = scene.active_camera_mut() {
                camera.position.x += 1.0;
            }
        });

        run_one_pass(&mut scene);
        run_one_pass(&mut scene);

        assert_eq!(calls.get(), 2);
        assert!(scene.has_render_callback());
        assert_eq!(scene.active_camera().map(|c| c.position.x), Some(2.0));
    }

    #[test]
    fn callback_may_replace_itself() {
        let mut scene = Scene::new();
        let replaced = Rc::new(Cell::new(false));
        let flag = Rc::clone(&replaced);
        scene.set_render_callback(move |_, scene, _| {
            let flag = Rc::clone(&flag);
            scene.set_render_callback(move |_, _, _| flag.set(true));
        });

        run_one_pass(&mut scene);
        assert!(!replaced.get());
        run_one_pass(&mut scene);
        assert!(replaced.get());
    }
}
