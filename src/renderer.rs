use std::cell::Cell;

use crate::gpu::GpuContext;
use crate::render_target::RenderTarget;
use crate::scene::Scene;
use crate::shader::SceneLayout;

/// Records the scene pass: one indexed draw per asset, seen from the active camera.
pub struct SceneRenderer {
    layout: SceneLayout,
    clear_color: wgpu::Color,
    warned_no_camera: Cell<bool>,
}

impl SceneRenderer {
    pub fn new(
        gpu: &GpuContext,
        color_format: wgpu::TextureFormat,
        sample_count: u32,
        clear_color: wgpu::Color,
    ) -> Self {
        Self {
            layout: SceneLayout::new(gpu, color_format, sample_count),
            clear_color,
            warned_no_camera: Cell::new(false),
        }
    }

    /// The layout every shader and asset must be built against.
    pub fn layout(&self) -> &SceneLayout {
        &self.layout
    }

    /// Clears `output` and draws every asset into it.
    ///
    /// The projection aspect follows the target, not the window. A scene without
    /// an active camera is only cleared.
    pub fn render(
        &self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        target: &RenderTarget,
        output: &wgpu::TextureView,
        scene: &Scene,
    ) {
        let mut pass = target.begin_pass(encoder, output, self.clear_color);

        let Some(camera) = scene.active_camera() else {
            if !self.warned_no_camera.replace(true) {
                log::warn!("scene has no active camera, nothing will be drawn");
            }
            return;
        };

        let view = camera.view_matrix();
        let proj = camera.projection_matrix(target.aspect());

        for asset in scene.assets() {
            asset.write_uniforms(&gpu.queue, view, proj, &scene.light);
            asset.draw(&mut pass);
        }
    }
}
