//! Immediate-mode UI overlay.
//!
//! [`UiLayer`] glues egui to the window and the GPU: winit events go in through
//! [`UiLayer::on_window_event`], each frame is bracketed by [`UiLayer::begin_frame`]
//! and [`UiLayer::end_frame`], and [`UiLayer::render`] paints the result over the
//! swapchain. The free functions build the live-editing widgets.

use glam::{Quat, Vec3};
use winit::event::WindowEvent;
use winit::window::Window;

use crate::gpu::GpuContext;
use crate::mesh::{degrees_to_radians, quat_from_euler, quat_to_euler, radians_to_degrees};
use crate::render_target::RenderTarget;
use crate::scene::Scene;
use crate::time::FrameClock;

/// Tessellated UI waiting to be painted.
pub struct PreparedUi {
    jobs: Vec<egui::ClippedPrimitive>,
    textures_delta: egui::TexturesDelta,
    screen: egui_wgpu::ScreenDescriptor,
}

pub struct UiLayer {
    ctx: egui::Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
    viewport_texture: Option<egui::TextureId>,
    viewport_request: [u32; 2],
}

impl UiLayer {
    pub fn new(window: &Window, gpu: &GpuContext) -> Self {
        let ctx = egui::Context::default();
        let state = egui_winit::State::new(
            ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            Some(gpu.device.limits().max_texture_dimension_2d as usize),
        );
        let renderer = egui_wgpu::Renderer::new(
            &gpu.device,
            gpu.config.format,
            egui_wgpu::RendererOptions {
                msaa_samples: 1,
                depth_stencil_format: None,
                ..Default::default()
            },
        );

        Self {
            ctx,
            state,
            renderer,
            viewport_texture: None,
            viewport_request: [gpu.width(), gpu.height()],
        }
    }

    pub fn context(&self) -> &egui::Context {
        &self.ctx
    }

    /// Feeds a window event to egui. Returns `true` if egui consumed it.
    pub fn on_window_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        self.state.on_window_event(window, event).consumed
    }

    pub fn begin_frame(&mut self, window: &Window) {
        let raw_input = self.state.take_egui_input(window);
        self.ctx.begin_pass(raw_input);
    }

    pub fn end_frame(&mut self, window: &Window, gpu: &GpuContext) -> PreparedUi {
        let output = self.ctx.end_pass();
        self.state
            .handle_platform_output(window, output.platform_output);

        let jobs = self.ctx.tessellate(output.shapes, output.pixels_per_point);
        PreparedUi {
            jobs,
            textures_delta: output.textures_delta,
            screen: egui_wgpu::ScreenDescriptor {
                size_in_pixels: [gpu.width(), gpu.height()],
                pixels_per_point: output.pixels_per_point,
            },
        }
    }

    /// Paints the UI onto `output`, clearing it first when `clear` is set.
    ///
    /// Returns the extra command buffers egui recorded; submit them before the
    /// encoder's own buffer.
    pub fn render(
        &mut self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        output: &wgpu::TextureView,
        prepared: PreparedUi,
        clear: Option<wgpu::Color>,
    ) -> Vec<wgpu::CommandBuffer> {
        for (id, delta) in &prepared.textures_delta.set {
            self.renderer
                .update_texture(&gpu.device, &gpu.queue, *id, delta);
        }

        let commands = self.renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            encoder,
            &prepared.jobs,
            &prepared.screen,
        );

        {
            let load = match clear {
                Some(color) => wgpu::LoadOp::Clear(color),
                None => wgpu::LoadOp::Load,
            };
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("UI Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: output,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load,
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                })
                .forget_lifetime();

            self.renderer
                .render(&mut pass, &prepared.jobs, &prepared.screen);
        }

        for id in &prepared.textures_delta.free {
            self.renderer.free_texture(id);
        }

        commands
    }

    /// Points the viewport image at the target's current color texture.
    ///
    /// Call after creating the target and whenever it was recreated.
    pub fn sync_viewport_texture(&mut self, gpu: &GpuContext, target: &RenderTarget) {
        let Some(view) = target.color_view() else {
            return;
        };
        match self.viewport_texture {
            Some(id) => self.renderer.update_egui_texture_from_wgpu_texture(
                &gpu.device,
                view,
                wgpu::FilterMode::Linear,
                id,
            ),
            None => {
                let id =
                    self.renderer
                        .register_native_texture(&gpu.device, view, wgpu::FilterMode::Linear);
                self.viewport_texture = Some(id);
            }
        }
    }

    /// Size in physical pixels the viewport window asked for this frame.
    pub fn viewport_request(&self) -> [u32; 2] {
        self.viewport_request
    }

    /// Shows the offscreen scene in a `Viewport` window and records its size.
    pub fn viewport_window(&mut self) {
        let Some(texture) = self.viewport_texture else {
            return;
        };
        let ppp = self.ctx.pixels_per_point();
        let mut request = self.viewport_request;
        let default_size = egui::vec2(request[0] as f32 / ppp, request[1] as f32 / ppp) * 0.6;

        egui::Window::new("Viewport")
            .default_size(default_size)
            .resizable(true)
            .show(&self.ctx, |ui| {
                let size = ui.available_size().max(egui::vec2(1.0, 1.0));
                request = viewport_pixels(size, ppp);
                ui.image(egui::load::SizedTexture::new(texture, size));
            });

        self.viewport_request = request;
    }
}

/// Converts a UI size in points to whole physical pixels, at least 1x1.
pub(crate) fn viewport_pixels(size: egui::Vec2, pixels_per_point: f32) -> [u32; 2] {
    let px = size * pixels_per_point;
    [
        (px.x.round() as u32).max(1),
        (px.y.round() as u32).max(1),
    ]
}

/// Three drag fields editing `value`, followed by `label`.
pub fn drag_vec3(ui: &mut egui::Ui, label: &str, value: &mut Vec3, speed: f32) -> egui::Response {
    ui.horizontal(|ui| {
        let x = ui.add(egui::DragValue::new(&mut value.x).speed(speed));
        let y = ui.add(egui::DragValue::new(&mut value.y).speed(speed));
        let z = ui.add(egui::DragValue::new(&mut value.z).speed(speed));
        ui.label(label);
        x | y | z
    })
    .inner
}

/// Edits a rotation as XYZ Euler angles in degrees.
///
/// The quaternion is rebuilt only when a field actually changed.
pub fn drag_euler_degrees(ui: &mut egui::Ui, label: &str, rotation: &mut Quat) -> egui::Response {
    let mut degrees = radians_to_degrees(quat_to_euler(*rotation));
    let response = drag_vec3(ui, label, &mut degrees, 1.0);
    if response.changed() {
        *rotation = quat_from_euler(degrees_to_radians(degrees));
    }
    response
}

/// Shows one `Asset: {i}` window per asset with its frame time and transform.
pub fn asset_inspectors(ctx: &egui::Context, scene: &mut Scene, clock: &FrameClock) {
    let frametime_ms = clock.unscaled_delta_time() * 1000.0;
    for (i, asset) in scene.assets_mut().iter_mut().enumerate() {
        egui::Window::new(format!("Asset: {i}"))
            .default_pos([16.0, 16.0 + 140.0 * i as f32])
            .show(ctx, |ui| {
                ui.label(format!("Frametime/Deltatime (ms): {frametime_ms:.3}"));
                drag_vec3(ui, "Translate", &mut asset.transform.position, 0.01);
                drag_euler_degrees(ui, "Rotate", &mut asset.transform.rotation);
                drag_vec3(ui, "Scale", &mut asset.transform.scale, 0.01);
            });
    }
}

/// Drag field for a camera's vertical field of view, in degrees.
pub fn drag_fov_degrees(ui: &mut egui::Ui, label: &str, fov: &mut f32) -> egui::Response {
    let mut degrees = fov.to_degrees();
    let response = ui
        .horizontal(|ui| {
            let r = ui.add(
                egui::DragValue::new(&mut degrees)
                    .speed(1.0)
                    .range(1.0..=179.0),
            );
            ui.label(label);
            r
        })
        .inner;
    if response.changed() {
        *fov = degrees.to_radians();
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_pixels_scale_and_round() {
        assert_eq!(viewport_pixels(egui::vec2(100.0, 50.0), 2.0), [200, 100]);
        assert_eq!(viewport_pixels(egui::vec2(10.4, 10.6), 1.0), [10, 11]);
        assert_eq!(viewport_pixels(egui::vec2(0.0, 0.0), 1.5), [1, 1]);
    }

    #[test]
    fn widgets_leave_values_alone_without_input() {
        let ctx = egui::Context::default();
        let mut position = Vec3::new(1.0, 2.0, 3.0);
        let mut rotation = Quat::from_rotation_x(0.4);
        let mut fov = 1.0f32;

        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                assert!(!drag_vec3(ui, "Translate", &mut position, 0.01).changed());
                assert!(!drag_euler_degrees(ui, "Rotate", &mut rotation).changed());
                assert!(!drag_fov_degrees(ui, "FOV", &mut fov).changed());
            });
        });

        assert_eq!(position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(rotation, Quat::from_rotation_x(0.4));
        assert_eq!(fov, 1.0);
    }

    #[test]
    fn inspectors_run_on_an_empty_scene() {
        let ctx = egui::Context::default();
        let mut scene = Scene::new();
        let clock = FrameClock::new();
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            asset_inspectors(ctx, &mut scene, &clock);
        });
        assert!(scene.assets().is_empty());
    }
}
