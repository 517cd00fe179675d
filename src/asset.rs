use std::rc::Rc;

use glam::{Mat4, Vec3};

use crate::gpu::GpuContext;
use crate::mesh::{Model, Transform};
use crate::scene::Light;
use crate::shader::{SceneLayout, Shader};
use crate::texture::Texture;

/// Uniform block bound at group 0 for every asset draw.
///
/// Mirrors the WGSL `AssetUniforms` struct: three matrices, then the light with
/// each `vec3` padded to 16 bytes by the scalar that follows it.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct AssetUniforms {
    pub mvp: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub light_position_worldspace: [f32; 3],
    pub light_power: f32,
    pub light_color: [f32; 3],
    pub _padding: f32,
}

impl AssetUniforms {
    pub fn new(model: Mat4, view: Mat4, proj: Mat4, light: &Light) -> Self {
        Self {
            mvp: (proj * view * model).to_cols_array_2d(),
            view: view.to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            light_position_worldspace: light.position.to_array(),
            light_power: light.power,
            light_color: light.color.to_array(),
            _padding: 0.0,
        }
    }
}

/// A drawable scene object: a model, its albedo and specular maps, and the shader
/// that draws it, placed by a [`Transform`].
///
/// Models, textures and shaders are shared through `Rc`, so one texture can back
/// several assets. Each asset owns its uniform buffer and bind groups.
pub struct Asset {
    pub model: Rc<Model>,
    pub albedo: Rc<Texture>,
    pub specular: Rc<Texture>,
    pub shader: Rc<Shader>,
    pub transform: Transform,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    texture_bind_group: wgpu::BindGroup,
}

impl Asset {
    pub fn new(
        gpu: &GpuContext,
        layout: &SceneLayout,
        model: Rc<Model>,
        albedo: Rc<Texture>,
        specular: Rc<Texture>,
        shader: Rc<Shader>,
    ) -> Self {
        let label = model.label().to_string();

        let uniform_buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{label} Uniforms")),
            size: std::mem::size_of::<AssetUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{label} Uniform Bind Group")),
            layout: &layout.uniforms,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let texture_bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{label} Texture Bind Group")),
            layout: &layout.textures,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&albedo.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&albedo.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&specular.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&specular.sampler),
                },
            ],
        });

        Self {
            model,
            albedo,
            specular,
            shader,
            transform: Transform::default(),
            uniform_buffer,
            uniform_bind_group,
            texture_bind_group,
        }
    }

    /// Places the asset, builder style.
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn model_matrix(&self) -> Mat4 {
        self.transform.matrix()
    }

    /// Rotation as XYZ Euler angles in degrees.
    pub fn euler_degrees(&self) -> Vec3 {
        self.transform.euler_degrees()
    }

    pub fn set_euler_degrees(&mut self, degrees: Vec3) {
        self.transform.set_euler_degrees(degrees);
    }

    /// Uploads this frame's matrices and light.
    pub(crate) fn write_uniforms(&self, queue: &wgpu::Queue, view: Mat4, proj: Mat4, light: &Light) {
        let uniforms = AssetUniforms::new(self.model_matrix(), view, proj, light);
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));
    }

    /// Records the draw into `pass`. Uniforms must already be written.
    pub(crate) fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.shader.pipeline);
        pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        pass.set_bind_group(1, &self.texture_bind_group, &[]);
        pass.set_vertex_buffer(0, self.model.vertex_buffer.slice(..));
        pass.set_index_buffer(self.model.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.model.index_count, 0, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use glam::{Quat, Vec4};

    #[test]
    fn uniforms_are_224_bytes() {
        assert_eq!(std::mem::size_of::<AssetUniforms>(), 224);
    }

    #[test]
    fn mvp_is_projection_view_model() {
        let mut camera = Camera::new(Vec3::new(4.0, 3.0, 3.0));
        camera.look_at(Vec3::ZERO);
        let view = camera.view_matrix();
        let proj = camera.projection_matrix(1366.0 / 768.0);
        let model = Transform::new()
            .position(Vec3::new(1.0, 0.0, 0.0))
            .rotation(Quat::from_rotation_y(0.7))
            .uniform_scale(2.0)
            .matrix();

        let uniforms = AssetUniforms::new(model, view, proj, &Light::default());

        let mvp = Mat4::from_cols_array_2d(&uniforms.mvp);
        let p = Vec4::new(0.25, -0.5, 1.0, 1.0);
        let expected = proj * (view * (model * p));
        assert!((mvp * p - expected).length() < 1e-4);
        assert_eq!(Mat4::from_cols_array_2d(&uniforms.view), view);
        assert_eq!(Mat4::from_cols_array_2d(&uniforms.model), model);
    }

    #[test]
    fn uniforms_carry_the_light() {
        let light = Light::default();
        let uniforms = AssetUniforms::new(Mat4::IDENTITY, Mat4::IDENTITY, Mat4::IDENTITY, &light);
        assert_eq!(uniforms.light_position_worldspace, [4.0, 4.0, 4.0]);
        assert_eq!(uniforms.light_color, [1.0, 1.0, 1.0]);
        assert_eq!(uniforms.light_power, 50.0);
    }

    #[test]
    fn euler_accessors_forward_to_the_transform() {
        let Some(gpu) = crate::gpu::tests::headless_gpu(8, 8) else {
            return;
        };
        let layout = SceneLayout::new(&gpu, wgpu::TextureFormat::Rgba8Unorm, 1);
        let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("assets/shaders");
        let shader = Shader::from_files(
            &gpu,
            &layout,
            dir.join("basic.vert.wgsl"),
            dir.join("basic.frag.wgsl"),
        )
        .unwrap();
        let white = Rc::new(Texture::white(&gpu));
        let model = Rc::new(crate::geometry::RawGeometry::cube().upload(&gpu, "cube"));
        let mut asset = Asset::new(&gpu, &layout, model, white.clone(), white, Rc::new(shader));

        asset.set_euler_degrees(Vec3::new(30.0, 0.0, 0.0));
        assert!((asset.euler_degrees() - Vec3::new(30.0, 0.0, 0.0)).length() < 1e-3);
        assert!(
            asset
                .transform
                .rotation
                .abs_diff_eq(Quat::from_rotation_x(30f32.to_radians()), 1e-5)
        );
    }
}
